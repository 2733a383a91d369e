use crate::event::EventSender;
use crate::stage::Sink;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// 收集汇：按到达顺序把条目追加到共享向量
///
/// 克隆共享同一存储，可在 `load` 结束后通过任一克隆读取结果。
#[derive(Debug)]
pub struct VecSink<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> VecSink<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取走已收集的条目
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T: Clone> VecSink<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for VecSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

#[async_trait]
impl<T> Sink<T> for VecSink<T>
where
    T: Send + 'static,
{
    async fn load(&self, mut input: mpsc::Receiver<T>, _events: EventSender) {
        while let Some(item) = input.recv().await {
            self.items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::testing::feed;

    #[tokio::test]
    async fn collects_in_arrival_order() {
        let sink = VecSink::<u8>::new();
        sink.clone().load(feed(vec![3, 1, 2]), EventSender::detached()).await;

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.snapshot(), vec![3, 1, 2]);
        assert_eq!(sink.take(), vec![3, 1, 2]);
        assert!(sink.is_empty());
    }
}
