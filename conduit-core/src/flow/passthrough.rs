use super::spawn_forward;
use crate::event::EventSender;
use crate::stage::Flow;
use std::marker::PhantomData;
use tokio::sync::mpsc;

/// 直通阶段：逐条按序交接，输入关闭时关闭输出
///
/// 语义上的空操作，用于满足类型协议而不改变行为。
/// tokio 通道最小容量为 1，因此交接槽位固定为 1。
#[derive(Debug)]
pub struct Passthrough<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Passthrough<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Passthrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Passthrough<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Flow<T, T> for Passthrough<T>
where
    T: Send + 'static,
{
    fn transform(&self, input: mpsc::Receiver<T>, _events: EventSender) -> mpsc::Receiver<T> {
        spawn_forward(input, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::testing::{drain, feed};

    #[tokio::test]
    async fn forwards_in_order_and_closes() {
        let pt = Passthrough::<&'static str>::new();
        let out = pt.transform(feed(vec!["a", "b", "c"]), EventSender::detached());
        assert_eq!(drain(out).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_input_closes_output() {
        let pt = Passthrough::<u8>::default();
        let mut out = pt.transform(feed(Vec::new()), EventSender::detached());
        assert_eq!(out.recv().await, None);
    }
}
