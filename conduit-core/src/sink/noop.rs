use crate::event::EventSender;
use crate::stage::Sink;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// 空操作汇：读尽输入并丢弃
#[derive(Clone, Copy, Debug, Default)]
pub struct Noop;

#[async_trait]
impl<T> Sink<T> for Noop
where
    T: Send + 'static,
{
    async fn load(&self, mut input: mpsc::Receiver<T>, _events: EventSender) {
        while input.recv().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drains_until_upstream_closes() {
        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for i in 0..100u32 {
                tx.send(i).await.expect("noop keeps reading");
            }
        });

        Noop.load(rx, EventSender::detached()).await;
        producer.await.expect("producer");
    }
}
