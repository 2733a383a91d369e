//! 进程内数据源
//!
//! - `IterSource`：按序产出一组固定条目；
//! - `ReadableSource`：产出 `Readable` 条目，读取失败的条目以 `ErrorEvent` 上报并跳过。
//!
//! 二者都在取消令牌触发或条目耗尽时关闭输出流。
//!
use crate::event::{ErrorEvent, EventSender, LogEvent, LogLevel, send_event};
use crate::readable::Readable;
use crate::stage::Source;
use std::fmt::Debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 固定条目源
///
/// 每产出一个条目投递一条 `Info` 级日志事件（尽力而为）。
#[derive(Clone, Debug)]
pub struct IterSource<T> {
    name: String,
    items: Vec<T>,
}

impl<T> IterSource<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            name: "iter source".to_string(),
            items: items.into_iter().collect(),
        }
    }

    /// 设置日志事件中的来源标签
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<T> Source<T> for IterSource<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    fn extract(&self, token: CancellationToken, events: EventSender) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(1);
        let items = self.items.clone();
        let name = self.name.clone();

        tokio::spawn(async move {
            for item in items {
                let message = format!("extracted item: {item:?}");
                tokio::select! {
                    _ = token.cancelled() => return,
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
                send_event(&events, LogEvent::new(name.as_str(), LogLevel::Info, message));
            }
        });

        rx
    }
}

/// `Readable` 条目源
#[derive(Clone, Debug)]
pub struct ReadableSource<T> {
    items: Vec<T>,
}

impl<T> ReadableSource<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl<T> Source<T> for ReadableSource<T>
where
    T: Readable + Clone + 'static,
{
    fn extract(&self, token: CancellationToken, events: EventSender) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(1);
        let items = self.items.clone();

        tokio::spawn(async move {
            for item in items {
                if let Err(err) = item.read() {
                    send_event(&events, ErrorEvent::new("error reading data", err, true));
                    continue;
                }
                tokio::select! {
                    _ = token.cancelled() => return,
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, PipelineResult};
    use crate::event::{EventKind, event_channel};
    use crate::flow::testing::drain;
    use crate::readable::Payload;

    #[tokio::test]
    async fn iter_source_emits_items_then_closes() {
        let (events, mut rx) = event_channel(16);
        let source = IterSource::new(vec![1, 2, 3]).with_name("numbers");
        let out = source.extract(CancellationToken::new(), events);

        assert_eq!(drain(out).await, vec![1, 2, 3]);

        let mut logs = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.kind(), EventKind::Log);
            logs.push(ev.to_string());
        }
        assert_eq!(logs.first().map(String::as_str), Some("numbers: extracted item: 1"));
    }

    #[tokio::test]
    async fn iter_source_stops_on_cancellation() {
        let token = CancellationToken::new();
        let source = IterSource::new(0..1_000);
        let mut out = source.extract(token.clone(), EventSender::detached());

        assert_eq!(out.recv().await, Some(0));
        token.cancel();

        let rest = drain(out).await;
        assert!(rest.len() < 999, "source kept producing after cancel");
    }

    #[derive(Clone)]
    enum Item {
        Good(Payload),
        Bad,
    }

    impl Readable for Item {
        fn read(&self) -> PipelineResult<Vec<u8>> {
            match self {
                Item::Good(p) => p.read(),
                Item::Bad => Err(PipelineError::read("corrupt")),
            }
        }
    }

    #[tokio::test]
    async fn readable_source_skips_unreadable_items() {
        let (events, mut rx) = event_channel(16);
        let source = ReadableSource::new(vec![
            Item::Good(Payload::from("a")),
            Item::Bad,
            Item::Good(Payload::from("b")),
        ]);

        let out = drain(source.extract(CancellationToken::new(), events)).await;
        let bytes: Vec<_> = out.iter().map(|i| i.read().expect("read")).collect();
        assert_eq!(bytes, vec![b"a".to_vec(), b"b".to_vec()]);

        let ev = rx.try_recv().expect("error event");
        let err = ev.as_error().expect("error");
        assert_eq!(err.message(), "error reading data");
        assert!(err.is_temporary());
        assert!(rx.try_recv().is_err());
    }
}
