//! 非阻塞事件投递
//!
//! 所有阶段都通过 `send_event` 上报事件：事件流缺失、已满或已关闭时立即返回
//! `false`，绝不阻塞数据通路，也不会忙等。
//!
use super::Event;
use tokio::sync::mpsc;

/// 事件流的写端句柄，可被多个阶段克隆共享
///
/// 三种形态：
/// - 分离（`EventSender::detached()` / `Default`）：相当于未设置的句柄，投递总是失败；
/// - 有界：底层为 `mpsc::Sender`，容量耗尽时投递失败；
/// - 无界：底层为 `mpsc::UnboundedSender`，接收端存活时投递总是成功。
#[derive(Clone, Debug, Default)]
pub struct EventSender {
    inner: Option<Inner>,
}

#[derive(Clone, Debug)]
enum Inner {
    Bounded(mpsc::Sender<Event>),
    Unbounded(mpsc::UnboundedSender<Event>),
}

impl EventSender {
    /// 未连接任何事件流的句柄
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn bounded(tx: mpsc::Sender<Event>) -> Self {
        Self {
            inner: Some(Inner::Bounded(tx)),
        }
    }

    pub fn unbounded(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            inner: Some(Inner::Unbounded(tx)),
        }
    }

    /// 是否连接了事件流（不代表接收端仍然存活）
    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// 立即尝试投递，成功返回 `true`
    pub fn try_send(&self, event: impl Into<Event>) -> bool {
        match &self.inner {
            None => false,
            Some(Inner::Bounded(tx)) => tx.try_send(event.into()).is_ok(),
            Some(Inner::Unbounded(tx)) => tx.send(event.into()).is_ok(),
        }
    }
}

impl From<mpsc::Sender<Event>> for EventSender {
    fn from(tx: mpsc::Sender<Event>) -> Self {
        Self::bounded(tx)
    }
}

impl From<mpsc::UnboundedSender<Event>> for EventSender {
    fn from(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self::unbounded(tx)
    }
}

/// 尽力而为地投递一个事件，不阻塞、不报错
///
/// 句柄未设置、事件流已满或接收端已关闭时返回 `false`。
pub fn send_event(events: &EventSender, event: impl Into<Event>) -> bool {
    let delivered = events.try_send(event);
    if !delivered && events.is_attached() {
        tracing::trace!("event dropped: stream full or closed");
    }
    delivered
}

/// 分配一个有界事件流（容量为 0 时按 1 处理）
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender::bounded(tx), rx)
}

/// 分配一个无界事件流
pub fn unbounded_event_channel() -> (EventSender, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender::unbounded(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogEvent, LogLevel};

    fn sample() -> LogEvent {
        LogEvent::new("test", LogLevel::Info, "message")
    }

    #[test]
    fn detached_handle_fails_without_blocking() {
        let events = EventSender::detached();
        assert!(!events.is_attached());
        assert!(!send_event(&events, sample()));
    }

    #[test]
    fn full_bounded_stream_fails() {
        let (events, _rx) = event_channel(1);
        assert!(send_event(&events, sample()));
        // 容量已满且无人接收
        assert!(!send_event(&events, sample()));
    }

    #[test]
    fn closed_stream_fails() {
        let (events, rx) = event_channel(4);
        drop(rx);
        assert!(!send_event(&events, sample()));
    }

    #[tokio::test]
    async fn bounded_stream_with_capacity_succeeds() {
        let (events, mut rx) = event_channel(2);
        assert!(send_event(&events, sample()));
        let got = rx.recv().await.expect("event");
        assert_eq!(got.to_string(), "test: message");
    }

    #[tokio::test]
    async fn unbounded_stream_succeeds() {
        let (events, mut rx) = unbounded_event_channel();
        for _ in 0..1_000 {
            assert!(send_event(&events, sample()));
        }
        let mut n = 0;
        while let Ok(_ev) = rx.try_recv() {
            n += 1;
        }
        assert_eq!(n, 1_000);
    }
}
