//! 带外事件（event）
//!
//! 任意阶段都可以把运行信号（日志、错误、指标）投递到共享的事件流，
//! 而不与具体观察者耦合：
//! - `Event`：封闭的事件和类型，按 `EventKind` 区分；
//! - `LogEvent` / `ErrorEvent` / `MetricEvent`：三种具体载荷；
//! - `EventSender` 与 `send_event`：非阻塞、尽力而为的投递原语；
//! - `trace_event`：把事件桥接到 `tracing`，可直接注册为收集器回调。
//!
//! 事件一经构造即不可变，不持有对生产者的反向引用。
//!
pub mod error;
pub mod log;
pub mod metric;
pub mod sender;

pub use error::ErrorEvent;
pub use log::{LogEvent, LogLevel};
pub use metric::{MetricEvent, MetricKind};
pub use sender::{EventSender, event_channel, send_event, unbounded_event_channel};

use std::fmt;

/// 事件类型标签
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Log,
    Error,
    Metric,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Error => "error",
            Self::Metric => "metric",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 事件：在事件流上传递的带外信号
///
/// 以和类型表达已知的事件集合；渲染（`Display`）委托给具体变体。
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Event {
    Log(LogEvent),
    Error(ErrorEvent),
    Metric(MetricEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Log(_) => EventKind::Log,
            Self::Error(_) => EventKind::Error,
            Self::Metric(_) => EventKind::Metric,
        }
    }

    pub fn as_log(&self) -> Option<&LogEvent> {
        match self {
            Self::Log(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorEvent> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_metric(&self) -> Option<&MetricEvent> {
        match self {
            Self::Metric(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log(e) => e.fmt(f),
            Self::Error(e) => e.fmt(f),
            Self::Metric(e) => e.fmt(f),
        }
    }
}

impl From<LogEvent> for Event {
    fn from(value: LogEvent) -> Self {
        Self::Log(value)
    }
}

impl From<ErrorEvent> for Event {
    fn from(value: ErrorEvent) -> Self {
        Self::Error(value)
    }
}

impl From<MetricEvent> for Event {
    fn from(value: MetricEvent) -> Self {
        Self::Metric(value)
    }
}

/// 将事件转发到 `tracing`
///
/// 日志事件按其级别输出，错误事件以 `warn`（临时）或 `error`（致命）输出，
/// 指标事件以 `debug` 输出。签名与收集器回调一致，可直接注册：
///
/// ```rust
/// use conduit_core::{EventCollector, trace_event};
///
/// let collector = EventCollector::builder().callback(trace_event).build();
/// # drop(collector);
/// ```
pub fn trace_event(event: &Event) {
    match event {
        Event::Log(e) => match e.level() {
            LogLevel::Error => tracing::error!(source = e.source(), "{}", e.message()),
            LogLevel::Warn => tracing::warn!(source = e.source(), "{}", e.message()),
            LogLevel::Info => tracing::info!(source = e.source(), "{}", e.message()),
            LogLevel::Debug => tracing::debug!(source = e.source(), "{}", e.message()),
        },
        Event::Error(e) if e.is_temporary() => tracing::warn!(temporary = true, "{e}"),
        Event::Error(e) => tracing::error!(temporary = false, "{e}"),
        Event::Metric(m) => tracing::debug!(
            metric = m.name(),
            value = m.value(),
            kind = m.metric_kind().as_str(),
            labels = ?m.labels(),
            "metric"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn kind_follows_variant() {
        let log: Event = LogEvent::new("src", LogLevel::Info, "hello").into();
        let err: Event = ErrorEvent::new("boom", std::io::Error::other("io"), true).into();
        let metric: Event =
            MetricEvent::new("items", 1.0, BTreeMap::new(), MetricKind::Counter).into();

        assert_eq!(log.kind(), EventKind::Log);
        assert_eq!(err.kind(), EventKind::Error);
        assert_eq!(metric.kind(), EventKind::Metric);
        assert!(log.as_log().is_some());
        assert!(err.as_error().is_some());
        assert!(metric.as_metric().is_some());
        assert!(log.as_error().is_none());
    }

    #[test]
    fn display_delegates_to_variant() {
        let log: Event = LogEvent::new("src", LogLevel::Warn, "slow").into();
        let cause = std::io::Error::other("bad");
        let err: Event = ErrorEvent::new("map transform error", cause, true).into();
        let metric: Event =
            MetricEvent::new("latency", 0.5, BTreeMap::new(), MetricKind::Histogram).into();

        assert_eq!(log.to_string(), "src: slow");
        assert_eq!(err.to_string(), "map transform error: bad");
        assert_eq!(metric.to_string(), "latency");
        assert_eq!(EventKind::Metric.to_string(), "metric");
    }
}
