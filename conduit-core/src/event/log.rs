//! 日志事件（LogEvent）
//!
use serde::Serialize;
use std::fmt;

/// 日志级别
///
/// 数值序号固定为 Error=3、Warn=4、Info=6、Debug=7。
/// 5 号为保留空位（不分配含义），下游依赖 `Error < Warn < Info < Debug`
/// 的序号比较，不可重新编号。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    Error = 3,
    Warn = 4,
    // 5 保留
    Info = 6,
    Debug = 7,
}

impl LogLevel {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// 从序号还原级别；保留位与越界值返回 `None`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            3 => Some(Self::Error),
            4 => Some(Self::Warn),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志事件：来源标签、级别与消息文本
///
/// 渲染格式为 `"<source>: <message>"`。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    source: String,
    level: LogLevel,
    message: String,
}

impl LogEvent {
    pub fn new(source: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            level,
            message: message.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_source_and_message() {
        let ev = LogEvent::new("http", LogLevel::Info, "listening");
        assert_eq!(ev.to_string(), "http: listening");
        assert_eq!(ev.source(), "http");
        assert_eq!(ev.level(), LogLevel::Info);
        assert_eq!(ev.message(), "listening");
    }

    #[test]
    fn level_ordinals_keep_reserved_gap() {
        assert_eq!(LogLevel::Error.as_u8(), 3);
        assert_eq!(LogLevel::Warn.as_u8(), 4);
        assert_eq!(LogLevel::Info.as_u8(), 6);
        assert_eq!(LogLevel::Debug.as_u8(), 7);

        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn from_u8_rejects_reserved_and_out_of_range() {
        assert_eq!(LogLevel::from_u8(5), None);
        assert_eq!(LogLevel::from_u8(0), None);
        assert_eq!(LogLevel::from_u8(8), None);
        for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
            assert_eq!(LogLevel::from_u8(level.as_u8()), Some(level));
        }
    }
}
