//! 错误事件（ErrorEvent）
//!
//! 包装底层失败原因、描述性消息与 `temporary` 标记。`temporary` 是暴露给
//! 观察者的唯一重试信号，核心自身从不自动重试。
//!
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// 错误事件，渲染格式为 `"<message>: <cause>"`
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    message: String,
    cause: Arc<dyn StdError + Send + Sync + 'static>,
    temporary: bool,
}

impl ErrorEvent {
    pub fn new<E>(message: impl Into<String>, cause: E, temporary: bool) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            cause: Arc::new(cause),
            temporary,
        }
    }

    /// 从已装箱的错误构造（例如转换闭包返回的 `BoxError`）
    pub fn from_boxed(
        message: impl Into<String>,
        cause: Box<dyn StdError + Send + Sync + 'static>,
        temporary: bool,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Arc::from(cause),
            temporary,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 是否为可重试的临时错误
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// 取出底层原因
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// 尝试将底层原因还原为具体错误类型
    pub fn downcast_cause<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.cause)
    }
}

impl StdError for ErrorEvent {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn renders_message_and_cause() {
        let ev = ErrorEvent::new("failed to publish", std::io::Error::other("timeout"), true);
        assert_eq!(ev.to_string(), "failed to publish: timeout");
        assert_eq!(ev.message(), "failed to publish");
        assert!(ev.is_temporary());
    }

    #[test]
    fn temporary_flag_is_preserved() {
        let fatal = ErrorEvent::new("connect", std::io::Error::other("refused"), false);
        assert!(!fatal.is_temporary());
    }

    #[test]
    fn cause_can_be_unwrapped() {
        let ev = ErrorEvent::new("read", PipelineError::read("short read"), true);

        let cause = ev.downcast_cause::<PipelineError>().expect("cause type");
        assert!(matches!(cause, PipelineError::Read { .. }));
        assert!(ev.downcast_cause::<std::io::Error>().is_none());

        let source = StdError::source(&ev).expect("source");
        assert_eq!(source.to_string(), "read error: short read");
        assert_eq!(ev.cause().to_string(), "read error: short read");
    }

    #[test]
    fn boxed_cause_keeps_concrete_type() {
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(std::io::Error::other("x"));
        let ev = ErrorEvent::from_boxed("map transform error", boxed, true);
        assert!(ev.downcast_cause::<std::io::Error>().is_some());
    }
}
