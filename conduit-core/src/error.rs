//! 管道核心统一错误定义
//!
//! 仅覆盖构造期配置错误与载荷读取/确认等最小必要集合；
//! 逐条数据的处理失败不会以错误返回，而是作为 `ErrorEvent` 投递到事件流。
//!
use thiserror::Error;

/// 转换/读取闭包返回的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 统一错误类型（核心库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PipelineError {
    // --- 构造期配置 ---
    #[error("predicate func is nil")]
    MissingPredicate,
    #[error("transform func is nil")]
    MissingTransform,
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    // --- 载荷 ---
    #[error("read error: {reason}")]
    Read { reason: String },
    #[error("ack error: {reason}")]
    Ack { reason: String },
    #[error("formatted data is empty")]
    EmptyPayload,

    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn read(reason: impl Into<String>) -> Self {
        Self::Read {
            reason: reason.into(),
        }
    }

    pub fn ack(reason: impl Into<String>) -> Self {
        Self::Ack {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;
