use conduit_core::PipelineError;

/// 适配器层错误
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("http log error: payload is missing")]
    MissingPayload,

    #[error("broker: {reason}")]
    Broker { reason: String },

    #[error("timed out: {operation}")]
    Timeout { operation: &'static str },
}

impl AdapterError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn broker(reason: impl Into<String>) -> Self {
        Self::Broker {
            reason: reason.into(),
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;
