//! 边界适配器（conduit-adapters）
//!
//! 把外部 I/O 转换为 `conduit-core` 的 `Source` / `Sink` 协议：
//! - `http`：HTTP 接入源，每个 `POST` 请求体成为一个 `HttpLog` 条目（需 `http` 特性）；
//! - `broker`：消息中间件源与汇，基于抽象的 `BrokerConsumer` / `BrokerPublisher`，
//!   并附带基于 `tokio::sync::broadcast` 的内存实现 `InMemoryBroker`。
//!
//! 适配器对核心不透明：只通过阶段协议交互，I/O 失败以 `ErrorEvent` 上报。
//!
pub mod broker;
pub mod error;
#[cfg(feature = "http")]
pub mod http;

pub use broker::{
    BrokerConsumer, BrokerMessage, BrokerPublisher, BrokerSink, BrokerSource, InMemoryBroker,
    MessageStream,
};
pub use error::{AdapterError, AdapterResult};
#[cfg(feature = "http")]
pub use http::{HttpLog, HttpServer, HttpServerConfig};
