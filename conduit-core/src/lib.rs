//! 流式管道核心库（conduit-core）
//!
//! 提供以“阶段（Stage）”为中心的并发流处理抽象，用于在应用中实现：
//! - 阶段协议（`stage`）：`Source` / `Flow` / `Sink` / `FanOut` / `FanIn` / `Runnable`
//! - 通用转换组合子（`flow`）：缓冲、直通、过滤、映射、过滤映射与扇出/扇入
//! - 带外事件（`event`）：日志、错误、指标三类事件与非阻塞投递
//! - 事件收集器（`collector`）：工作者池消费事件流并分发到回调
//! - 字节载荷协议（`readable`）以及进程内的源（`source`）与汇（`sink`）
//!
//! 拓扑由调用方手工连接（`Extract -> Transform -> ... -> Load`），本 crate
//! 不提供运行时拓扑解析。每个阶段只关闭自己创建的输出流，上游关闭即是
//! 下游唯一能观察到的取消信号。
//!
//! 典型用法：
//! 1. 选择或实现一个 `Source`，以 `CancellationToken` 控制其生命周期；
//! 2. 通过若干 `Flow` 串联转换，逐级传入事件发送端 `EventSender`；
//! 3. 以 `Sink` 结束管道并等待其 `load` 完成；
//! 4. 使用 `EventCollector` 消费事件流并注册通用/按类型的回调。
//!
pub mod collector;
pub mod error;
pub mod event;
pub mod flow;
pub mod readable;
pub mod sink;
pub mod source;
pub mod stage;

pub use collector::{EventCallback, EventCollector, EventCollectorBuilder, EventCollectorConfig};
pub use error::{BoxError, PipelineError, PipelineResult};
pub use event::{
    ErrorEvent, Event, EventKind, EventSender, LogEvent, LogLevel, MetricEvent, MetricKind,
    event_channel, send_event, trace_event, unbounded_event_channel,
};
pub use stage::{FanIn, FanOut, Flow, Runnable, Sink, Source};
