//! 阶段（Stage）协议
//!
//! 管道由调用方手工连接：`Source -> Flow -> ... -> Flow -> Sink`。
//! 每个阶段拿到上游流的读端与共享事件流的写端，只拥有并关闭自己创建的输出流，
//! 并且在任何退出路径（上游耗尽、内部失败、取消）上都必须关闭它，
//! 以便下游确定性地结束而不是挂起。
//!
//! 在 Rust 中“关闭输出流”即丢弃对应的 `mpsc::Sender`。
//!
use crate::event::{Event, EventSender};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 管道起点：产出 `T`
///
/// 取消令牌被触发或底层输入耗尽时关闭输出流；I/O 失败以 `ErrorEvent` 上报，
/// 而不是破坏性地终止流。
pub trait Source<T>: Send + Sync {
    fn extract(&self, token: CancellationToken, events: EventSender) -> mpsc::Receiver<T>;
}

/// 转换阶段：消费 `In`，产出 `Out`
pub trait Flow<In, Out>: Send + Sync {
    fn transform(&self, input: mpsc::Receiver<In>, events: EventSender) -> mpsc::Receiver<Out>;
}

/// 扇出：把一条流拆分为 `n` 条
pub trait FanOut<T>: Send + Sync {
    fn split(
        &self,
        input: mpsc::Receiver<T>,
        events: EventSender,
        n: u8,
    ) -> Vec<mpsc::Receiver<T>>;
}

/// 扇入：把多条流合并为一条
pub trait FanIn<T>: Send + Sync {
    fn merge(&self, inputs: Vec<mpsc::Receiver<T>>, events: EventSender) -> mpsc::Receiver<T>;
}

/// 管道终点：消费 `In`，执行最终副作用
///
/// `load` 在输入流耗尽后返回；外部消费的条目只能在本地副作用成功后确认。
#[async_trait]
pub trait Sink<In>: Send + Sync
where
    In: Send + 'static,
{
    async fn load(&self, input: mpsc::Receiver<In>, events: EventSender);
}

/// 持有完整拓扑的可运行管道，返回整条管道的事件流
pub trait Runnable {
    fn run(&self, token: CancellationToken) -> mpsc::Receiver<Event>;
}
