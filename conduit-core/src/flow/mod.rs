//! 通用转换组合子（flow）
//!
//! 所有组合子都对条目类型泛型，每次调用 `transform` / `split` / `merge`
//! 会启动一个独立的 tokio 任务，因此必须在 tokio 运行时内调用。
//! 单个阶段内输出顺序与输入顺序一致。
//!
//! - `Buffer`：有界 FIFO，解耦生产与消费速度；
//! - `Passthrough`：语义空操作，逐条交接；
//! - `Filter` / `Map` / `FilterMap`：谓词过滤、映射与一次遍历的过滤映射；
//! - `RoundRobin` / `Broadcast` / `Merge`：扇出与扇入。
//!
pub mod buffer;
pub mod fan;
pub mod filter;
pub mod filter_map;
pub mod map;
pub mod passthrough;

pub use buffer::Buffer;
pub use fan::{Broadcast, Merge, RoundRobin};
pub use filter::{Filter, Predicate};
pub use filter_map::FilterMap;
pub use map::{Map, MapFn};
pub use passthrough::Passthrough;

use tokio::sync::mpsc;

/// 启动一个按序转发任务，输出流容量为 `capacity`
///
/// 上游耗尽后关闭输出；下游提前关闭时停止读取上游。
fn spawn_forward<T>(mut input: mpsc::Receiver<T>, capacity: usize) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        while let Some(item) = input.recv().await {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });
    rx
}
