//! 进程内数据汇（sink）
//!
//! - `Logger`：把每个条目渲染为缩进 JSON 并逐条写出；
//! - `Noop`：仅读尽输入；
//! - `VecSink`：把条目收集到共享向量，便于测试与演示。
//!
pub mod logger;
pub mod noop;
pub mod vec;

pub use logger::Logger;
pub use noop::Noop;
pub use vec::VecSink;
