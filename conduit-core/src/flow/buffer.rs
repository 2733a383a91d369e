use super::spawn_forward;
use crate::event::EventSender;
use crate::stage::Flow;
use std::marker::PhantomData;
use tokio::sync::mpsc;

/// 有界缓冲阶段
///
/// 纯 FIFO：不淘汰、不退避、无优先级，输出满时阻塞上游。
/// 顺序与条目数量严格保持（不丢弃、不去重）。
///
/// # 示例
///
/// ```rust
/// use conduit_core::flow::Buffer;
///
/// // 容量为 0 会被按 1 处理，避免构造永久阻塞的缓冲
/// let buffer = Buffer::<u32>::new(0);
/// assert_eq!(buffer.size(), 1);
/// ```
#[derive(Debug)]
pub struct Buffer<T> {
    size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Buffer<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            _marker: PhantomData,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self::new(self.size)
    }
}

impl<T> Flow<T, T> for Buffer<T>
where
    T: Send + 'static,
{
    fn transform(&self, input: mpsc::Receiver<T>, _events: EventSender) -> mpsc::Receiver<T> {
        spawn_forward(input, self.size)
    }
}
