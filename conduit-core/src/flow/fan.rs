//! 扇出 / 扇入
//!
//! - `RoundRobin`：把条目轮流分发到 `n` 条输出，用于并行执行下游阶段；
//! - `Broadcast`：把每个条目克隆到全部 `n` 条输出；
//! - `Merge`：合并多条输入，全部输入关闭后关闭输出。
//!
//! 下游提前关闭的输出会被移出分发集合；全部输出关闭后停止读取上游。
//! `n == 0` 时不产生输出，上游被读尽并丢弃。
//!
use crate::event::EventSender;
use crate::stage::{FanIn, FanOut};
use futures_util::StreamExt;
use futures_util::stream::select_all;
use std::marker::PhantomData;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

fn outputs<T>(n: u8, capacity: usize) -> (Vec<mpsc::Sender<T>>, Vec<mpsc::Receiver<T>>) {
    (0..n).map(|_| mpsc::channel(capacity.max(1))).unzip()
}

fn spawn_discard<T: Send + 'static>(mut input: mpsc::Receiver<T>) {
    tokio::spawn(async move { while input.recv().await.is_some() {} });
}

/// 轮询扇出
#[derive(Debug)]
pub struct RoundRobin<T> {
    capacity: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RoundRobin<T> {
    /// `capacity` 为每条输出的缓冲容量，0 按 1 处理
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for RoundRobin<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> FanOut<T> for RoundRobin<T>
where
    T: Send + 'static,
{
    fn split(
        &self,
        mut input: mpsc::Receiver<T>,
        _events: EventSender,
        n: u8,
    ) -> Vec<mpsc::Receiver<T>> {
        if n == 0 {
            spawn_discard(input);
            return Vec::new();
        }

        let (mut senders, receivers) = outputs(n, self.capacity);

        tokio::spawn(async move {
            let mut next = 0usize;
            'items: while let Some(mut item) = input.recv().await {
                loop {
                    if senders.is_empty() {
                        break 'items;
                    }
                    let idx = next % senders.len();
                    match senders[idx].send(item).await {
                        Ok(()) => {
                            next = idx + 1;
                            break;
                        }
                        Err(mpsc::error::SendError(back)) => {
                            // 该输出已关闭，换下一条重试
                            senders.remove(idx);
                            next = idx;
                            item = back;
                        }
                    }
                }
            }
        });

        receivers
    }
}

/// 广播扇出：每条输出都收到全部条目
///
/// 按锁步推进，最慢的下游决定整体速度。
#[derive(Debug)]
pub struct Broadcast<T> {
    capacity: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Broadcast<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> FanOut<T> for Broadcast<T>
where
    T: Clone + Send + 'static,
{
    fn split(
        &self,
        mut input: mpsc::Receiver<T>,
        _events: EventSender,
        n: u8,
    ) -> Vec<mpsc::Receiver<T>> {
        if n == 0 {
            spawn_discard(input);
            return Vec::new();
        }

        let (mut senders, receivers) = outputs(n, self.capacity);

        tokio::spawn(async move {
            while let Some(item) = input.recv().await {
                let mut closed = Vec::new();
                for (idx, tx) in senders.iter().enumerate() {
                    if tx.send(item.clone()).await.is_err() {
                        closed.push(idx);
                    }
                }
                for idx in closed.into_iter().rev() {
                    senders.remove(idx);
                }
                if senders.is_empty() {
                    break;
                }
            }
        });

        receivers
    }
}

/// 扇入合并
///
/// 单条输入内部的顺序保持不变，不同输入之间不保证交错顺序。
#[derive(Debug)]
pub struct Merge<T> {
    capacity: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Merge<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Merge<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> FanIn<T> for Merge<T>
where
    T: Send + 'static,
{
    fn merge(&self, inputs: Vec<mpsc::Receiver<T>>, _events: EventSender) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut merged = select_all(inputs.into_iter().map(ReceiverStream::new));

        tokio::spawn(async move {
            while let Some(item) = merged.next().await {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}
