//! 事件收集器（EventCollector）
//!
//! 管道事件流的唯一消费者：以固定数量的工作者任务读取有界事件流，
//! 并把每个事件分发到注册的回调：
//! - 先按注册顺序调用全部通用回调；
//! - 再按注册顺序调用类型匹配的回调。
//!
//! 状态机：`Created -> Open（collect）-> Closed（close）`。
//! `collect` 在打开状态下幂等，返回已有的事件流；`close` 在关闭状态下是空操作。
//! `close` 会等待全部工作者处理完已入队的事件后才返回（优雅排空）。
//!
//! 工作者运行在 tokio 的阻塞线程池上：回调可以同步阻塞，既不占用异步运行时线程，
//! 也能在单线程运行时上并行执行。工作者数大于 1 时不保证跨工作者的全局顺序，
//! 回调需要能与自身并发执行。生产者应使用非阻塞的 `send_event` 投递，
//! 慢回调不会反压数据通路。
//!
//! 收集器被丢弃时会通知工作者退出；运行时关闭前应当 `close` 或丢弃收集器。
//!
use crate::event::{Event, EventKind, EventSender};
use bon::Builder;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;

// 导入由 bon::Builder 生成的 typestate 模块
use self::event_collector_builder::State as BuilderState;

/// 事件回调
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// 收集器配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventCollectorConfig {
    /// 工作者数量
    pub workers: usize,
    /// 事件流缓冲容量
    pub buffer_size: usize,
}

impl Default for EventCollectorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            buffer_size: 100,
        }
    }
}

#[derive(Clone, Default)]
struct CallbackRegistry {
    all: Vec<EventCallback>,
    typed: Vec<(EventKind, EventCallback)>,
}

impl CallbackRegistry {
    fn dispatch(&self, event: &Event) {
        for callback in &self.all {
            callback(event);
        }

        let kind = event.kind();
        for (k, callback) in &self.typed {
            if *k == kind {
                callback(event);
            }
        }
    }
}

/// 事件收集器：工作者池 + 回调分发
///
/// 构建器的每个设置项都会被校验，非法值被静默忽略而不是报错：
/// 工作者数与缓冲容量为 0 时保留默认值，缺失的回调不会被注册。
#[derive(Builder)]
pub struct EventCollector {
    #[builder(field)]
    config: EventCollectorConfig,
    #[builder(field)]
    registry: Arc<CallbackRegistry>,
    #[builder(skip)]
    state: Mutex<Option<Running>>,
}

impl<S: BuilderState> EventCollectorBuilder<S> {
    pub fn workers(mut self, workers: usize) -> Self {
        if workers > 0 {
            self.config.workers = workers;
        }
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.config.buffer_size = size;
        }
        self
    }

    /// 批量应用配置，逐项校验
    pub fn config(self, config: EventCollectorConfig) -> Self {
        self.workers(config.workers).buffer_size(config.buffer_size)
    }

    /// 注册通用回调：所有事件都会调用
    pub fn callback<F>(self, callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.maybe_callback(Some(Arc::new(callback)))
    }

    pub fn maybe_callback(mut self, callback: Option<EventCallback>) -> Self {
        if let Some(callback) = callback {
            Arc::make_mut(&mut self.registry).all.push(callback);
        }
        self
    }

    /// 注册按类型过滤的回调
    pub fn typed_callback<F>(self, kind: EventKind, callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.maybe_typed_callback(kind, Some(Arc::new(callback)))
    }

    pub fn maybe_typed_callback(
        mut self,
        kind: EventKind,
        callback: Option<EventCallback>,
    ) -> Self {
        if let Some(callback) = callback {
            Arc::make_mut(&mut self.registry).typed.push((kind, callback));
        }
        self
    }
}

struct Running {
    events: EventSender,
    token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> EventCollectorConfig {
        self.config
    }

    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 打开收集器并返回事件流写端
    ///
    /// 分配有界事件流并启动配置数量的工作者；已打开时直接返回现有的写端。
    /// 必须在 tokio 运行时内调用。
    pub fn collect(&self) -> EventSender {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = state.as_ref() {
            return running.events.clone();
        }

        let (tx, rx) = mpsc::channel(self.config.buffer_size);
        let rx = Arc::new(AsyncMutex::new(rx));
        let token = CancellationToken::new();

        let handle = Handle::current();
        let workers = (0..self.config.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    rx: rx.clone(),
                    token: token.clone(),
                    registry: self.registry.clone(),
                    handle: handle.clone(),
                };
                task::spawn_blocking(move || worker.run())
            })
            .collect();

        let events = EventSender::bounded(tx);
        *state = Some(Running {
            events: events.clone(),
            token,
            workers,
        });

        tracing::debug!(
            workers = self.config.workers,
            buffer_size = self.config.buffer_size,
            "event collector opened"
        );

        events
    }

    /// 关闭事件流并等待全部工作者排空退出
    ///
    /// 关闭前成功投递的事件都会被处理；关闭开始后的投递会失败。
    /// 未打开或已关闭时为空操作。
    pub async fn close(&self) {
        let running = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(running) = running else {
            return;
        };

        running.token.cancel();
        drop(running.events);

        for (id, worker) in running.workers.into_iter().enumerate() {
            if let Err(err) = worker.await {
                tracing::error!(worker = id, error = %err, "event collector worker failed");
            }
        }

        tracing::debug!("event collector closed");
    }
}

impl Drop for EventCollector {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = state.take() {
            // 无法在 Drop 中等待，仅通知工作者排空后退出
            running.token.cancel();
        }
    }
}

/// 工作者在阻塞线程池上运行，回调可以同步阻塞而不占用异步运行时线程
struct Worker {
    id: usize,
    rx: Arc<AsyncMutex<mpsc::Receiver<Event>>>,
    token: CancellationToken,
    registry: Arc<CallbackRegistry>,
    handle: Handle,
}

impl Worker {
    fn run(self) {
        while let Some(event) = self.handle.block_on(self.next()) {
            self.registry.dispatch(&event);
        }
        tracing::trace!(worker = self.id, "event collector worker exited");
    }

    /// 取下一个事件；取消后停止接收新事件，排空已入队的部分后返回 `None`
    async fn next(&self) -> Option<Event> {
        let mut rx = self.rx.lock().await;
        let received = tokio::select! {
            ev = rx.recv() => Some(ev),
            _ = self.token.cancelled() => None,
        };
        match received {
            Some(ev) => ev,
            None => {
                rx.close();
                rx.recv().await
            }
        }
    }
}
