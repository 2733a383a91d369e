//! 消息中间件适配器
//!
//! - `BrokerConsumer` / `BrokerPublisher`：中间件客户端协议，返回 `'static` 消息流，
//!   便于在 `tokio::spawn` 中消费；
//! - `BrokerSource`：订阅指定流并把消息推入输出；
//! - `BrokerSink`：发布条目的数据视图，发布成功后再确认其原始视图；
//! - `InMemoryBroker`：基于 `tokio::sync::broadcast` 的内存实现，记录发布与确认，
//!   用于测试与本地演示。
//!
use crate::error::{AdapterError, AdapterResult};
use async_trait::async_trait;
use conduit_core::event::{ErrorEvent, EventSender, send_event};
use conduit_core::readable::{Ackable, DataRawReadable, DataReadable, RawReadable, Readable};
use conduit_core::{PipelineError, PipelineResult, Sink, Source};
use dashmap::{DashMap, DashSet};
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use futures_util::future::ready;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

type AckFn = Arc<dyn Fn() -> AdapterResult<()> + Send + Sync>;

/// 订阅得到的消息流
pub type MessageStream = BoxStream<'static, AdapterResult<BrokerMessage>>;

/// 从中间件消费的一条消息
#[derive(Clone)]
pub struct BrokerMessage {
    subject: String,
    sequence: u64,
    payload: Vec<u8>,
    acker: Option<AckFn>,
}

impl BrokerMessage {
    pub fn new(subject: impl Into<String>, sequence: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            sequence,
            payload: payload.into(),
            acker: None,
        }
    }

    /// 附加确认动作；附加后该消息通过 `as_ackable` 暴露确认能力
    pub fn with_acker<F>(mut self, acker: F) -> Self
    where
        F: Fn() -> AdapterResult<()> + Send + Sync + 'static,
    {
        self.acker = Some(Arc::new(acker));
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Debug for BrokerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerMessage")
            .field("subject", &self.subject)
            .field("sequence", &self.sequence)
            .field("payload_len", &self.payload.len())
            .field("ackable", &self.acker.is_some())
            .finish()
    }
}

impl Readable for BrokerMessage {
    fn read(&self) -> PipelineResult<Vec<u8>> {
        Ok(self.payload.clone())
    }

    fn as_ackable(&self) -> Option<&dyn Ackable> {
        self.acker.as_ref().map(|_| self as &dyn Ackable)
    }
}

impl Ackable for BrokerMessage {
    fn ack(&self) -> PipelineResult<()> {
        match &self.acker {
            Some(acker) => acker().map_err(|err| PipelineError::ack(err.to_string())),
            None => Ok(()),
        }
    }
}

/// 中间件消费端
#[async_trait]
pub trait BrokerConsumer: Send + Sync {
    /// 连接到指定流，返回 `'static` 生命周期的消息流
    async fn connect(&self, stream: &str) -> AdapterResult<MessageStream>;
}

/// 中间件发布端
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: &[u8]) -> AdapterResult<()>;
}

/// 中间件源
pub struct BrokerSource<C> {
    consumer: Arc<C>,
    stream: String,
}

impl<C> BrokerSource<C> {
    /// 流名称为空时构造失败
    pub fn new(consumer: Arc<C>, stream: impl Into<String>) -> AdapterResult<Self> {
        let stream = stream.into();
        if stream.is_empty() {
            return Err(AdapterError::invalid_config(
                "broker stream source: stream name is empty",
            ));
        }
        Ok(Self { consumer, stream })
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }
}

impl<C> Source<BrokerMessage> for BrokerSource<C>
where
    C: BrokerConsumer + 'static,
{
    fn extract(
        &self,
        token: CancellationToken,
        events: EventSender,
    ) -> mpsc::Receiver<BrokerMessage> {
        let (tx, rx) = mpsc::channel(1);
        let consumer = self.consumer.clone();
        let stream = self.stream.clone();

        tokio::spawn(async move {
            let connected = tokio::select! {
                _ = token.cancelled() => return,
                connected = consumer.connect(&stream) => connected,
            };
            let mut messages = match connected {
                Ok(messages) => messages,
                Err(err) => {
                    tracing::error!(%stream, error = %err, "broker source failed to connect");
                    send_event(
                        &events,
                        ErrorEvent::new("failed to create or update consumer", err, false),
                    );
                    return;
                }
            };
            tracing::debug!(%stream, "broker source connected");

            loop {
                let next = tokio::select! {
                    _ = token.cancelled() => break,
                    next = messages.next() => next,
                };
                let message = match next {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => {
                        let event = ErrorEvent::new("failed to get next message", err, true);
                        send_event(&events, event);
                        continue;
                    }
                    None => break,
                };
                tokio::select! {
                    _ = token.cancelled() => break,
                    sent = tx.send(message) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(%stream, "broker source stopped");
        });

        rx
    }
}

/// 中间件汇
pub struct BrokerSink<P> {
    publisher: Arc<P>,
    subject: String,
}

impl<P> BrokerSink<P> {
    /// 主题为空时构造失败
    pub fn new(publisher: Arc<P>, subject: impl Into<String>) -> AdapterResult<Self> {
        let subject = subject.into();
        if subject.is_empty() {
            return Err(AdapterError::invalid_config(
                "broker stream sink: subject is empty",
            ));
        }
        Ok(Self { publisher, subject })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[async_trait]
impl<P, In> Sink<In> for BrokerSink<P>
where
    P: BrokerPublisher + 'static,
    In: DataRawReadable + Send + 'static,
{
    async fn load(&self, mut input: mpsc::Receiver<In>, events: EventSender) {
        while let Some(item) = input.recv().await {
            let payload = match item.data().read() {
                Ok(payload) => payload,
                Err(err) => {
                    send_event(&events, ErrorEvent::new("failed to read data", err, true));
                    continue;
                }
            };

            if let Err(err) = self.publisher.publish(&self.subject, &payload).await {
                send_event(&events, ErrorEvent::new("failed to publish message", err, true));
                continue;
            }

            if let Some(ackable) = item.raw().as_ackable() {
                if let Err(err) = ackable.ack() {
                    send_event(&events, ErrorEvent::new("failed to ack message", err, true));
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct Record {
    subject: String,
    sequence: u64,
    payload: Vec<u8>,
}

/// 内存版中间件
///
/// 注意：只有在发布时已订阅的消费者才能收到消息；订阅者落后超过容量时，
/// 被覆盖的消息以错误条目出现在其消息流中。
#[derive(Clone)]
pub struct InMemoryBroker {
    tx: broadcast::Sender<Record>,
    sequence: Arc<AtomicU64>,
    published: Arc<DashMap<String, Vec<Vec<u8>>>>,
    acked: Arc<DashSet<u64>>,
}

impl InMemoryBroker {
    /// `capacity` 为广播缓冲区容量，0 按 1 处理
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
            published: Arc::new(DashMap::new()),
            acked: Arc::new(DashSet::new()),
        }
    }

    /// 指定主题上已发布的载荷，按发布顺序
    pub fn published(&self, subject: &str) -> Vec<Vec<u8>> {
        self.published
            .get(subject)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn is_acked(&self, sequence: u64) -> bool {
        self.acked.contains(&sequence)
    }

    pub fn acked_count(&self) -> usize {
        self.acked.len()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl BrokerPublisher for InMemoryBroker {
    async fn publish(&self, subject: &str, payload: &[u8]) -> AdapterResult<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.published
            .entry(subject.to_string())
            .or_default()
            .push(payload.to_vec());

        // 无订阅者时 broadcast 发送失败，消息仅保留在发布记录中
        let _ = self.tx.send(Record {
            subject: subject.to_string(),
            sequence,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[async_trait]
impl BrokerConsumer for InMemoryBroker {
    async fn connect(&self, stream: &str) -> AdapterResult<MessageStream> {
        let stream = stream.to_string();
        let acked = self.acked.clone();

        let messages = BroadcastStream::new(self.tx.subscribe()).filter_map(move |received| {
            let message = match received {
                Ok(record) if record.subject == stream => {
                    let acked = acked.clone();
                    let sequence = record.sequence;
                    Some(Ok(BrokerMessage::new(record.subject, sequence, record.payload)
                        .with_acker(move || {
                            acked.insert(sequence);
                            Ok(())
                        })))
                }
                Ok(_) => None,
                Err(err) => Some(Err(AdapterError::broker(err.to_string()))),
            };
            ready(message)
        });
        Ok(Box::pin(messages))
    }
}
