//! 手工连接的演示拓扑
//!
//! - `HttpPipeline`：HTTP 源 -> 解码为文本 -> 缓冲 -> 日志汇；
//! - `RelayPipeline`：中间件源 -> 过滤空消息并规范化 -> 中间件汇（发布后确认原消息）。
//!
use conduit_adapters::{
    AdapterResult, BrokerMessage, BrokerSink, BrokerSource, HttpLog, HttpServer, InMemoryBroker,
};
use conduit_core::flow::{Buffer, FilterMap, Map};
use conduit_core::readable::{Envelope, Payload};
use conduit_core::sink::Logger;
use conduit_core::{BoxError, Event, Flow, Runnable, Sink, Source, event_channel};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 256;

pub struct HttpPipeline {
    server: HttpServer,
    buffer: usize,
}

impl HttpPipeline {
    pub fn new(server: HttpServer, buffer: usize) -> Self {
        Self { server, buffer }
    }
}

impl Runnable for HttpPipeline {
    fn run(&self, token: CancellationToken) -> mpsc::Receiver<Event> {
        let (events, rx) = event_channel(EVENT_CAPACITY);

        let logs = self.server.extract(token, events.clone());
        let decode = Map::new(|log: HttpLog| {
            String::from_utf8(log.payload().to_vec()).map(|text| text.trim_end().to_string())
        });
        let lines = decode.transform(logs, events.clone());
        let buffered = Buffer::new(self.buffer).transform(lines, events.clone());

        let sink = Logger::<String>::new();
        tokio::spawn(async move { sink.load(buffered, events).await });

        rx
    }
}

type Relayed = Envelope<Payload, BrokerMessage>;

pub struct RelayPipeline {
    source: BrokerSource<InMemoryBroker>,
    sink: Arc<BrokerSink<InMemoryBroker>>,
}

impl RelayPipeline {
    pub fn new(broker: Arc<InMemoryBroker>, input: &str, output: &str) -> AdapterResult<Self> {
        Ok(Self {
            source: BrokerSource::new(broker.clone(), input)?,
            sink: Arc::new(BrokerSink::new(broker, output)?),
        })
    }
}

fn normalize(message: BrokerMessage) -> Result<Relayed, BoxError> {
    let text = std::str::from_utf8(message.payload())?;
    let data = Payload::from(text.trim().to_uppercase().as_str());
    Ok(Envelope::new(data, message))
}

impl Runnable for RelayPipeline {
    fn run(&self, token: CancellationToken) -> mpsc::Receiver<Event> {
        let (events, rx) = event_channel(EVENT_CAPACITY);

        let messages = self.source.extract(token, events.clone());
        let relay = FilterMap::new(
            |message: &BrokerMessage| !message.payload().trim_ascii().is_empty(),
            normalize,
        );
        let relayed = relay.transform(messages, events.clone());

        let sink = self.sink.clone();
        tokio::spawn(async move { sink.load(relayed, events).await });

        rx
    }
}
