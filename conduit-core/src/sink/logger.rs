use crate::error::PipelineError;
use crate::event::{ErrorEvent, EventSender, send_event};
use crate::stage::Sink;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use std::fmt::Debug;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

type WriteFn = Arc<dyn Fn(&str) -> io::Result<()> + Send + Sync>;

/// 日志汇：把条目渲染为制表符缩进的 JSON 并逐条写出
///
/// 序列化失败时退回 `Debug` 格式；渲染结果为空时投递临时 `ErrorEvent`
/// （"formatted data is empty"）而不写出。默认写入 `tracing`（info 级）。
pub struct Logger<T> {
    write: WriteFn,
    _marker: PhantomData<fn(T)>,
}

impl<T> Logger<T> {
    /// 写入 `tracing`
    pub fn new() -> Self {
        Self::with_fn(|record| {
            tracing::info!(target: "conduit::sink::logger", "{record}");
            Ok(())
        })
    }

    /// 写入任意 `io::Write`，每条记录一行
    pub fn with_writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let writer = Mutex::new(writer);
        Self::with_fn(move |record| {
            let mut w = writer.lock().unwrap_or_else(PoisonError::into_inner);
            writeln!(w, "{record}")?;
            w.flush()
        })
    }

    /// 使用自定义写出函数
    pub fn with_fn<F>(write: F) -> Self
    where
        F: Fn(&str) -> io::Result<()> + Send + Sync + 'static,
    {
        Self {
            write: Arc::new(write),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Logger<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 以制表符缩进的 JSON 渲染，失败时退回 `Debug`
fn render<T: Serialize + Debug>(item: &T) -> String {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    match item.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| format!("{item:#?}")),
        Err(_) => format!("{item:#?}"),
    }
}

#[async_trait]
impl<T> Sink<T> for Logger<T>
where
    T: Serialize + Debug + Send + 'static,
{
    async fn load(&self, mut input: mpsc::Receiver<T>, events: EventSender) {
        while let Some(item) = input.recv().await {
            let record = render(&item);
            if record.is_empty() {
                send_event(
                    &events,
                    ErrorEvent::new("formatted data is empty", PipelineError::EmptyPayload, true),
                );
                continue;
            }
            if let Err(err) = (self.write)(&record) {
                send_event(&events, ErrorEvent::new("failed to write log record", err, true));
            }
        }
    }
}
