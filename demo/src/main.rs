//! conduit 演示程序
//!
//! 用法：
//!   demo http  [--addr 0.0.0.0:8008] [--endpoint /log] [--buffer 100]
//!   demo relay [--messages 10] [--input logs] [--output parsed]
//!
//! 管道的事件流被转交给 `EventCollector`：所有事件写入 `tracing`，
//! 错误事件另外计数并在退出时汇总。
//!
mod pipelines;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use conduit_adapters::{BrokerPublisher, HttpServer, HttpServerConfig, InMemoryBroker};
use conduit_core::{Event, EventCollector, EventKind, Runnable, send_event, trace_event};
use pipelines::{HttpPipeline, RelayPipeline};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "demo", version, about = "Hand-wired conduit pipelines")]
struct Cli {
    /// tracing 过滤指令，缺省时读取 RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,
    /// 事件收集器的工作者数量
    #[arg(long, env = "CONDUIT_EVENT_WORKERS", default_value_t = 2, global = true)]
    workers: usize,
    /// 事件收集器的缓冲容量
    #[arg(long, env = "CONDUIT_EVENT_BUFFER", default_value_t = 100, global = true)]
    event_buffer: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 接收 HTTP POST 日志并写入 tracing，Ctrl-C 退出
    Http(HttpArgs),
    /// 通过内存中间件转发一批消息
    Relay(RelayArgs),
}

#[derive(Args)]
struct HttpArgs {
    #[arg(long, env = "CONDUIT_HTTP_ADDR", default_value = "0.0.0.0:8008")]
    addr: String,
    #[arg(long, env = "CONDUIT_HTTP_ENDPOINT", default_value = "/log")]
    endpoint: String,
    /// 读取请求体超时（毫秒）
    #[arg(long, env = "CONDUIT_HTTP_READ_TIMEOUT_MS", default_value_t = 5000)]
    read_timeout_ms: u64,
    /// 推入管道超时（毫秒）
    #[arg(long, env = "CONDUIT_HTTP_WRITE_TIMEOUT_MS", default_value_t = 5000)]
    write_timeout_ms: u64,
    /// 日志汇之前的缓冲大小
    #[arg(long, default_value_t = 100)]
    buffer: usize,
}

#[derive(Args)]
struct RelayArgs {
    #[arg(long, default_value_t = 10)]
    messages: usize,
    #[arg(long, default_value = "logs")]
    input: String,
    #[arg(long, default_value = "parsed")]
    output: String,
}

fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// 把管道事件流转交给收集器
fn relay_events(mut events: mpsc::Receiver<Event>, collector: &EventCollector) -> JoinHandle<()> {
    let sender = collector.collect();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            send_event(&sender, event);
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let errors = Arc::new(AtomicUsize::new(0));
    let collector = {
        let errors = errors.clone();
        EventCollector::builder()
            .workers(cli.workers)
            .buffer_size(cli.event_buffer)
            .callback(trace_event)
            .typed_callback(EventKind::Error, move |_| {
                errors.fetch_add(1, Ordering::Relaxed);
            })
            .build()
    };

    let token = CancellationToken::new();
    match cli.command {
        Command::Http(args) => run_http(args, token, &collector).await?,
        Command::Relay(args) => run_relay(args, token, &collector).await?,
    }

    collector.close().await;
    tracing::info!(errors = errors.load(Ordering::Relaxed), "pipeline finished");
    Ok(())
}

async fn run_http(
    args: HttpArgs,
    token: CancellationToken,
    collector: &EventCollector,
) -> Result<()> {
    let config = HttpServerConfig::builder()
        .addr(args.addr)
        .endpoint(args.endpoint)
        .read_timeout(Duration::from_millis(args.read_timeout_ms))
        .write_timeout(Duration::from_millis(args.write_timeout_ms))
        .build();
    let server = HttpServer::new(config);
    tracing::info!(
        addr = server.config().addr(),
        endpoint = server.config().endpoint(),
        "starting http pipeline"
    );

    let pipeline = HttpPipeline::new(server, args.buffer);
    let relay = relay_events(pipeline.run(token.clone()), collector);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    token.cancel();
    relay.await?;
    Ok(())
}

async fn run_relay(
    args: RelayArgs,
    token: CancellationToken,
    collector: &EventCollector,
) -> Result<()> {
    let broker = Arc::new(InMemoryBroker::default());
    let pipeline = RelayPipeline::new(broker.clone(), &args.input, &args.output)?;
    let relay = relay_events(pipeline.run(token.clone()), collector);

    // 订阅在后台任务中建立，稍候再发布
    tokio::time::sleep(Duration::from_millis(100)).await;
    for i in 0..args.messages {
        let line = if i % 4 == 3 {
            String::new()
        } else {
            format!("message {i}")
        };
        broker.publish(&args.input, line.as_bytes()).await?;
    }

    let expected = args.messages - args.messages / 4;
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        while broker.acked_count() < expected {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    if settled.is_err() {
        tracing::warn!(acked = broker.acked_count(), expected, "relay did not settle in time");
    }

    token.cancel();
    relay.await?;

    for payload in broker.published(&args.output) {
        let text = String::from_utf8_lossy(&payload);
        tracing::info!(subject = %args.output, payload = %text, "relayed");
    }
    Ok(())
}
