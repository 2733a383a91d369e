//! HTTP 接入源（HttpServer）
//!
//! 在配置的地址上监听 `POST <endpoint>`，每个非空请求体成为一个 `HttpLog` 条目：
//! - 空请求体返回 400；
//! - 请求体末尾缺少换行时补齐一个 `\n`；
//! - 条目推入输出流后才返回 200 "OK"，下游背压会拖住响应；
//! - 读取请求体超过 `read_timeout` 返回 408，推入输出超过 `write_timeout` 返回 503。
//!
//! 取消令牌触发时优雅关闭服务并关闭输出；监听/服务失败以非临时 `ErrorEvent` 上报。
//!
use crate::error::{AdapterError, AdapterResult};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bon::Builder;
use chrono::{DateTime, Utc};
use conduit_core::event::{ErrorEvent, EventSender, send_event};
use conduit_core::readable::Readable;
use conduit_core::{PipelineResult, Source};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8008";
pub const DEFAULT_ENDPOINT: &str = "/log";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP 接入的一条日志
#[derive(Clone, Debug)]
pub struct HttpLog {
    id: Uuid,
    addr: String,
    payload: Vec<u8>,
    received_at: DateTime<Utc>,
}

impl HttpLog {
    /// 载荷缺失时失败；地址为空时记为 "unknown"
    pub fn new(payload: Option<Vec<u8>>, addr: impl Into<String>) -> AdapterResult<Self> {
        let payload = payload.ok_or(AdapterError::MissingPayload)?;
        Ok(Self::accepted(payload, addr.into()))
    }

    fn accepted(payload: Vec<u8>, addr: String) -> Self {
        let addr = if addr.is_empty() {
            "unknown".to_string()
        } else {
            addr
        };
        Self {
            id: Uuid::new_v4(),
            addr,
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl Readable for HttpLog {
    fn read(&self) -> PipelineResult<Vec<u8>> {
        Ok(self.payload.clone())
    }
}

/// HTTP 源配置
///
/// 空地址、空端点与零超时在构造 `HttpServer` 时回落到默认值。
#[derive(Builder, Clone, Debug)]
pub struct HttpServerConfig {
    #[builder(into, default = DEFAULT_ADDR.to_string())]
    addr: String,
    #[builder(into, default = DEFAULT_ENDPOINT.to_string())]
    endpoint: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    read_timeout: Duration,
    #[builder(default = DEFAULT_TIMEOUT)]
    write_timeout: Duration,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HttpServerConfig {
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    fn normalized(mut self) -> Self {
        if self.addr.trim().is_empty() {
            self.addr = DEFAULT_ADDR.to_string();
        }
        if self.endpoint.trim().is_empty() {
            self.endpoint = DEFAULT_ENDPOINT.to_string();
        } else if !self.endpoint.starts_with('/') {
            self.endpoint = format!("/{}", self.endpoint);
        }
        if self.read_timeout.is_zero() {
            self.read_timeout = DEFAULT_TIMEOUT;
        }
        if self.write_timeout.is_zero() {
            self.write_timeout = DEFAULT_TIMEOUT;
        }
        self
    }
}

/// HTTP 接入源
#[derive(Clone, Debug, Default)]
pub struct HttpServer {
    config: HttpServerConfig,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &HttpServerConfig {
        &self.config
    }

    /// 在已绑定的监听器上提供服务，忽略配置中的地址
    pub fn extract_with_listener(
        &self,
        listener: TcpListener,
        token: CancellationToken,
        events: EventSender,
    ) -> mpsc::Receiver<HttpLog> {
        let (tx, rx) = mpsc::channel(1);
        let router = self.router(tx, events.clone());
        tokio::spawn(serve(listener, router, token, events));
        rx
    }

    fn router(&self, out: mpsc::Sender<HttpLog>, events: EventSender) -> Router {
        let state = IngestState {
            out,
            events,
            read_timeout: self.config.read_timeout,
            write_timeout: self.config.write_timeout,
        };
        Router::new()
            .route(&self.config.endpoint, post(ingest))
            .with_state(state)
    }
}

impl Source<HttpLog> for HttpServer {
    fn extract(&self, token: CancellationToken, events: EventSender) -> mpsc::Receiver<HttpLog> {
        let (tx, rx) = mpsc::channel(1);
        let router = self.router(tx, events.clone());
        let addr = self.config.addr.clone();

        tokio::spawn(async move {
            let listener = tokio::select! {
                _ = token.cancelled() => return,
                bound = TcpListener::bind(&addr) => bound,
            };
            match listener {
                Ok(listener) => serve(listener, router, token, events).await,
                Err(err) => {
                    tracing::error!(%addr, error = %err, "http source failed to bind");
                    send_event(&events, ErrorEvent::new("HTTP source server error", err, false));
                }
            }
        });

        rx
    }
}

async fn serve(
    listener: TcpListener,
    router: Router,
    token: CancellationToken,
    events: EventSender,
) {
    let local = listener.local_addr().ok();
    tracing::info!(addr = ?local, "http source listening");

    let app = router.into_make_service_with_connect_info::<SocketAddr>();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await;

    match served {
        Ok(()) => tracing::info!(addr = ?local, "http source stopped"),
        Err(err) => {
            tracing::error!(addr = ?local, error = %err, "http source server error");
            send_event(&events, ErrorEvent::new("HTTP source server error", err, false));
        }
    }
}

#[derive(Clone)]
struct IngestState {
    out: mpsc::Sender<HttpLog>,
    events: EventSender,
    read_timeout: Duration,
    write_timeout: Duration,
}

async fn ingest(
    State(state): State<IngestState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    body: Body,
) -> Response {
    let mut payload = match timeout(state.read_timeout, to_bytes(body, usize::MAX)).await {
        Ok(Ok(bytes)) => bytes.to_vec(),
        Ok(Err(_)) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
        Err(_) => return (StatusCode::REQUEST_TIMEOUT, "Request Timeout").into_response(),
    };

    if payload.is_empty() {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    }
    if payload.last() != Some(&b'\n') {
        payload.push(b'\n');
    }

    let log = HttpLog::accepted(payload, remote.to_string());
    match timeout(state.write_timeout, state.out.send(log)).await {
        Ok(Ok(())) => (StatusCode::OK, "OK").into_response(),
        Ok(Err(_)) => (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response(),
        Err(_) => {
            send_event(
                &state.events,
                ErrorEvent::new(
                    "failed to write response",
                    AdapterError::Timeout {
                        operation: "push http log downstream",
                    },
                    true,
                ),
            );
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
        }
    }
}
