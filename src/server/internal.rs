//! Internal HTTP server for health, metrics and pool endpoints.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{parse_duration, ConfigInfo};
use crate::health::{HealthChecker, HealthStatus, ProbeType};
use crate::observability::PoolMetrics;
use crate::pool::{Container, ContainerFactory, Pool, PoolStatus};

/// The pool as seen by the internal server.
pub trait PoolHandle: Send + Sync + 'static {
    /// Current pool snapshot.
    fn status(&self) -> PoolStatus;

    /// Take a container out of the pool and hand over its name.
    fn lease(&self, timeout: Option<Duration>) -> Option<String>;
}

impl<F: ContainerFactory> PoolHandle for Pool<F> {
    fn status(&self) -> PoolStatus {
        Pool::status(self)
    }

    fn lease(&self, timeout: Option<Duration>) -> Option<String> {
        self.get(timeout).map(|container| container.name())
    }
}

/// Shared state for request handlers.
pub struct InternalState {
    pub pool: Arc<dyn PoolHandle>,
    pub health: HealthChecker,
    pub metrics: Option<Arc<PoolMetrics>>,
    pub config: ConfigInfo,
}

impl InternalState {
    pub fn new(pool: Arc<dyn PoolHandle>, config: ConfigInfo) -> Self {
        Self {
            pool,
            health: HealthChecker::new(),
            metrics: None,
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PoolMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[derive(Serialize)]
struct HealthSummary {
    status: &'static str,
    timestamp: u64,
    uptime_seconds: u64,
    pool_size: usize,
    pool_capacity: usize,
    workers: usize,
    throttled: bool,
}

#[derive(Serialize)]
struct Lease {
    name: String,
}

/// Run the internal HTTP server until the listener fails.
pub async fn run_internal_server(
    addr: SocketAddr,
    state: Arc<InternalState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "internal server listening");
    serve(listener, state).await
}

/// Accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: Arc<InternalState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let state = Arc::clone(&state);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let s = Arc::clone(&state);
                async move { handle_internal_request(req, s).await }
            });

            let io = TokioIo::new(stream);
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(peer = %peer, error = %e, "internal connection error");
            }
        });
    }
}

/// Handle internal server requests.
pub async fn handle_internal_request<B>(
    req: Request<B>,
    state: Arc<InternalState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(str::to_owned);
    let method = req.method().clone();

    let response = match path.as_str() {
        "/health" => {
            let pool = state.pool.status();
            let summary = HealthSummary {
                status: if pool.running { "ok" } else { "stopped" },
                timestamp: std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
                uptime_seconds: state.health.uptime().as_secs(),
                pool_size: pool.size,
                pool_capacity: pool.capacity,
                workers: pool.workers,
                throttled: pool.throttled,
            };
            json_response(StatusCode::OK, &summary)
        }
        "/health/live" => probe_response(&state, ProbeType::Liveness),
        "/health/ready" => probe_response(&state, ProbeType::Readiness),
        "/health/startup" => probe_response(&state, ProbeType::Startup),
        "/status" => json_response(StatusCode::OK, &state.pool.status()),
        "/config" => json_response(StatusCode::OK, &state.config),
        "/metrics" => {
            let body = state
                .metrics
                .as_ref()
                .map(|m| m.export())
                .unwrap_or_default();
            text_response(StatusCode::OK, "text/plain; version=0.0.4", body)
        }
        "/lease" if method != Method::POST => text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "text/plain",
            "Method Not Allowed".into(),
        ),
        "/lease" => match lease_timeout(query.as_deref()) {
            Ok(timeout) => lease(&state, timeout).await,
            Err(message) => text_response(StatusCode::BAD_REQUEST, "text/plain", message),
        },
        _ => text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found".into()),
    };

    Ok(response)
}

/// Parse `timeout=<duration>` from the query; absent means non-blocking.
fn lease_timeout(query: Option<&str>) -> Result<Duration, String> {
    let value = query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("timeout="));

    match value {
        None => Ok(Duration::ZERO),
        Some(v) => parse_duration(v)
            .map(Option::unwrap_or_default)
            .map_err(|e| format!("bad timeout: {}", e)),
    }
}

async fn lease(state: &Arc<InternalState>, timeout: Duration) -> Response<Full<Bytes>> {
    let pool = Arc::clone(&state.pool);
    let leased = tokio::task::spawn_blocking(move || pool.lease(Some(timeout))).await;

    match leased {
        Ok(Some(name)) => {
            info!(container = %name, "container leased");
            json_response(StatusCode::OK, &Lease { name })
        }
        Ok(None) => text_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "text/plain",
            "No container available".into(),
        ),
        Err(e) => {
            warn!(error = %e, "lease task failed");
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "Internal Server Error".into(),
            )
        }
    }
}

fn probe_response(state: &InternalState, probe: ProbeType) -> Response<Full<Bytes>> {
    let status: HealthStatus = state.health.check(probe, &state.pool.status());
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(code, &status)
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    text_response(status, "application/json", body)
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(content_type),
    );
    response
}
