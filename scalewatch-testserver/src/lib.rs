//! Local stand-in for the collaborators the collector and the tester talk to
//! over HTTP: an application health endpoint, the instance metadata service
//! and a load-balancer target.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_ROOT: &str = "/";
pub const PATH_HEALTH: &str = "/health";
pub const PATH_INSTANCE_ID: &str = "/latest/meta-data/instance-id";
pub const PATH_STATUS: &str = "/status/{code}";
pub const PATH_SLOW: &str = "/slow";

pub const INSTANCE_ID: &str = "i-0123456789abcdef0";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    health_checks: Arc<AtomicU64>,
    metadata_lookups: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_health_checks(&self) {
        self.health_checks.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_metadata_lookups(&self) {
        self.metadata_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn health_checks(&self) -> u64 {
        self.health_checks.load(Ordering::Relaxed)
    }

    pub fn metadata_lookups(&self) -> u64 {
        self.metadata_lookups.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    /// Load-balancer style target, `<base>/`.
    pub root: String,
    pub health: String,
    /// Metadata base URL; the instance id lives under it.
    pub metadata: String,
    pub slow: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            root: format!("{base_url}{PATH_ROOT}"),
            health: format!("{base_url}{PATH_HEALTH}"),
            metadata: format!("{base_url}{PATH_INSTANCE_ID}"),
            slow: format!("{base_url}{PATH_SLOW}"),
            base_url,
        }
    }

    /// Endpoint answering every request with `code`.
    pub fn status(&self, code: u16) -> String {
        format!("{}/status/{code}", self.base_url)
    }
}

async fn handle_root(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    "OK"
}

async fn handle_health(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    stats.inc_health_checks();
    "healthy"
}

async fn handle_instance_id(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    stats.inc_metadata_lookups();
    INSTANCE_ID
}

async fn handle_status(
    State(stats): State<TestServerStats>,
    Path(code): Path<u16>,
) -> StatusCode {
    stats.inc_requests_total();
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn handle_slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.inc_requests_total();
    sleep(Duration::from_millis(200)).await;
    "slow"
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_ROOT, get(handle_root))
        .route(PATH_HEALTH, get(handle_health))
        .route(PATH_INSTANCE_ID, get(handle_instance_id))
        .route(PATH_STATUS, get(handle_status))
        .route(PATH_SLOW, get(handle_slow))
        .with_state(stats)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
