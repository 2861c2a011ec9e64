//! HTTP endpoint exposing accumulator metrics and source health.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Errors from the metrics endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The metrics port could not be bound.
    #[error("cannot bind metrics port: {0}")]
    Bind(#[from] std::io::Error),

    /// Serving stopped with an I/O or protocol error.
    #[error("metrics endpoint failed: {0}")]
    Server(String),
}

/// Where the metrics endpoint listens.
///
/// The port usually comes from `[output] metrics_port`.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Listening address, all interfaces by default.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Listens on every interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Registry plus the source count `/health` reports on.
pub struct MetricsState {
    registry: MetricsRegistry,
    registered_sources: usize,
}

impl MetricsState {
    /// Publishes a fresh context snapshot.
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.registered_sources = snapshot.registered_sources;
    }
}

/// Serves `/metrics` in Prometheus text format and `/health`.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<RwLock<MetricsState>>,
}

impl MetricsServer {
    /// Wraps `registry`; `/health` stays 503 until the first update.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                registered_sources: 0,
            })),
        }
    }

    /// Handle the request loop uses to publish snapshots.
    pub fn state(&self) -> Arc<RwLock<MetricsState>> {
        Arc::clone(&self.state)
    }

    /// Binds the port and serves until the runtime shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Entropy metrics endpoint listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// `GET /metrics`
async fn metrics_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    let state = state.read().await;

    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("cannot encode entropy metrics: {e}"),
        ),
    }
}

/// `GET /health`, 200 while at least one source is registered.
async fn health_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    if state.read().await.registered_sources > 0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NO SOURCE")
    }
}
