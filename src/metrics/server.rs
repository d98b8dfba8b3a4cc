//! HTTP endpoint exposing the gate's metrics and session health.
//!
//! `/metrics` serves the Prometheus text format. `/health` reports the
//! latest session snapshot and answers 503 while the camera cannot be used,
//! so a supervisor can tell a gate waiting for a face from one that is blind.

use crate::metrics::MetricsRegistry;
use crate::session::{SessionSnapshot, Status};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that can occur while serving metrics.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be opened.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

#[derive(Clone)]
struct ServerState {
    registry: Arc<MetricsRegistry>,
    session: watch::Receiver<SessionSnapshot>,
}

/// Loopback HTTP server for one gate.
pub struct MetricsServer {
    bind_addr: SocketAddr,
    state: ServerState,
}

impl MetricsServer {
    /// Creates a server on `127.0.0.1:port`.
    ///
    /// `session` is usually [`SessionHandle::subscribe`](crate::session::SessionHandle::subscribe).
    pub fn new(
        port: u16,
        registry: Arc<MetricsRegistry>,
        session: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            bind_addr: (Ipv4Addr::LOCALHOST, port).into(),
            state: ServerState { registry, session },
        }
    }

    /// Address the server listens on.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Serves requests until the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "Metrics server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}"),
        ),
    }
}

async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let snapshot = state.session.borrow().clone();
    session_health(&snapshot)
}

fn session_health(snapshot: &SessionSnapshot) -> (StatusCode, String) {
    let code = match snapshot.status {
        Status::CameraUnavailable | Status::StreamLost => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    let body = format!(
        "phase: {:?}\nstatus: {}\nframes: {}\n",
        snapshot.phase, snapshot.status, snapshot.stats.frames_processed
    );
    (code, body)
}
