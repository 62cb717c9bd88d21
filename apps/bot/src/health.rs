//! Liveness endpoint: `GET /` reports uptime and which integrations are configured.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::net::TcpListener;

/// Which integrations were initialized at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ServiceStatus {
    pub telegram: bool,
    pub analysis: bool,
    pub catalog: bool,
}

pub(crate) struct HealthState {
    started: Instant,
    services: ServiceStatus,
}

impl HealthState {
    pub(crate) fn new(services: ServiceStatus) -> Self {
        Self {
            started: Instant::now(),
            services,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    /// Seconds since startup.
    uptime: f64,
    timestamp: String,
    services: ServiceStatus,
}

async fn health(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: "AI Catalog Bot",
        uptime: state.started.elapsed().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        services: state.services,
    })
}

pub(crate) fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(health))
        .with_state(Arc::new(state))
}

/// Serve the health endpoint until `shutdown` resolves.
pub(crate) async fn serve(
    listener: TcpListener,
    state: HealthState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
