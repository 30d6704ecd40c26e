use axum::{Json, extract::State, response::IntoResponse};
use std::time::Duration;

use crate::AppState;
use crate::metrics;

/// A remote failure older than this no longer degrades health.
const RECENT_REMOTE_ERROR: Duration = Duration::from_secs(300);

/// Health check endpoint - returns server status
///
/// Reports `degraded` while a remote fetch has failed within the last five minutes.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot();

    let (status, remote) = if state.metrics.remote_failed_within(RECENT_REMOTE_ERROR) {
        ("degraded", "failing")
    } else {
        ("healthy", "reachable")
    };

    Json(metrics::HealthStatus {
        status: status.to_string(),
        remote: remote.to_string(),
        remote_errors_total: snapshot.errors.remote,
        last_remote_error_secs_ago: state.metrics.secs_since_remote_error(),
        uptime_secs: snapshot.uptime_secs,
    })
}

/// Metrics endpoint - returns detailed server metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}
