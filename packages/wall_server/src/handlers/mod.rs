pub mod health;
pub mod incidents;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use incident_directory::{DirectoryError, ErrorResponse};
use tracing::warn;

use crate::metrics::ServerMetrics;

// Re-export all handlers for easy route registration
pub use health::{health_handler, health_live_handler, metrics_handler};
pub use incidents::{
    get_incident, list_incidents, random_incident, search_incidents, sitemap_handler,
    stats_handler,
};

/// A failed directory operation, rendered as `{error, message}` JSON.
///
/// Malformed criteria are the caller's fault (400); every fetch failure is
/// reported as a bad gateway (502).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Classifies `err` and counts it.
    pub fn from_directory(metrics: &ServerMetrics, err: DirectoryError) -> Self {
        let status = if err.is_validation() {
            metrics.validation_error();
            StatusCode::BAD_REQUEST
        } else {
            metrics.remote_error();
            warn!(error = %err, code = err.error_code(), "remote fetch failed");
            StatusCode::BAD_GATEWAY
        };
        Self {
            status,
            body: ErrorResponse::from(&err),
        }
    }

    pub fn not_found(metrics: &ServerMetrics, message: String) -> Self {
        metrics.not_found();
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: "not_found".to_string(),
                message,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
