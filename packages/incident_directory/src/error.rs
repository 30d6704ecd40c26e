//! Error types and stable error codes for directory operations.

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The year facet was not a four-digit integer. Raised before any remote call.
    #[error("invalid year {0:?}: expected a four-digit year")]
    InvalidYear(String),

    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed remote response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure reported by a non-HTTP collection (in-memory fixtures, adapters).
    #[error("remote collection error: {0}")]
    Remote(String),
}

impl DirectoryError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidYear(_) => "invalid_year",
            Self::Transport(_) => "transport_failed",
            Self::Status { .. } => "remote_status",
            Self::Decode(_) => "malformed_response",
            Self::Remote(_) => "remote_failed",
        }
    }

    /// Validation failures are the caller's fault; everything else is a fetch failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidYear(_))
    }
}

/// Serializable error body for HTTP callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&DirectoryError> for ErrorResponse {
    fn from(err: &DirectoryError) -> Self {
        Self {
            error: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}
