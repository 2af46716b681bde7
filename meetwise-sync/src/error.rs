//! Error types for meetwise-sync

use thiserror::Error;

use crate::session::SessionState;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failures of backend calls and session operations
///
/// Backend failures are classified by HTTP status so callers can tell an
/// idempotent "already gone" apart from real errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Session not connected or not yet hydrated
    #[error("Action items storage is not ready. Please wait for initial load.")]
    NotReady,

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 403
    #[error("{0}")]
    Forbidden(String),

    /// 400, or rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    /// 409
    #[error("{0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Transport failure or unreadable response body
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

impl SyncError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            400 | 422 => SyncError::Validation(message),
            401 => SyncError::Unauthorized(message),
            403 => SyncError::Forbidden(message),
            404 => SyncError::NotFound(message),
            409 => SyncError::Conflict(message),
            _ => SyncError::Server { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}

impl From<meetwise_common::Error> for SyncError {
    fn from(err: meetwise_common::Error) -> Self {
        match err {
            meetwise_common::Error::InvalidInput(msg) => SyncError::Validation(msg),
            meetwise_common::Error::NotFound(msg) => SyncError::NotFound(msg),
            other => SyncError::Network(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network(err.to_string())
    }
}

/// Best-effort message from an error body
///
/// Understands `{"error": {"message": ..}}`, `{"message": ..}` and plain text.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(json) => json
            .pointer("/error/message")
            .or_else(|| json.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}
