//! HTTP error types.

use ogsession_core::SessionError;
use thiserror::Error;

/// Error type for rate-limited client operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Body could not be decompressed.
    #[error("Failed to decode body: {0}")]
    Decode(#[from] std::io::Error),

    /// Body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller cancelled while waiting on the limiter or the network.
    #[error("Request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Returns true if the underlying error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

impl From<HttpError> for SessionError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => SessionError::Cancelled,
            HttpError::Json(e) => SessionError::InvalidResponse(e.to_string()),
            other => SessionError::Transport(other.to_string()),
        }
    }
}
