//! Store error types.

use ogsession_core::SessionError;
use thiserror::Error;

/// Errors from loading or saving configuration and tokens.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration is incomplete or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A secret was expected in an environment variable.
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

impl StoreError {
    /// Returns true if the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Config(err.to_string())
    }
}
