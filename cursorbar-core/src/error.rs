//! Core error types for `CursorBar`.

use thiserror::Error;

/// Core error type for `CursorBar` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User id or session cookie is not configured.
    #[error("Missing credentials: {0} is not configured")]
    MissingCredentials(&'static str),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data in a usage record.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
