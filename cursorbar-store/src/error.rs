//! Errors raised while loading, validating or saving settings.

use thiserror::Error;

/// Settings store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the settings file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for [`crate::Settings`].
    #[error("Invalid settings JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A setting holds a value that cannot be used.
    #[error("Invalid setting: {0}")]
    Config(String),

    /// Check interval below the allowed minimum.
    #[error("Check interval must be at least {min} seconds (got {secs})")]
    IntervalTooShort {
        /// Requested interval.
        secs: u64,
        /// Smallest accepted interval.
        min: u64,
    },
}

impl StoreError {
    /// True when the settings file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
