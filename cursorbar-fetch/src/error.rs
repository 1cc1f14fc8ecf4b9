//! Fetch error types.

use std::fmt;

use cursorbar_core::CoreError;
use thiserror::Error;

use crate::strategy::FetchKind;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// User id or session cookie is not configured. No request was made.
    #[error("Missing credentials: {0} is not configured")]
    MissingCredentials(&'static str),

    /// Request timed out.
    #[error("Request timed out after {secs} seconds")]
    Timeout {
        /// The timeout that elapsed.
        secs: u64,
    },

    /// Connection or protocol failure.
    #[error("HTTP error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with something other than 200.
    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL (never includes the cookie).
        url: String,
    },

    /// The body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The settings page loaded but none of the usage patterns matched.
    #[error("No usage data found in settings page")]
    NoUsageDataFound,

    /// A header value could not be encoded.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Strategy not available.
    #[error("Strategy not available: {0}")]
    StrategyNotAvailable(String),

    /// Every strategy failed. Failures are listed in the order they ran.
    #[error("All strategies failed: {}", FailureList(.failures))]
    AllStrategiesFailed {
        /// One entry per strategy attempted.
        failures: Vec<StrategyFailure>,
    },
}

impl FetchError {
    /// Returns the per-strategy failures of a composite error.
    pub fn failures(&self) -> &[StrategyFailure] {
        match self {
            Self::AllStrategiesFailed { failures } => failures,
            _ => &[],
        }
    }

    /// Returns the error a given strategy failed with, if this is a
    /// composite error that includes it.
    pub fn failure_for(&self, strategy_id: &str) -> Option<&FetchError> {
        self.failures()
            .iter()
            .find(|f| f.strategy_id == strategy_id)
            .map(|f| f.error.as_ref())
    }

    /// Returns true if credentials were missing.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingCredentials(_))
    }

    /// Returns true if the scrape found nothing, directly or inside a
    /// composite error.
    pub fn is_no_usage_data(&self) -> bool {
        match self {
            Self::NoUsageDataFound => true,
            Self::AllStrategiesFailed { failures } => failures
                .iter()
                .any(|f| matches!(*f.error, Self::NoUsageDataFound)),
            _ => false,
        }
    }
}

impl From<CoreError> for FetchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingCredentials(field) => Self::MissingCredentials(field),
            CoreError::InvalidConfig(msg) => Self::InvalidUrl(msg),
            CoreError::InvalidData(msg) => Self::Parse(msg),
            CoreError::Serialization(e) => Self::Parse(e.to_string()),
        }
    }
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Request(e) => Self::Transport(e),
            HttpError::Timeout { secs } => Self::Timeout { secs },
            HttpError::DomainNotAllowed(host) => Self::DomainNotAllowed(host),
            HttpError::InvalidUrl(msg) => Self::InvalidUrl(msg),
            HttpError::InvalidHeader(msg) => Self::InvalidHeader(msg),
        }
    }
}

// ============================================================================
// Strategy Failure
// ============================================================================

/// One strategy's reason for failing.
#[derive(Debug)]
pub struct StrategyFailure {
    /// The strategy ID that failed.
    pub strategy_id: String,
    /// The kind of fetch used.
    pub kind: FetchKind,
    /// Why it failed.
    pub error: Box<FetchError>,
}

impl StrategyFailure {
    /// Creates a failure record.
    pub fn new(strategy_id: impl Into<String>, kind: FetchKind, error: FetchError) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            error: Box::new(error),
        }
    }
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy_id, self.error)
    }
}

struct FailureList<'a>(&'a [StrategyFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Timeout.
    #[error("Request timed out after {secs} seconds")]
    Timeout {
        /// The timeout that elapsed.
        secs: u64,
    },

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Header value could not be encoded.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_keeps_order() {
        let err = FetchError::AllStrategiesFailed {
            failures: vec![
                StrategyFailure::new("cursor.api", FetchKind::Api, FetchError::Timeout { secs: 10 }),
                StrategyFailure::new(
                    "cursor.web",
                    FetchKind::WebDashboard,
                    FetchError::NoUsageDataFound,
                ),
            ],
        };

        let msg = err.to_string();
        let api = msg.find("cursor.api").unwrap();
        let web = msg.find("cursor.web").unwrap();
        assert!(api < web);
        assert!(msg.contains("timed out after 10 seconds"));
        assert!(msg.contains("No usage data found"));
    }

    #[test]
    fn test_failure_lookup() {
        let err = FetchError::AllStrategiesFailed {
            failures: vec![StrategyFailure::new(
                "cursor.web",
                FetchKind::WebDashboard,
                FetchError::NoUsageDataFound,
            )],
        };
        assert!(matches!(
            err.failure_for("cursor.web"),
            Some(FetchError::NoUsageDataFound)
        ));
        assert!(err.failure_for("cursor.api").is_none());
        assert!(err.is_no_usage_data());
        assert!(!err.is_missing_credentials());
    }

    #[test]
    fn test_from_core_error() {
        let err: FetchError = CoreError::MissingCredentials("cookieString").into();
        assert!(err.is_missing_credentials());
        assert!(err.failures().is_empty());
    }

    #[test]
    fn test_from_http_timeout() {
        let err: FetchError = HttpError::Timeout { secs: 15 }.into();
        assert!(matches!(err, FetchError::Timeout { secs: 15 }));
    }
}
