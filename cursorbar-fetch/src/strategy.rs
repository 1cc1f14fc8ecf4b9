//! The seam between the pipeline and a concrete way of getting usage.
//!
//! Two mechanisms exist: the JSON usage endpoint and the HTML settings
//! page. Each is wrapped in a [`FetchStrategy`].

use async_trait::async_trait;
use cursorbar_core::{FetchSource, UsageRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::FetchContext;
use crate::error::FetchError;

/// Mechanism a strategy uses to reach Cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// `GET /api/usage`
    Api,
    /// `GET /settings`, scraped
    WebDashboard,
}

impl FetchKind {
    /// Short label for logs and CLI output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::WebDashboard => "Web Dashboard",
        }
    }

    /// The source a record fetched this way is tagged with.
    pub fn to_fetch_source(&self) -> FetchSource {
        match self {
            Self::Api => FetchSource::Api,
            Self::WebDashboard => FetchSource::Web,
        }
    }

    /// Position in the fallback order, larger runs earlier.
    fn default_priority(self) -> u32 {
        match self {
            Self::Api => 100,
            Self::WebDashboard => 40,
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A record plus which strategy produced it.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Normalized usage.
    pub record: UsageRecord,
    /// Id of the producing strategy, e.g. `cursor.api`.
    pub strategy_id: String,
    /// Mechanism that produced it.
    pub kind: FetchKind,
}

impl FetchResult {
    /// Wraps a record.
    pub fn new(record: UsageRecord, strategy_id: impl Into<String>, kind: FetchKind) -> Self {
        Self {
            record,
            strategy_id: strategy_id.into(),
            kind,
        }
    }
}

/// One way of fetching usage.
///
/// Ids follow `{provider}.{method}`. `is_available` must not touch the
/// network; the pipeline calls it to decide whether `fetch` runs at all.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Stable identifier.
    fn id(&self) -> &str;

    /// Mechanism used.
    fn kind(&self) -> FetchKind;

    /// Offline readiness check.
    async fn is_available(&self, ctx: &FetchContext) -> bool;

    /// Performs the request and normalizes the response.
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError>;

    /// Whether the pipeline may move on to the next strategy after `error`.
    ///
    /// Missing credentials would fail every strategy identically, so they
    /// stop the run.
    fn should_fallback(&self, error: &FetchError) -> bool {
        !error.is_missing_credentials()
    }

    /// Larger runs earlier. Defaults to 100 for the API, 40 for the page.
    fn priority(&self) -> u32 {
        self.kind().default_priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(FetchKind::Api.to_string(), "API");
        assert_eq!(FetchKind::WebDashboard.to_string(), "Web Dashboard");
    }

    #[test]
    fn test_kind_maps_to_source() {
        assert_eq!(FetchKind::Api.to_fetch_source(), FetchSource::Api);
        assert_eq!(FetchKind::WebDashboard.to_fetch_source(), FetchSource::Web);
    }

    #[test]
    fn test_api_outranks_page() {
        assert!(FetchKind::Api.default_priority() > FetchKind::WebDashboard.default_priority());
    }
}
