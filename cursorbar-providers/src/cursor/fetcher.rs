//! Main Cursor usage fetcher.
//!
//! Orchestrates the two strategies with automatic fallback:
//!
//! 1. **API** (priority 100): `GET /api/usage?user=<id>`
//! 2. **Web** (priority 40): scrape `GET /settings`
//!
//! # Example
//!
//! ```ignore
//! let fetcher = CursorUsageFetcher::new();
//! let record = fetcher.fetch_usage(&credentials).await?;
//! ```

use std::sync::Arc;

use cursorbar_core::{Credentials, UsageRecord, UsageSource};
use cursorbar_fetch::{
    FetchContext, FetchError, FetchOutcome, FetchPipeline, FetchSettings, HttpClient,
};
use tracing::{info, instrument, warn};

use super::strategies::{CursorApiStrategy, CursorWebStrategy};

/// Main Cursor usage fetcher.
#[derive(Debug, Clone)]
pub struct CursorUsageFetcher {
    http: Arc<HttpClient>,
    settings: FetchSettings,
}

impl CursorUsageFetcher {
    /// Creates a fetcher for the production endpoints.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a fetcher with custom settings.
    ///
    /// The HTTP client is restricted to the base URL's host.
    pub fn with_settings(settings: FetchSettings) -> Self {
        let mut http = HttpClient::new();
        if let Some(host) = settings.base_host() {
            http = http.allow_domains(vec![host]);
        }
        Self {
            http: Arc::new(http),
            settings,
        }
    }

    /// Replaces the HTTP client.
    #[must_use]
    pub fn with_http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = http;
        self
    }

    /// Returns the fetch settings.
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Builds the strategy pipeline.
    pub fn pipeline() -> FetchPipeline {
        FetchPipeline::with_strategies(vec![
            Box::new(CursorApiStrategy::new()),
            Box::new(CursorWebStrategy::new()),
        ])
    }

    fn context(&self, credentials: &Credentials) -> FetchContext {
        FetchContext::builder()
            .credentials(credentials.clone())
            .http(Arc::clone(&self.http))
            .settings(self.settings.clone())
            .build()
    }

    /// Runs the pipeline and returns every attempt along with the result.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingCredentials` without touching the network
    /// if the user id or cookie is empty.
    #[instrument(skip(self, credentials))]
    pub async fn fetch_outcome(
        &self,
        credentials: &Credentials,
    ) -> Result<FetchOutcome, FetchError> {
        credentials.require_complete()?;

        if !credentials.has_expected_user_prefix() {
            warn!(
                user_id = %credentials.user_id(),
                "User id does not start with \"user_\"; the request may be rejected"
            );
        }

        let ctx = self.context(credentials);
        Ok(Self::pipeline().execute(&ctx).await)
    }

    /// Fetches a usage record.
    ///
    /// # Errors
    ///
    /// - `MissingCredentials` if the user id or cookie is empty
    /// - `AllStrategiesFailed` carrying the API failure first and the
    ///   scrape failure second
    #[instrument(skip(self, credentials))]
    pub async fn fetch_usage(&self, credentials: &Credentials) -> Result<UsageRecord, FetchError> {
        let outcome = self.fetch_outcome(credentials).await?;
        let result = outcome.result?;

        info!(
            strategy = %result.strategy_id,
            attempts = outcome.attempts.len(),
            premium_pct = result.record.premium().percentage(),
            "Fetched Cursor usage"
        );

        Ok(result.record)
    }
}

impl Default for CursorUsageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for CursorUsageFetcher {
    type Error = FetchError;

    async fn acquire(&self, credentials: &Credentials) -> Result<UsageRecord, FetchError> {
        self.fetch_usage(credentials).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let pipeline = CursorUsageFetcher::pipeline();
        assert_eq!(pipeline.strategy_ids(), vec!["cursor.api", "cursor.web"]);
    }

    #[test]
    fn test_default_allowlist() {
        let fetcher = CursorUsageFetcher::new();
        assert_eq!(
            fetcher.http.allowed_domains(),
            Some(&["www.cursor.com".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let fetcher = CursorUsageFetcher::new();
        let err = fetcher
            .fetch_usage(&Credentials::new("  ", "cookie=1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingCredentials("userId")));
    }
}
