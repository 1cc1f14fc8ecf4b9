//! Cursor fetch strategies.

use async_trait::async_trait;
use chrono::Utc;
use cursorbar_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use tracing::{debug, instrument};

use super::normalize::normalize;
use super::parser::RawUsage;
use super::web::CursorWebClient;

// ============================================================================
// API Strategy
// ============================================================================

/// Primary strategy: the JSON usage endpoint.
#[derive(Debug, Default)]
pub struct CursorApiStrategy;

impl CursorApiStrategy {
    /// Creates a new API strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FetchStrategy for CursorApiStrategy {
    fn id(&self) -> &str {
        "cursor.api"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::Api
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.is_complete()
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
        ctx.credentials.require_complete()?;
        debug!("Fetching Cursor usage via JSON endpoint");

        let client = CursorWebClient::from_context(ctx);
        let response = client.fetch_usage(&ctx.credentials).await?;
        let record = normalize(&RawUsage::Api(response), Utc::now());

        Ok(FetchResult::new(record, self.id(), self.kind()))
    }
}

// ============================================================================
// Web Strategy
// ============================================================================

/// Fallback strategy: scraping the settings page.
#[derive(Debug, Default)]
pub struct CursorWebStrategy;

impl CursorWebStrategy {
    /// Creates a new web strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FetchStrategy for CursorWebStrategy {
    fn id(&self) -> &str {
        "cursor.web"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::WebDashboard
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.is_complete()
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
        ctx.credentials.require_complete()?;
        debug!("Fetching Cursor usage via settings page");

        let client = CursorWebClient::from_context(ctx);
        let scraped = client.fetch_settings_page(&ctx.credentials).await?;
        let record = normalize(&RawUsage::Web(scraped), Utc::now());

        Ok(FetchResult::new(record, self.id(), self.kind()))
    }
}

// ============================================================================
// Tests
// ============================================================================
