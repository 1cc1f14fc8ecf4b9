//! Fetch context passed to every strategy.
//!
//! Bundles the user's credentials, the HTTP client and the endpoint
//! settings so strategies never reach for global state.

use std::sync::Arc;
use std::time::Duration;

use cursorbar_core::Credentials;
use url::Url;

use crate::error::FetchError;
use crate::host::http::HttpClient;

/// Production endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://www.cursor.com";

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Endpoint base, e.g. `https://www.cursor.com`.
    pub base_url: String,
    /// Timeout for the JSON usage endpoint.
    pub api_timeout: Duration,
    /// Timeout for the HTML settings page.
    pub web_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(10),
            web_timeout: Duration::from_secs(15),
        }
    }
}

impl FetchSettings {
    /// Overrides the endpoint base.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, api: Duration, web: Duration) -> Self {
        self.api_timeout = api;
        self.web_timeout = web;
        self
    }

    /// Resolves `path` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base is not an absolute
    /// http(s) URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "{}: unsupported scheme",
                self.base_url
            )));
        }
        base.join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Returns the host of the base URL, used to seed the domain allowlist.
    pub fn base_host(&self) -> Option<String> {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to fetch strategies.
pub struct FetchContext {
    /// Who to fetch usage for.
    pub credentials: Credentials,
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context with default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self::builder().credentials(credentials).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("credentials", &self.credentials)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Default)]
pub struct FetchContextBuilder {
    credentials: Credentials,
    http: Option<Arc<HttpClient>>,
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the HTTP client.
    #[must_use]
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the fetch settings.
    #[must_use]
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the endpoint base.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        FetchContext {
            credentials: self.credentials,
            http: self.http.unwrap_or_else(|| Arc::new(HttpClient::new())),
            settings: self.settings,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
