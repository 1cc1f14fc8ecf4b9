//! Cursor web client.
//!
//! Two endpoints, both authenticated only by the user's session cookie:
//!
//! - `GET /api/usage?user=<id>` - JSON counters
//! - `GET /settings` - HTML page scraped as a fallback

use std::sync::Arc;
use std::time::Duration;

use cursorbar_core::Credentials;
use cursorbar_fetch::host::http::header_value;
use cursorbar_fetch::{FetchContext, FetchError, FetchSettings, HttpClient, TextResponse};
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::parser::{CursorUsageResponse, ScrapedUsage, parse_usage_json, scrape_settings_page};

// ============================================================================
// Constants
// ============================================================================

/// Usage API path.
pub const USAGE_PATH: &str = "/api/usage";

/// Settings page path.
pub const SETTINGS_PATH: &str = "/settings";

/// User agent for API requests.
const API_USER_AGENT: &str = concat!("CursorBar/", env!("CARGO_PKG_VERSION"));

/// The settings page is rendered for browsers only.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// ============================================================================
// Web Client
// ============================================================================

/// Cursor web client.
#[derive(Debug, Clone)]
pub struct CursorWebClient {
    http: Arc<HttpClient>,
    settings: FetchSettings,
}

impl CursorWebClient {
    /// Creates a client from explicit parts.
    pub fn new(http: Arc<HttpClient>, settings: FetchSettings) -> Self {
        Self { http, settings }
    }

    /// Creates a client sharing a fetch context's HTTP client and settings.
    pub fn from_context(ctx: &FetchContext) -> Self {
        Self::new(Arc::clone(&ctx.http), ctx.settings.clone())
    }

    /// Builds the usage URL for a user.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the configured base is invalid.
    pub fn usage_url(&self, user_id: &str) -> Result<Url, FetchError> {
        let mut url = self.settings.endpoint(USAGE_PATH)?;
        url.query_pairs_mut().append_pair("user", user_id);
        Ok(url)
    }

    /// Fetches and parses the JSON usage endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Timeout`, `Transport`, `UnexpectedStatus` or `Parse`.
    #[instrument(skip(self, credentials), fields(user_id = %credentials.user_id()))]
    pub async fn fetch_usage(
        &self,
        credentials: &Credentials,
    ) -> Result<CursorUsageResponse, FetchError> {
        let url = self.usage_url(credentials.user_id())?;
        let headers = request_headers(
            credentials,
            API_USER_AGENT,
            HeaderValue::from_static("application/json"),
        )?;

        let response = self.get(&url, headers, self.settings.api_timeout).await?;
        parse_usage_json(&response.body)
    }

    /// Fetches the settings page and runs the usage extractions over it.
    ///
    /// # Errors
    ///
    /// Returns `Timeout`, `Transport`, `UnexpectedStatus` or
    /// `NoUsageDataFound`.
    #[instrument(skip(self, credentials))]
    pub async fn fetch_settings_page(
        &self,
        credentials: &Credentials,
    ) -> Result<ScrapedUsage, FetchError> {
        let url = self.settings.endpoint(SETTINGS_PATH)?;
        let headers = request_headers(
            credentials,
            BROWSER_USER_AGENT,
            HeaderValue::from_static("text/html"),
        )?;

        let response = self.get(&url, headers, self.settings.web_timeout).await?;
        scrape_settings_page(&response.body)
    }

    async fn get(
        &self,
        url: &Url,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<TextResponse, FetchError> {
        info!(url = %url, "Requesting Cursor endpoint");

        let response = self.http.get_text(url, headers, timeout).await?;
        debug!(
            status = response.status,
            body_len = response.body.len(),
            "Cursor endpoint responded"
        );

        if !response.is_ok() {
            warn!(status = response.status, url = %url, "Unexpected status");
            return Err(FetchError::UnexpectedStatus {
                status: response.status,
                url: response.url,
            });
        }

        Ok(response)
    }
}

fn request_headers(
    credentials: &Credentials,
    user_agent: &'static str,
    accept: HeaderValue,
) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, header_value("cookie", credentials.cookie())?);
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(ACCEPT, accept);
    Ok(headers)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CursorWebClient {
        CursorWebClient::new(Arc::new(HttpClient::new()), FetchSettings::default())
    }

    #[test]
    fn test_usage_url_encodes_user() {
        let url = client().usage_url("user_01ABC").unwrap();
        assert_eq!(url.as_str(), "https://www.cursor.com/api/usage?user=user_01ABC");

        let odd = client().usage_url("user x&y").unwrap();
        assert_eq!(odd.query(), Some("user=user+x%26y"));
    }

    #[test]
    fn test_request_headers() {
        let creds = Credentials::new("user_1", "WorkosCursorSessionToken=abc");
        let headers =
            request_headers(&creds, API_USER_AGENT, HeaderValue::from_static("application/json"))
                .unwrap();
        assert_eq!(headers[COOKIE], "WorkosCursorSessionToken=abc");
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("CursorBar/"));
    }

    #[test]
    fn test_request_headers_reject_bad_cookie() {
        let creds = Credentials::new("user_1", "a=b\r\nX-Evil: 1");
        let err = request_headers(&creds, API_USER_AGENT, HeaderValue::from_static("text/html"))
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader(_)));
    }
}
