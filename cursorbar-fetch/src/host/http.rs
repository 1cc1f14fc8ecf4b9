//! HTTP client with tracing, per-request timeouts and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing (status and body length, never the cookie)
//! - Domain allowlist for security
//! - Per-request timeouts mapped to a distinct error

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for `CursorBar`.
const USER_AGENT: &str = concat!("CursorBar/", env!("CARGO_PKG_VERSION"));

/// Maximum characters of a body included in debug logs.
const BODY_PREVIEW_CHARS: usize = 200;

// ============================================================================
// Text Response
// ============================================================================

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TextResponse {
    /// The requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl TextResponse {
    /// Returns true for HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns the start of the body, cut on a character boundary.
    pub fn preview(&self) -> &str {
        body_preview(&self.body, BODY_PREVIEW_CHARS)
    }
}

/// Returns at most `max_chars` characters from the start of `body`.
pub fn body_preview(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Converts a string into a header value.
///
/// # Errors
///
/// Returns `HttpError::InvalidHeader` if the value contains characters not
/// allowed in HTTP headers. The value itself is not echoed back.
pub fn header_value(name: &str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value)
        .map_err(|_| HttpError::InvalidHeader(format!("{name} contains invalid characters")))
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom overall timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This only happens when the
    /// TLS backend cannot be initialised at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::try_with_timeout(timeout).unwrap_or_else(|e| {
            panic!(
                "Failed to create HTTP client: {e}. \
                This usually indicates a broken TLS configuration."
            )
        })
    }

    /// Creates a new HTTP client, returning an error instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Request` if the underlying client cannot be built.
    pub fn try_with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            allowed_domains: None,
        })
    }

    /// Restricts this client to the given domains and their subdomains.
    #[must_use]
    pub fn allow_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Returns the allowlist, if any.
    pub fn allowed_domains(&self) -> Option<&[String]> {
        self.allowed_domains.as_deref()
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &Url) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request and reads the whole body as text.
    ///
    /// `timeout` covers connecting, sending and reading the body. Non-200
    /// statuses are not errors here; callers decide.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Timeout` when `timeout` elapses,
    /// `HttpError::DomainNotAllowed` for hosts outside the allowlist and
    /// `HttpError::Request` for any other transport failure.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_text(
        &self,
        url: &Url,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<TextResponse, HttpError> {
        self.is_domain_allowed(url)?;
        debug!(timeout = ?timeout, "GET request");

        let response = self
            .inner
            .get(url.clone())
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_request_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(e, timeout))?;

        let response = TextResponse {
            url: url.to_string(),
            status,
            body,
        };
        debug!(
            status,
            body_len = response.body.len(),
            preview = %response.preview(),
            "Response received"
        );
        trace!(body = %response.body, "Response body");

        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_request_error(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout {
            secs: timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0),
        }
    } else {
        HttpError::Request(err)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new().allow_domains(vec!["cursor.com".to_string()]);

        assert!(client.is_domain_allowed(&url("https://cursor.com/api/usage")).is_ok());
        assert!(client.is_domain_allowed(&url("https://www.cursor.com/settings")).is_ok());

        assert!(matches!(
            client.is_domain_allowed(&url("https://evil.com/steal")),
            Err(HttpError::DomainNotAllowed(host)) if host == "evil.com"
        ));
        assert!(client.is_domain_allowed(&url("https://notcursor.com")).is_err());
    }

    #[test]
    fn test_no_domain_restrictions() {
        let client = HttpClient::new();
        assert!(client.allowed_domains().is_none());
        assert!(client.is_domain_allowed(&url("https://any.domain.com")).is_ok());
    }

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        assert_eq!(body_preview("无限额请求", 2), "无限");
        assert_eq!(body_preview("short", 200), "short");
    }

    #[test]
    fn test_response_preview_is_truncated() {
        let response = TextResponse {
            url: "https://cursor.com/settings".to_string(),
            status: 200,
            body: "x".repeat(BODY_PREVIEW_CHARS + 50),
        };
        assert!(response.is_ok());
        assert_eq!(response.preview().len(), BODY_PREVIEW_CHARS);
    }

    #[test]
    fn test_header_value_rejects_newlines() {
        assert!(header_value("cookie", "a=b").is_ok());
        let err = header_value("cookie", "a=b\nInjected: 1").unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader(_)));
        assert!(!err.to_string().contains("Injected"));
    }

    #[tokio::test]
    async fn test_disallowed_domain_makes_no_request() {
        let client = HttpClient::new().allow_domains(vec!["cursor.com".to_string()]);
        let result = client
            .get_text(
                &url("http://127.0.0.1:9/api"),
                HeaderMap::new(),
                Duration::from_millis(50),
            )
            .await;
        assert!(matches!(result, Err(HttpError::DomainNotAllowed(_))));
    }
}
