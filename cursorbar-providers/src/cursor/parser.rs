//! Cursor response parsers.
//!
//! The JSON endpoint is undocumented, so every field is optional and numeric
//! fields accept whatever JSON the server sends. The settings page is only
//! matched with text patterns; captures are kept as raw strings and
//! interpreted by the normalizer.

use std::sync::LazyLock;

use cursorbar_fetch::FetchError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from `GET /api/usage?user=<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorUsageResponse {
    /// Premium (rate-limited) model bucket.
    #[serde(rename = "gpt-4", default, deserialize_with = "lenient_model")]
    pub gpt4: Option<ModelUsage>,

    /// Unlimited (slow pool) model bucket.
    #[serde(rename = "gpt-3.5-turbo", default, deserialize_with = "lenient_model")]
    pub gpt35_turbo: Option<ModelUsage>,

    /// Long-context bucket. Informational only.
    #[serde(rename = "gpt-4-32k", default, deserialize_with = "lenient_model")]
    pub gpt4_32k: Option<ModelUsage>,

    /// Start of the current billing period.
    #[serde(rename = "startOfMonth", default, deserialize_with = "lenient_string")]
    pub start_of_month: Option<String>,
}

/// Per-model counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    /// Requests made in the current period.
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_requests: Option<u64>,
    /// Requests made in total.
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_requests_total: Option<u64>,
    /// Tokens consumed.
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_tokens: Option<u64>,
    /// Request cap. Null or absent means no cap.
    #[serde(default, deserialize_with = "lenient_count")]
    pub max_request_usage: Option<u64>,
    /// Token cap.
    #[serde(default, deserialize_with = "lenient_count")]
    pub max_token_usage: Option<u64>,
}

/// Accepts integers, non-negative floats (truncated) and digit strings.
/// Anything else reads as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_model<'de, D>(deserializer: D) -> Result<Option<ModelUsage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Parses the usage endpoint body.
///
/// # Errors
///
/// Returns `FetchError::Parse` if the body is not JSON or is JSON but not an
/// object.
pub fn parse_usage_json(body: &str) -> Result<CursorUsageResponse, FetchError> {
    debug!(len = body.len(), "Parsing Cursor usage response");

    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse Cursor usage JSON");
        FetchError::Parse(format!("Invalid JSON: {e}"))
    })?;

    let Value::Object(map) = value else {
        return Err(FetchError::Parse(format!(
            "Expected a JSON object, got {}",
            json_kind(&value)
        )));
    };

    debug!(
        fields = ?map.keys().collect::<Vec<_>>(),
        "Cursor usage response fields"
    );

    serde_json::from_value(Value::Object(map))
        .map_err(|e| FetchError::Parse(format!("Unexpected usage shape: {e}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Settings Page Scraping
// ============================================================================

/// A `used/total` pair exactly as captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPair {
    /// Captured `used` text.
    pub used: String,
    /// Captured `total` text.
    pub total: String,
}

/// Values captured from the settings page. Each is independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedUsage {
    /// Premium requests `used/total`.
    pub premium: Option<CapturedPair>,
    /// Unlimited requests `used/total`.
    pub unlimited: Option<CapturedPair>,
    /// Reset date text (`YYYY-MM-DD`).
    pub reset_date: Option<String>,
}

impl ScrapedUsage {
    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.premium.is_none() && self.unlimited.is_none() && self.reset_date.is_none()
    }
}

// Counts may carry thousands separators ("1,234"); the separator is kept in
// the capture and dropped during normalization.
static PREMIUM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"Premium模型使用量[：:]\s*(\d{1,3}(?:,\d{3})+|\d+)\s*/\s*(\d{1,3}(?:,\d{3})+|\d+)")
            .expect("Invalid regex"),
        Regex::new(r"(?is)premium\s+(?:models?|requests?)\b.{0,80}?(\d{1,3}(?:,\d{3})+|\d+)\s*/\s*(\d{1,3}(?:,\d{3})+|\d+)")
            .expect("Invalid regex"),
    ]
});

static UNLIMITED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"无限额请求[：:]\s*(\d{1,3}(?:,\d{3})+|\d+)\s*/\s*(\d{1,3}(?:,\d{3})+|\d+)")
            .expect("Invalid regex"),
        Regex::new(r"(?is)unlimited\s+requests?\b.{0,80}?(\d{1,3}(?:,\d{3})+|\d+)\s*/\s*(\d{1,3}(?:,\d{3})+|\d+)")
            .expect("Invalid regex"),
    ]
});

static RESET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"下次重置[：:]\s*(\d{4}-\d{2}-\d{2})").expect("Invalid regex"),
        Regex::new(r"(?is)resets?\s*(?:on|at)?\s*:?\s*(\d{4}-\d{2}-\d{2})")
            .expect("Invalid regex"),
    ]
});

fn capture_pair(patterns: &[Regex], html: &str) -> Option<CapturedPair> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(html)?;
        Some(CapturedPair {
            used: caps.get(1)?.as_str().to_string(),
            total: caps.get(2)?.as_str().to_string(),
        })
    })
}

fn capture_one(patterns: &[Regex], html: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Extracts usage values from the settings page.
///
/// # Errors
///
/// Returns `FetchError::NoUsageDataFound` if none of the three extractions
/// matched. A partial match is not an error.
pub fn scrape_settings_page(html: &str) -> Result<ScrapedUsage, FetchError> {
    debug!(len = html.len(), "Scraping Cursor settings page");

    let scraped = ScrapedUsage {
        premium: capture_pair(&PREMIUM_PATTERNS, html),
        unlimited: capture_pair(&UNLIMITED_PATTERNS, html),
        reset_date: capture_one(&RESET_PATTERNS, html),
    };

    debug!(
        premium = scraped.premium.is_some(),
        unlimited = scraped.unlimited.is_some(),
        reset_date = scraped.reset_date.is_some(),
        "Settings page extraction"
    );

    if scraped.is_empty() {
        warn!("No usage patterns matched in settings page");
        return Err(FetchError::NoUsageDataFound);
    }

    Ok(scraped)
}

// ============================================================================
// Raw Usage
// ============================================================================

/// What a strategy obtained before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawUsage {
    /// Parsed JSON endpoint response.
    Api(CursorUsageResponse),
    /// Captures from the settings page.
    Web(ScrapedUsage),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "gpt-4": {
                "numRequests": 40,
                "numRequestsTotal": 40,
                "numTokens": 123456,
                "maxRequestUsage": 150,
                "maxTokenUsage": null
            },
            "gpt-3.5-turbo": {
                "numRequests": 12,
                "numRequestsTotal": 12,
                "numTokens": 5000,
                "maxRequestUsage": null,
                "maxTokenUsage": null
            },
            "gpt-4-32k": {
                "numRequests": 0,
                "numRequestsTotal": 0,
                "numTokens": 0,
                "maxRequestUsage": 50,
                "maxTokenUsage": null
            },
            "startOfMonth": "2024-03-15T10:00:00.000Z"
        }"#;

        let response = parse_usage_json(json).unwrap();
        let gpt4 = response.gpt4.unwrap();
        assert_eq!(gpt4.num_requests, Some(40));
        assert_eq!(gpt4.max_request_usage, Some(150));
        assert_eq!(gpt4.num_tokens, Some(123_456));

        let turbo = response.gpt35_turbo.unwrap();
        assert_eq!(turbo.num_requests, Some(12));
        assert_eq!(turbo.max_request_usage, None);

        assert_eq!(response.gpt4_32k.unwrap().max_request_usage, Some(50));
        assert_eq!(
            response.start_of_month.as_deref(),
            Some("2024-03-15T10:00:00.000Z")
        );
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(parse_usage_json("[1,2]"), Err(FetchError::Parse(_))));
        assert!(matches!(parse_usage_json("null"), Err(FetchError::Parse(_))));
        assert!(matches!(parse_usage_json("<html>"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_empty_object() {
        let response = parse_usage_json("{}").unwrap();
        assert_eq!(response, CursorUsageResponse::default());
    }

    #[test]
    fn test_scrape_chinese_labels() {
        let html = "<div>Premium模型使用量：45/500</div><div>无限额请求：120/1000</div>\
                    <span>下次重置：2024-04-01</span>";
        let scraped = scrape_settings_page(html).unwrap();
        assert_eq!(
            scraped.premium,
            Some(CapturedPair {
                used: "45".into(),
                total: "500".into()
            })
        );
        assert_eq!(scraped.unlimited.unwrap().total, "1000");
        assert_eq!(scraped.reset_date.as_deref(), Some("2024-04-01"));
    }

    #[test]
    fn test_scrape_english_labels() {
        let html = r#"<p>Premium models</p><span class="n">45 / 500</span>
                      <p>Unlimited requests</p><span>7 / 0</span>
                      <small>Resets on 2024-04-01</small>"#;
        let scraped = scrape_settings_page(html).unwrap();
        assert_eq!(scraped.premium.unwrap().used, "45");
        assert_eq!(scraped.unlimited.unwrap().used, "7");
        assert_eq!(scraped.reset_date.as_deref(), Some("2024-04-01"));
    }

    #[test]
    fn test_scrape_partial_match() {
        let scraped = scrape_settings_page("无限额请求：3/0").unwrap();
        assert!(scraped.premium.is_none());
        assert!(scraped.unlimited.is_some());
        assert!(scraped.reset_date.is_none());
    }

    #[test]
    fn test_scrape_nothing() {
        assert!(matches!(
            scrape_settings_page("<html><body>Sign in</body></html>"),
            Err(FetchError::NoUsageDataFound)
        ));
    }
}
