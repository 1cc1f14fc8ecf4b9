//! Conversion of raw responses into [`UsageRecord`]s.
//!
//! Normalization never fails: anything missing or malformed becomes zero,
//! and an unknown reset date becomes the first day of next month.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use cursorbar_core::{FetchSource, UsageBucket, UsageRecord};
use tracing::debug;

use super::parser::{CapturedPair, CursorUsageResponse, RawUsage, ScrapedUsage};

/// Normalizes a raw response into a usage record stamped with `now`.
pub fn normalize(raw: &RawUsage, now: DateTime<Utc>) -> UsageRecord {
    match raw {
        RawUsage::Api(response) => normalize_api(response, now),
        RawUsage::Web(scraped) => normalize_web(scraped, now),
    }
}

fn normalize_api(response: &CursorUsageResponse, now: DateTime<Utc>) -> UsageRecord {
    let premium = response.gpt4.as_ref().map_or_else(UsageBucket::empty, |m| {
        UsageBucket::new(
            m.num_requests.unwrap_or(0),
            m.max_request_usage.unwrap_or(0),
        )
    });

    // A missing or zero cap on the slow pool means it has no cap.
    let unlimited = response.gpt35_turbo.as_ref().map_or_else(UsageBucket::empty, |m| {
        UsageBucket::new(
            m.num_requests.unwrap_or(0),
            m.max_request_usage.filter(|&cap| cap > 0).unwrap_or(0),
        )
    });

    let reset_date = response
        .start_of_month
        .as_deref()
        .and_then(reset_date_from_period_start)
        .unwrap_or_else(|| default_reset_date(now));

    debug!(
        premium_used = premium.used(),
        premium_total = premium.total(),
        unlimited_used = unlimited.used(),
        unlimited_capped = !unlimited.is_unbounded(),
        %reset_date,
        "Normalized API usage"
    );

    UsageRecord::new(premium, unlimited, reset_date, now, FetchSource::Api)
}

fn normalize_web(scraped: &ScrapedUsage, now: DateTime<Utc>) -> UsageRecord {
    let premium = bucket_from_capture(scraped.premium.as_ref());
    let unlimited = bucket_from_capture(scraped.unlimited.as_ref());

    let reset_date = scraped
        .reset_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| default_reset_date(now));

    debug!(
        premium_used = premium.used(),
        premium_total = premium.total(),
        unlimited_used = unlimited.used(),
        unlimited_total = unlimited.total(),
        %reset_date,
        "Normalized scraped usage"
    );

    UsageRecord::new(premium, unlimited, reset_date, now, FetchSource::Web)
}

fn bucket_from_capture(pair: Option<&CapturedPair>) -> UsageBucket {
    pair.map_or_else(UsageBucket::empty, |p| {
        UsageBucket::new(parse_count(&p.used), parse_count(&p.total))
    })
}

fn parse_count(text: &str) -> u64 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Computes the reset date from the start of the billing period.
///
/// Accepts an RFC 3339 timestamp (taken in UTC), a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp, or a bare `YYYY-MM-DD` date. The
/// result is exactly one calendar month later, clamped to the last day of
/// the target month (Jan 31 resets on Feb 28/29).
pub fn reset_date_from_period_start(start: &str) -> Option<NaiveDate> {
    let start = start.trim();

    let date = DateTime::parse_from_rfc3339(start)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(start, "%Y-%m-%d"))
        .ok()?;

    date.checked_add_months(Months::new(1))
}

/// First day of the calendar month after `now` (UTC).
pub fn default_reset_date(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}

// ============================================================================
// Tests
// ============================================================================
