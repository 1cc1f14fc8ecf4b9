//! Output formatting for CLI.
//!
//! Every renderer is a pure function of a [`UsageRecord`] or an error
//! message.

mod html;
mod json;
mod status;
mod text;

pub use html::HtmlRenderer;
pub use json::JsonFormatter;
pub use status::StatusLine;
pub use text::TextFormatter;

use chrono::{DateTime, Local, Utc};
use cursorbar_core::{UsageBucket, UsageRecord};

/// Symbol shown in place of a missing cap.
pub const INFINITY: &str = "∞";

/// Formats a percentage with at most two decimals and no trailing zeros.
pub fn format_percent(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}%")
}

/// `used/total (pct)`, or `used/∞` for an uncapped bucket.
pub fn format_bucket(bucket: &UsageBucket) -> String {
    if bucket.is_unbounded() {
        format!("{}/{INFINITY}", bucket.used())
    } else {
        format!(
            "{}/{} ({})",
            bucket.used(),
            bucket.total(),
            format_percent(bucket.percentage())
        )
    }
}

/// Local wall-clock rendering of a timestamp.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Reset date with a relative hint such as `(in 5 days)`.
pub fn format_reset(record: &UsageRecord, today: chrono::NaiveDate) -> String {
    let date = record.reset_date();
    let days = (date - today).num_days();
    let relative = match days {
        d if d < 0 => "overdue".to_string(),
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d => format!("in {d} days"),
    };
    format!("{} ({relative})", date.format("%Y-%m-%d"))
}
