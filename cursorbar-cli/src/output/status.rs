//! Status line and tooltip.

use chrono::Local;
use cursorbar_core::{UsageRecord, UsageRenderer};

use super::{INFINITY, format_bucket, format_reset, format_timestamp};

const ICON_OK: &str = "✓";
const ICON_NOTICE: &str = "ℹ";
const ICON_WARNING: &str = "⚠";
const ICON_ERROR: &str = "✗";
const ICON_LOADING: &str = "⟳";

/// Compact one-line summary, as a status bar item would show it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusLine;

impl StatusLine {
    /// Icon for a premium usage percentage: above 90 warns, above 75 notes.
    pub fn icon(percentage: f64) -> &'static str {
        if percentage > 90.0 {
            ICON_WARNING
        } else if percentage > 75.0 {
            ICON_NOTICE
        } else {
            ICON_OK
        }
    }

    /// Line shown while the first acquisition is in flight.
    pub fn loading() -> String {
        format!("{ICON_LOADING} Cursor: loading…")
    }

    /// Multi-line hover text for a record.
    pub fn tooltip(record: &UsageRecord) -> String {
        [
            "Cursor usage".to_string(),
            format!("Premium:      {}", format_bucket(record.premium())),
            format!("Unlimited:    {}", format_bucket(record.unlimited())),
            format!("Resets:       {}", format_reset(record, Local::now().date_naive())),
            format!("Last updated: {}", format_timestamp(record.last_updated())),
        ]
        .join("\n")
    }

    /// Hover text for a failed acquisition.
    pub fn error_tooltip(message: &str) -> String {
        format!("Cursor usage unavailable\n{message}")
    }
}

impl UsageRenderer for StatusLine {
    fn render(&self, record: &UsageRecord) -> String {
        let premium = record.premium();
        // No cap means no quota to breach.
        if premium.is_unbounded() {
            return format!("{ICON_OK} Cursor: {}/{INFINITY}", premium.used());
        }
        format!(
            "{} Cursor: {}%",
            Self::icon(premium.percentage()),
            premium.rounded_percentage()
        )
    }

    fn render_error(&self, _message: &str) -> String {
        format!("{ICON_ERROR} Cursor: fetch failed")
    }
}
