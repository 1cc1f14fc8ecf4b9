//! Multi-line terminal view of a usage record.

use chrono::Local;
use cursorbar_core::{UsageBucket, UsageRecord, UsageRenderer};

use super::{INFINITY, format_bucket, format_reset, format_timestamp};

// ============================================================================
// Styling
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Detail view for a terminal, with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a formatter with a 20 cell bar.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 20,
        }
    }

    /// Overrides the bar width in cells.
    #[must_use]
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Formats one bucket line: label, bar, counts.
    fn format_bucket_line(&self, label: &str, bucket: &UsageBucket) -> String {
        if bucket.is_unbounded() {
            let bar = self.dim(&BAR_EMPTY.to_string().repeat(self.bar_width));
            let cap = self.dim(&format!("/ {INFINITY} (no cap)"));
            return format!("{label:<10} {bar} {} {cap}", bucket.used());
        }

        let bar = self.progress_bar(bucket.percentage());
        let counts = self.color_for_percent(bucket.percentage(), &format_bucket(bucket));
        format!("{label:<10} {bar} {counts}")
    }

    /// Formats a progress bar filled to `percent_used`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn progress_bar(&self, percent_used: f64) -> String {
        let fraction = (percent_used / 100.0).clamp(0.0, 1.0);
        let filled = (fraction * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar: String = std::iter::repeat_n(BAR_FULL, filled)
            .chain(std::iter::repeat_n(BAR_EMPTY, empty))
            .collect();

        self.color_for_percent(percent_used, &bar)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn color_for_percent(&self, percent_used: f64, text: &str) -> String {
        self.paint(shade(percent_used), text)
    }
}

/// Red above 90%, yellow above 75%, green otherwise.
fn shade(percent_used: f64) -> &'static str {
    match percent_used {
        p if p > 90.0 => RED,
        p if p > 75.0 => YELLOW,
        _ => GREEN,
    }
}

impl UsageRenderer for TextFormatter {
    fn render(&self, record: &UsageRecord) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} ({})",
            self.paint(BOLD, "Cursor Usage"),
            record.source().label()
        ));
        lines.push("─".repeat(self.bar_width + 30));

        lines.push(self.format_bucket_line("Premium", record.premium()));
        lines.push(self.format_bucket_line("Unlimited", record.unlimited()));

        if let Some(remaining) = record.premium().remaining() {
            lines.push(self.dim(&format!("{remaining} premium requests left")));
        }

        lines.push(String::new());
        lines.push(format!(
            "Resets:       {}",
            format_reset(record, Local::now().date_naive())
        ));
        lines.push(format!(
            "Last updated: {}",
            self.dim(&format_timestamp(record.last_updated()))
        ));
        lines.push(format!("Source:       {}", record.source().description()));

        lines.join("\n")
    }

    fn render_error(&self, message: &str) -> String {
        format!(
            "{}: {} - {message}",
            self.paint(BOLD, "Cursor"),
            self.paint(RED, "Error")
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_full() {
        let formatter = TextFormatter::new(false).with_bar_width(10);
        assert_eq!(formatter.progress_bar(100.0), "██████████");
    }

    #[test]
    fn test_progress_bar_empty() {
        let formatter = TextFormatter::new(false).with_bar_width(10);
        assert_eq!(formatter.progress_bar(0.0), "░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_half() {
        let formatter = TextFormatter::new(false).with_bar_width(10);
        assert_eq!(formatter.progress_bar(50.0), "█████░░░░░");
    }

    #[test]
    fn test_shade_thresholds() {
        assert_eq!(shade(95.0), RED);
        assert_eq!(shade(90.0), YELLOW);
        assert_eq!(shade(75.0), GREEN);
        assert_eq!(
            TextFormatter::new(true).color_for_percent(80.0, "x"),
            format!("{YELLOW}x{RESET}")
        );
    }

    #[test]
    fn test_unbounded_bucket_line() {
        let formatter = TextFormatter::new(false).with_bar_width(4);
        let line = formatter.format_bucket_line("Unlimited", &UsageBucket::new(12, 0));
        assert_eq!(line, "Unlimited  ░░░░ 12 / ∞ (no cap)");
    }
}
