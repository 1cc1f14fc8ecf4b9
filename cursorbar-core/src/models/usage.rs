//! Usage-related types.
//!
//! - [`UsageRecord`] - The canonical record produced by one acquisition
//! - [`UsageBucket`] - One request tier (premium or unlimited)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::status::FetchSource;

/// Percentage reported for a bucket with no cap that has seen consumption.
///
/// This is a marker, not a ratio: renderers should check
/// [`UsageBucket::is_unbounded`] before treating it as a fill level.
pub const UNCAPPED_PERCENT: f64 = 100.0;

/// Computes a bucket percentage.
///
/// - `total > 0`: `used / total * 100`, clamped to `[0, 100]` and rounded
///   to two decimals.
/// - `total == 0 && used == 0`: `0`.
/// - `total == 0 && used > 0`: [`UNCAPPED_PERCENT`].
#[allow(clippy::cast_precision_loss)]
pub fn usage_percentage(used: u64, total: u64) -> f64 {
    if total == 0 {
        return if used == 0 { 0.0 } else { UNCAPPED_PERCENT };
    }

    let ratio = (used as f64 / total as f64) * 100.0;
    round_hundredths(ratio.clamp(0.0, 100.0))
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Usage Bucket
// ============================================================================

/// A single request tier.
///
/// Built through [`UsageBucket::new`] so the percentage always agrees with
/// `used` and `total`. Deserializing ignores any stored percentage and
/// derives it again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BucketCounts")]
pub struct UsageBucket {
    used: u64,
    total: u64,
    percentage: f64,
}

impl UsageBucket {
    /// Creates a bucket and derives its percentage.
    pub fn new(used: u64, total: u64) -> Self {
        Self {
            used,
            total,
            percentage: usage_percentage(used, total),
        }
    }

    /// Creates an all-zero bucket.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Requests consumed in the current period.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Request quota for the period. `0` means no cap.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Percentage of quota consumed, in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Percentage rounded to the nearest whole number.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percentage(&self) -> u32 {
        self.percentage.round() as u32
    }

    /// Returns true if this bucket has no cap.
    pub fn is_unbounded(&self) -> bool {
        self.total == 0
    }

    /// Requests left before the cap, if there is one.
    pub fn remaining(&self) -> Option<u64> {
        (self.total > 0).then(|| self.total.saturating_sub(self.used))
    }
}

impl Default for UsageBucket {
    fn default() -> Self {
        Self::empty()
    }
}

/// Wire shape of a bucket; the percentage is always recomputed.
#[derive(Deserialize)]
struct BucketCounts {
    used: u64,
    total: u64,
}

impl From<BucketCounts> for UsageBucket {
    fn from(counts: BucketCounts) -> Self {
        Self::new(counts.used, counts.total)
    }
}

// ============================================================================
// Usage Record
// ============================================================================

/// The canonical usage record.
///
/// Produced once per successful acquisition and replaced wholesale by the
/// next one. There are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    premium: UsageBucket,
    unlimited: UsageBucket,
    reset_date: NaiveDate,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    source: FetchSource,
}

impl UsageRecord {
    /// Creates a new record.
    pub fn new(
        premium: UsageBucket,
        unlimited: UsageBucket,
        reset_date: NaiveDate,
        last_updated: DateTime<Utc>,
        source: FetchSource,
    ) -> Self {
        Self {
            premium,
            unlimited,
            reset_date,
            last_updated,
            source,
        }
    }

    /// The rate-limited tier.
    pub fn premium(&self) -> &UsageBucket {
        &self.premium
    }

    /// The effectively uncapped tier.
    pub fn unlimited(&self) -> &UsageBucket {
        &self.unlimited
    }

    /// Date the counters are expected to reset.
    pub fn reset_date(&self) -> NaiveDate {
        self.reset_date
    }

    /// When this record was acquired.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Which strategy produced this record.
    pub fn source(&self) -> FetchSource {
        self.source
    }
}

// ============================================================================
// Tests
// ============================================================================
