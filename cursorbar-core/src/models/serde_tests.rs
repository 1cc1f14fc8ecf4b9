//! Serde tests for core types.
//!
//! The JSON shape of [`UsageRecord`] is what `cursorbar check --format json`
//! prints, so key names matter.

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{Value, json};

use crate::{FetchSource, UsageBucket, UsageRecord};

fn sample_record() -> UsageRecord {
    UsageRecord::new(
        UsageBucket::new(40, 150),
        UsageBucket::new(12, 0),
        NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 20, 8, 30, 0).unwrap(),
        FetchSource::Api,
    )
}

// ============================================================================
// UsageRecord Serde Tests
// ============================================================================

#[test]
fn test_record_serializes_camel_case() {
    let value = serde_json::to_value(sample_record()).unwrap();

    assert_eq!(
        value,
        json!({
            "premium": { "used": 40, "total": 150, "percentage": 26.67 },
            "unlimited": { "used": 12, "total": 0, "percentage": 100.0 },
            "resetDate": "2024-04-15",
            "lastUpdated": "2024-03-20T08:30:00Z",
            "source": "api"
        })
    );
}

#[test]
fn test_record_roundtrip() {
    let record = sample_record();
    let json = serde_json::to_string(&record).unwrap();
    let back: UsageRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn test_record_source_defaults_to_api() {
    let mut value = serde_json::to_value(sample_record()).unwrap();
    if let Value::Object(map) = &mut value {
        map.remove("source");
    }
    let back: UsageRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back.source(), FetchSource::Api);
}

#[test]
fn test_record_rejects_bad_reset_date() {
    let mut value = serde_json::to_value(sample_record()).unwrap();
    value["resetDate"] = json!("15/04/2024");
    assert!(serde_json::from_value::<UsageRecord>(value).is_err());
}

// ============================================================================
// FetchSource Serde Tests
// ============================================================================

#[test]
fn test_fetch_source_snake_case() {
    assert_eq!(serde_json::to_string(&FetchSource::Web).unwrap(), r#""web""#);
    let parsed: FetchSource = serde_json::from_str(r#""api""#).unwrap();
    assert_eq!(parsed, FetchSource::Api);
    assert!(serde_json::from_str::<FetchSource>(r#""oauth""#).is_err());
}
