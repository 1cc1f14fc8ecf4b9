//! JSON output formatting.

use anyhow::Result;
use cursorbar_core::{UsageRecord, UsageRenderer};
use serde::Serialize;

/// Error payload.
#[derive(Debug, Serialize)]
pub struct ErrorOutput<'a> {
    pub error: &'a str,
}

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

impl UsageRenderer for JsonFormatter {
    fn render(&self, record: &UsageRecord) -> String {
        self.format(record)
            .unwrap_or_else(|e| self.render_error(&e.to_string()))
    }

    fn render_error(&self, message: &str) -> String {
        // A struct of one &str cannot fail to serialize.
        self.format(&ErrorOutput { error: message })
            .unwrap_or_else(|_| String::from("{\"error\":\"unknown\"}"))
    }
}
