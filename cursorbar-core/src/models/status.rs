//! Fetch source types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How usage data was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Via the JSON usage endpoint.
    #[default]
    Api,
    /// Via scraping the HTML settings page.
    Web,
}

impl FetchSource {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Web => "Web",
        }
    }

    /// Returns a description of this fetch source.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Api => "Via the usage JSON endpoint",
            Self::Web => "Via scraping the settings page",
        }
    }
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
