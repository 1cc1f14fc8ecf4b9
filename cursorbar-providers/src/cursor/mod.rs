//! Cursor usage provider.
//!
//! ## Fetch Strategies
//!
//! 1. **API Strategy** (priority 100): `GET /api/usage?user=<id>` with the
//!    session cookie
//! 2. **Web Strategy** (priority 40): `GET /settings` and pattern matching
//!    over the HTML
//!
//! ## Credentials
//!
//! Both strategies send the user's `WorkosCursorSessionToken` cookie
//! verbatim. The user id is the `user_...` prefix of that token.
//!
//! ## Usage
//!
//! ```ignore
//! use cursorbar_providers::cursor::CursorUsageFetcher;
//!
//! let fetcher = CursorUsageFetcher::new();
//! let record = fetcher.fetch_usage(&credentials).await?;
//! ```

mod fetcher;
mod normalize;
pub(crate) mod parser;
mod strategies;
mod web;


pub use fetcher::CursorUsageFetcher;
pub use normalize::{default_reset_date, normalize, reset_date_from_period_start};
pub use parser::{
    CapturedPair, CursorUsageResponse, ModelUsage, RawUsage, ScrapedUsage, parse_usage_json,
    scrape_settings_page,
};
pub use strategies::{CursorApiStrategy, CursorWebStrategy};
pub use web::{CursorWebClient, SETTINGS_PATH, USAGE_PATH};
