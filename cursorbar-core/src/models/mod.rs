//! Domain models for `CursorBar`.
//!
//! - [`credentials`] - The user-supplied identity (user id + cookie)
//! - [`usage`] - The canonical usage record and its buckets
//! - [`status`] - How a record was obtained

mod credentials;
mod status;
mod usage;

pub use credentials::{Credentials, SESSION_COOKIE_NAME, USER_ID_PREFIX};
pub use status::FetchSource;
pub use usage::{UNCAPPED_PERCENT, UsageBucket, UsageRecord, usage_percentage};
#[cfg(test)]
mod serde_tests;
