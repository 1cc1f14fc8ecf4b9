// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `CursorBar` Core
//!
//! Core types, models, and traits shared by every `CursorBar` crate.
//!
//! ## Key Types
//!
//! ### Usage Types
//! - [`UsageRecord`] - Canonical, immutable usage record (premium + unlimited)
//! - [`UsageBucket`] - One request tier: used / total / percentage
//! - [`FetchSource`] - Which strategy produced a record
//!
//! ### Identity
//! - [`Credentials`] - User id and session cookie supplied by the user
//!
//! ### Traits
//! - [`UsageSource`] - Anything that can turn credentials into a record
//! - [`UsageRenderer`] - Pure presentation of a record or an error

pub mod error;
pub mod models;
pub mod traits;

pub use error::CoreError;

pub use models::{
    // Identity
    Credentials,
    SESSION_COOKIE_NAME,
    USER_ID_PREFIX,
    // Usage types
    FetchSource,
    UNCAPPED_PERCENT,
    UsageBucket,
    UsageRecord,
    usage_percentage,
};

pub use traits::{UsageRenderer, UsageSource};
