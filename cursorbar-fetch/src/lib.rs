// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `CursorBar` Fetch
//!
//! HTTP plumbing and the strategy pipeline used to acquire usage data.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing, per-request timeouts and a
//!   domain allowlist
//!
//! ## Fetch Pipeline
//!
//! The fetch pipeline executes strategies in priority order:
//!
//! - [`strategy::FetchStrategy`] - Trait for fetch implementations
//! - [`pipeline::FetchPipeline`] - Executes strategies in order and records
//!   every attempt
//! - [`context::FetchContext`] - Credentials, HTTP client and endpoint settings
//!
//! ## Example
//!
//! ```ignore
//! use cursorbar_fetch::{FetchContext, FetchPipeline};
//!
//! let ctx = FetchContext::builder().credentials(credentials).build();
//! let pipeline = FetchPipeline::with_strategies(vec![
//!     Box::new(CursorApiStrategy::new()),
//!     Box::new(CursorWebStrategy::new()),
//! ]);
//!
//! let outcome = pipeline.execute(&ctx).await;
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod strategy;

// Errors
pub use error::{FetchError, HttpError, StrategyFailure};

// Host APIs
pub use host::http::{HttpClient, TextResponse};

// Strategy & Pipeline
pub use context::{
    DEFAULT_BASE_URL, FetchContext, FetchContextBuilder, FetchSettings,
};
pub use pipeline::{FetchAttempt, FetchOutcome, FetchPipeline};
pub use strategy::{FetchKind, FetchResult, FetchStrategy};
