// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `CursorBar` Providers
//!
//! Acquisition and normalization of Cursor usage data.
//!
//! The [`cursor`] module contains:
//!
//! - **Web client**: the two Cursor endpoints
//! - **Parser**: tolerant JSON parsing and settings-page extraction
//! - **Normalizer**: raw shapes into [`cursorbar_core::UsageRecord`]
//! - **Strategies**: API first, HTML scrape second
//! - **Fetcher**: the [`cursorbar_core::UsageSource`] implementation
//!
//! ## Usage
//!
//! ```ignore
//! use cursorbar_core::{Credentials, UsageSource};
//! use cursorbar_providers::CursorUsageFetcher;
//!
//! let fetcher = CursorUsageFetcher::new();
//! let record = fetcher.acquire(&Credentials::new(user_id, cookie)).await?;
//! ```

pub mod cursor;


pub use cursor::CursorUsageFetcher;
