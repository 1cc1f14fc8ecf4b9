// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `CursorBar` Store
//!
//! State management for the `CursorBar` monitor.
//!
//! This crate provides:
//!
//! - **UsageStore**: The latest usage record, refresh state and error,
//!   with ticketed last-start-wins publication and watch channels
//! - **SettingsStore**: Credentials and preferences with persistence
//! - **RefreshController**: The polling loop that drives a `UsageSource`
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use cursorbar_store::{RefreshController, SettingsStore, UsageStore, default_settings_path};
//!
//! let settings = SettingsStore::load(default_settings_path()).await?;
//! let store = Arc::new(UsageStore::new());
//! let controller = RefreshController::new(fetcher, store.clone(), settings.credentials().await);
//!
//! let handle = controller.start(settings.get().await.refresh_interval());
//! let mut rx = store.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("Usage updated!");
//! }
//! handle.stop().await;
//! ```

pub mod error;
pub mod persistence;
pub mod refresh;
pub mod settings_store;
pub mod usage_store;

pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, load_json, load_json_or_default, save_json,
};
pub use refresh::{RefreshController, RefreshHandle};
pub use settings_store::{
    DEFAULT_CHECK_INTERVAL_SECS, LogLevel, MIN_CHECK_INTERVAL_SECS, Settings, SettingsStore,
};
pub use usage_store::{AcquisitionTicket, RefreshState, UsageStore};
