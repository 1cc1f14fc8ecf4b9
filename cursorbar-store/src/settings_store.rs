//! User preferences store.
//!
//! Owns the credentials and polling preferences, with persistence and change
//! notification.

use cursorbar_core::{Credentials, USER_ID_PREFIX};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{load_json_or_default, save_json};

/// Default polling interval (one hour).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Shortest polling interval accepted.
pub const MIN_CHECK_INTERVAL_SECS: u64 = 10;

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
///
/// Persisted with camelCase keys. Unknown keys are ignored and missing keys
/// take their defaults.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Raw `Cookie` header copied from a logged-in browser session.
    pub cookie_string: String,

    /// Cursor user id (`user_...`).
    pub user_id: String,

    /// Polling interval in seconds.
    pub check_interval: u64,

    /// Log verbosity when neither `--verbose` nor `--quiet` is given.
    pub log_level: LogLevel,

    /// Endpoint base override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cookie_string: String::new(),
            user_id: String::new(),
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            log_level: LogLevel::default(),
            base_url: None,
        }
    }
}

impl Settings {
    /// Builds the credentials the fetch layer consumes.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user_id, &self.cookie_string)
    }

    /// Polling interval, raised to the minimum if the file holds less.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.max(MIN_CHECK_INTERVAL_SECS))
    }

    /// Cookie with everything but the first and last few characters hidden.
    pub fn masked_cookie(&self) -> String {
        mask_secret(&self.cookie_string)
    }

    /// Validates values that could have been hand-edited.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IntervalTooShort` or `StoreError::Config`.
    pub fn validate(&self) -> Result<(), StoreError> {
        check_interval(self.check_interval)?;
        if let Some(base) = &self.base_url {
            if !(base.starts_with("https://") || base.starts_with("http://")) {
                return Err(StoreError::Config(format!(
                    "baseUrl must start with http:// or https:// (got {base})"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("cookie_string", &format_args!("<{} chars redacted>", self.cookie_string.len()))
            .field("user_id", &self.user_id)
            .field("check_interval", &self.check_interval)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn check_interval(secs: u64) -> Result<(), StoreError> {
    if secs < MIN_CHECK_INTERVAL_SECS {
        return Err(StoreError::IntervalTooShort {
            secs,
            min: MIN_CHECK_INTERVAL_SECS,
        });
    }
    Ok(())
}

fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 6;

    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= VISIBLE * 2 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..VISIBLE].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE..].iter().collect();
    format!("{head}…{tail} ({} chars)", chars.len())
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl LogLevel {
    /// Directive string for an `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store holding defaults, backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults. Invalid values are
    /// logged and left for the caller to correct.
    ///
    /// # Errors
    ///
    /// Currently infallible.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings: Settings = load_json_or_default(&path).await;
        info!(
            path = %path.display(),
            has_cookie = !settings.cookie_string.is_empty(),
            has_user_id = !settings.user_id.is_empty(),
            "Settings loaded"
        );

        if let Err(e) = settings.validate() {
            warn!(error = %e, "Settings contain invalid values");
        }
        if !settings.user_id.is_empty() && !settings.user_id.starts_with(USER_ID_PREFIX) {
            warn!(prefix = USER_ID_PREFIX, "Configured user id has an unexpected prefix");
        }

        Ok(Self::with_settings(path, settings))
    }

    /// Re-reads the backing file and adopts its contents if they differ.
    ///
    /// Subscribers are notified only on an actual change. A missing or
    /// unreadable file counts as defaults, as in [`SettingsStore::load`].
    /// Returns true if the settings changed.
    pub async fn reload(&self) -> bool {
        let on_disk: Settings = load_json_or_default(&self.path).await;
        {
            let mut settings = self.settings.write().await;
            if *settings == on_disk {
                return false;
            }
            *settings = on_disk;
        }
        info!(path = %self.path.display(), "Settings changed on disk");
        self.notify_change().await;
        true
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Builds credentials from the current settings.
    pub async fn credentials(&self) -> Credentials {
        self.settings.read().await.credentials()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Stores a new cookie.
    ///
    /// If no user id is configured and the cookie embeds one, it is filled in
    /// as well. Returns the user id that was derived, if any.
    pub async fn set_cookie(&self, cookie: &str) -> Option<String> {
        let cookie = cookie.trim().to_string();
        let derived = Credentials::user_id_from_cookie(&cookie);
        let mut filled = None;

        self.update(|s| {
            s.cookie_string = cookie;
            if s.user_id.is_empty() {
                filled.clone_from(&derived);
                if let Some(id) = &derived {
                    s.user_id.clone_from(id);
                }
            }
        })
        .await;

        debug!(derived_user_id = filled.is_some(), "Cookie updated");
        filled
    }

    /// Stores a new user id.
    pub async fn set_user_id(&self, user_id: &str) {
        let user_id = user_id.trim().to_string();
        if !user_id.starts_with(USER_ID_PREFIX) {
            warn!(prefix = USER_ID_PREFIX, "User id has an unexpected prefix");
        }
        self.update(|s| s.user_id = user_id).await;
    }

    /// Stores a new polling interval.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IntervalTooShort` below the minimum; the stored
    /// value is left unchanged.
    pub async fn set_check_interval(&self, secs: u64) -> Result<(), StoreError> {
        check_interval(secs)?;
        self.update(|s| s.check_interval = secs).await;
        Ok(())
    }

    /// Restores every setting to its default.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
        info!("Settings reset to defaults");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        (dir, store)
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.cookie_string.is_empty());
        assert!(settings.user_id.is_empty());
        assert_eq!(settings.check_interval, 3600);
        assert_eq!(settings.log_level, LogLevel::Warn);
        assert!(settings.base_url.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_refresh_interval_floor() {
        let settings = Settings {
            check_interval: 3,
            ..Settings::default()
        };
        assert_eq!(settings.refresh_interval(), Duration::from_secs(10));
        assert!(matches!(
            settings.validate(),
            Err(StoreError::IntervalTooShort { secs: 3, min: 10 })
        ));
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_edit() {
        let (_dir, store) = temp_store();
        let mut rx = store.subscribe();

        assert!(!store.reload().await);
        assert!(!rx.has_changed().unwrap());

        let other = SettingsStore::new(store.path().to_path_buf());
        other.set_check_interval(600).await.unwrap();
        other.save().await.unwrap();

        assert!(store.reload().await);
        assert!(rx.has_changed().unwrap());
        assert_eq!(store.get().await.check_interval, 600);

        let _ = rx.borrow_and_update();
        assert!(!store.reload().await);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = Settings {
            base_url: Some("ftp://cursor.com".to_string()),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_cookie() {
        let settings = Settings {
            cookie_string: "WorkosCursorSessionToken=topsecret".to_string(),
            ..Settings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn test_masked_cookie() {
        let settings = Settings {
            cookie_string: "WorkosCursorSessionToken=user_01%3A%3Aabcdef".to_string(),
            ..Settings::default()
        };
        let masked = settings.masked_cookie();
        assert!(masked.starts_with("Workos"));
        assert!(masked.ends_with("(44 chars)"));
        assert!(!masked.contains("user_01"));

        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_log_level_strings() {
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(format!("{}", LogLevel::Trace), "trace");
        let parsed: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(parsed, LogLevel::Debug);
    }

    #[tokio::test]
    async fn test_settings_store_update_notifies() {
        let (_dir, store) = temp_store();
        let mut rx = store.subscribe();

        store.update(|s| s.user_id = "user_abc".to_string()).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
        assert_eq!(store.get().await.user_id, "user_abc");
    }

    #[tokio::test]
    async fn test_credentials_from_store() {
        let (_dir, store) = temp_store();
        assert!(!store.credentials().await.is_complete());

        store.set_user_id(" user_abc ").await;
        store.set_cookie("a=b").await;

        let creds = store.credentials().await;
        assert!(creds.is_complete());
        assert_eq!(creds.user_id(), "user_abc");
    }

    #[tokio::test]
    async fn test_set_cookie_fills_missing_user_id() {
        let (_dir, store) = temp_store();

        let derived = store
            .set_cookie("WorkosCursorSessionToken=user_01XYZ%3A%3Ajwt")
            .await;

        assert_eq!(derived.as_deref(), Some("user_01XYZ"));
        assert_eq!(store.get().await.user_id, "user_01XYZ");
    }

    #[tokio::test]
    async fn test_set_cookie_keeps_existing_user_id() {
        let (_dir, store) = temp_store();
        store.set_user_id("user_manual").await;

        let derived = store
            .set_cookie("WorkosCursorSessionToken=user_01XYZ%3A%3Ajwt")
            .await;

        assert!(derived.is_none());
        assert_eq!(store.get().await.user_id, "user_manual");
    }

    #[tokio::test]
    async fn test_set_check_interval_rejects_short() {
        let (_dir, store) = temp_store();

        assert!(store.set_check_interval(5).await.is_err());
        assert_eq!(store.get().await.check_interval, 3600);

        store.set_check_interval(60).await.unwrap();
        assert_eq!(store.get().await.check_interval, 60);
    }

    #[tokio::test]
    async fn test_reset() {
        let (_dir, store) = temp_store();
        store.set_user_id("user_abc").await;
        store.reset().await;
        assert_eq!(store.get().await, Settings::default());
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load(dir.path().join("nope.json")).await.unwrap();
        assert_eq!(store.get().await, Settings::default());
    }
}
