//! Reading and writing the settings file.
//!
//! The file carries the session cookie, so it is written owner-only and
//! replaced atomically.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Owner read/write.
const FILE_MODE: u32 = 0o600;
/// Owner read/write/search.
const DIR_MODE: u32 = 0o700;

// ============================================================================
// Locations
// ============================================================================

/// Per-user directory holding cursorbar state.
///
/// Resolves to `~/.config/cursorbar` on Linux,
/// `~/Library/Application Support/cursorbar` on macOS and
/// `%APPDATA%\cursorbar` on Windows. Falls back to the working directory
/// when the platform has no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join("cursorbar"))
}

/// `settings.json` inside [`default_config_dir`].
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Restricted permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// Reading and Writing
// ============================================================================

/// Creates the parent of `path` when it does not exist yet.
///
/// Permissions are only tightened on a directory created here.
async fn prepare_parent(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::try_exists(parent).await? {
        return Ok(());
    }

    debug!(path = %parent.display(), "Creating config directory");
    tokio::fs::create_dir_all(parent).await?;
    restrict(parent, DIR_MODE).await
}

/// Writes `contents` next to `path`, locks it down, and renames it over.
async fn replace_file(path: &Path, contents: &str) -> Result<(), StoreError> {
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, contents).await?;

    let locked = restrict(&staging, FILE_MODE).await;
    if locked.is_err() {
        let _ = tokio::fs::remove_file(&staging).await;
        return locked;
    }

    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

/// Serializes `data` as pretty JSON and stores it at `path`.
///
/// Missing parent directories are created. Readers never see a partial
/// file or one with loose permissions.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;

    prepare_parent(path).await?;
    replace_file(path, &json).await?;

    debug!(path = %path.display(), bytes = json.len(), "Saved");
    Ok(())
}

/// Reads and deserializes the JSON file at `path`.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "Loaded");
    Ok(data)
}

/// Like [`load_json`], falling back to `T::default()` on any error.
///
/// Errors other than a missing file are logged.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    load_json(path).await.unwrap_or_else(|e: StoreError| {
        if !e.is_not_found() {
            warn!(path = %path.display(), error = %e, "Unreadable, using defaults");
        }
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_path_layout() {
        let path = default_settings_path();
        assert!(path.ends_with("cursorbar/settings.json"));
        assert!(default_config_dir().ends_with("cursorbar"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restrict_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secret.json");
        tokio::fs::write(&file, "{}").await.unwrap();

        restrict(&file, FILE_MODE).await.unwrap();

        let mode = tokio::fs::metadata(&file).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: Vec<u32> = load_json_or_default(&dir.path().join("absent.json")).await;
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_parent_without_directory_component() {
        prepare_parent(Path::new("settings.json")).await.unwrap();
    }
}
