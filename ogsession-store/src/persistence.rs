//! File persistence helpers.
//!
//! Config and token files hold credentials material, so everything is
//! written atomically and readable by the owner only.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory (`<config dir>/ogsession`).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join("ogsession"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Returns the default token file path.
pub fn default_token_path() -> PathBuf {
    default_config_dir().join("tokens.json")
}

// ============================================================================
// Permissions
// ============================================================================

#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Restricted permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates a directory (and parents) readable by the owner only.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        restrict(path, 0o700).await?;
    }
    Ok(())
}

/// Saves `data` as pretty JSON via temp file and rename, mode `0600`.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    restrict(&temp_path, 0o600).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "Saved JSON file");
    Ok(())
}

/// Loads a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "Loaded JSON file");
    Ok(data)
}

/// Loads a JSON file, falling back to the default when it is missing or
/// unreadable.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !e.is_not_found() {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        assert!(default_config_path().ends_with("ogsession/config.json"));
        assert!(default_token_path().ends_with("ogsession/tokens.json"));
    }

    #[tokio::test]
    async fn test_save_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");
        save_json(&path, &serde_json::json!({ "universe": "Zibal" }))
            .await
            .unwrap();
        let loaded: serde_json::Value = load_json(&path).await.unwrap();
        assert_eq!(loaded["universe"], "Zibal");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("private").join("tokens.json");
        save_json(&path, &serde_json::json!({})).await.unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }

    #[tokio::test]
    async fn test_load_or_default() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let value: Vec<String> = load_json_or_default(&missing).await;
        assert!(value.is_empty());

        let corrupt = dir.path().join("corrupt.json");
        tokio::fs::write(&corrupt, "{ not json").await.unwrap();
        let value: Vec<String> = load_json_or_default(&corrupt).await;
        assert!(value.is_empty());
    }
}
