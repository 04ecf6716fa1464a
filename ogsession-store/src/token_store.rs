//! Saved lobby bearer tokens.
//!
//! Lets the next run skip credential submission (and any challenge) while
//! the lobby still honours the token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_token_path, load_json_or_default, save_json};

/// One saved token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedToken {
    /// Lobby bearer token.
    pub bearer_token: String,
    /// When it was saved.
    pub saved_at: DateTime<Utc>,
}

/// Username to token map backed by a JSON file.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    tokens: BTreeMap<String, SavedToken>,
}

impl TokenStore {
    /// Opens the store at the default path.
    pub async fn open_default() -> Self {
        Self::open(default_token_path()).await
    }

    /// Opens the store at `path`. A missing or corrupt file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tokens: BTreeMap<String, SavedToken> = load_json_or_default(&path).await;
        debug!(path = %path.display(), count = tokens.len(), "Opened token store");
        Self { path, tokens }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved token for `username`.
    pub fn get(&self, username: &str) -> Option<&SavedToken> {
        self.tokens.get(&key(username))
    }

    /// Bearer token for `username`, if any.
    pub fn bearer_token(&self, username: &str) -> Option<&str> {
        self.get(username).map(|t| t.bearer_token.as_str())
    }

    /// Records a token. Empty tokens remove the entry instead.
    pub fn put(&mut self, username: &str, bearer_token: &str) {
        if bearer_token.is_empty() {
            self.remove(username);
            return;
        }
        self.tokens.insert(
            key(username),
            SavedToken {
                bearer_token: bearer_token.to_string(),
                saved_at: Utc::now(),
            },
        );
    }

    /// Forgets the token for `username`.
    pub fn remove(&mut self, username: &str) -> Option<SavedToken> {
        self.tokens.remove(&key(username))
    }

    /// Number of saved tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token is saved.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Writes the store to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        save_json(&self.path, &self.tokens).await?;
        debug!(path = %self.path.display(), count = self.tokens.len(), "Saved tokens");
        Ok(())
    }

    /// Forgets every token and deletes the file.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.tokens.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Cleared saved tokens");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Lobby logins are e-mail addresses; case does not matter.
fn key(username: &str) -> String {
    username.trim().to_lowercase()
}
