//! Configuration file.
//!
//! Every field has a serde default so partial files keep working across
//! upgrades. Secrets are never stored here: the password and OTP secret are
//! read from the environment variables the config names.

use ogsession_core::Credentials;
use ogsession_session::{Endpoints, SessionSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

/// Session configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Universe name, e.g. `Zibal`.
    #[serde(default)]
    pub universe: String,
    /// Universe language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Pins a specific account when several share a universe.
    #[serde(default)]
    pub player_id: Option<i64>,
    /// Lobby login name.
    #[serde(default)]
    pub username: String,
    /// Variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Variable holding the base32 TOTP secret, if 2FA is on.
    #[serde(default)]
    pub otp_secret_env: Option<String>,
    /// Pre-computed device fingerprint.
    #[serde(default)]
    pub blackbox: String,
    /// `lobby` or `lobby-pioneers`.
    #[serde(default = "default_lobby")]
    pub lobby: String,
    /// Challenges solved per login before giving up.
    #[serde(default = "default_challenge_retries")]
    pub max_challenge_retries: u32,
    /// Steady request rate; zero disables limiting.
    #[serde(default)]
    pub requests_per_second: u32,
    /// Token bucket burst.
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Login deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub login_timeout_secs: u64,
    /// Reclaims a held slot after this many seconds.
    #[serde(default)]
    pub hold_timeout_secs: Option<u64>,
    /// Anti-forgery tokens older than this are refreshed.
    #[serde(default = "default_token_max_age_secs")]
    pub token_max_age_secs: u64,
    /// Lets elevated tasks jump the queue.
    #[serde(default = "default_true")]
    pub elevated_queue: bool,
    /// Keeps the chat connection alive.
    #[serde(default = "default_true")]
    pub chat: bool,
    /// Overrides the browser user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Reuse saved bearer tokens.
    #[serde(default = "default_true")]
    pub remember_token: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_password_env() -> String {
    "OGSESSION_PASSWORD".to_string()
}

fn default_lobby() -> String {
    "lobby".to_string()
}

fn default_challenge_retries() -> u32 {
    3
}

fn default_burst() -> u32 {
    6
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_token_max_age_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            universe: String::new(),
            language: default_language(),
            player_id: None,
            username: String::new(),
            password_env: default_password_env(),
            otp_secret_env: None,
            blackbox: String::new(),
            lobby: default_lobby(),
            max_challenge_retries: default_challenge_retries(),
            requests_per_second: 0,
            burst: default_burst(),
            request_timeout_secs: default_timeout_secs(),
            login_timeout_secs: default_timeout_secs(),
            hold_timeout_secs: None,
            token_max_age_secs: default_token_max_age_secs(),
            elevated_queue: true,
            chat: true,
            user_agent: None,
            remember_token: true,
        }
    }
}

impl SessionConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads from `path`; a missing file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = load_json(path).await?;
        info!(path = %path.display(), universe = %config.universe, "Loaded configuration");
        Ok(config)
    }

    /// Saves to `path` with owner-only permissions.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks the fields a login needs.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.universe.trim().is_empty() {
            return Err(StoreError::Config("universe is empty".into()));
        }
        if self.language.len() != 2 || !self.language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StoreError::Config(format!(
                "language must be a two-letter code, got {:?}",
                self.language
            )));
        }
        if self.username.trim().is_empty() {
            return Err(StoreError::Config("username is empty".into()));
        }
        if self.requests_per_second > 0 && self.burst == 0 {
            return Err(StoreError::Config("burst must be at least 1".into()));
        }
        if self.login_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(StoreError::Config("timeouts must be positive".into()));
        }
        Ok(())
    }

    /// Builds session settings.
    pub fn to_settings(&self) -> SessionSettings {
        let mut settings = SessionSettings::new(self.universe.clone(), self.language.to_lowercase())
            .with_endpoints(Endpoints::for_lobby(&self.lobby))
            .with_max_challenge_retries(self.max_challenge_retries)
            .with_login_timeout(Duration::from_secs(self.login_timeout_secs));
        if let Some(id) = self.player_id {
            settings = settings.with_player_id(id);
        }
        if let Some(secs) = self.hold_timeout_secs {
            settings = settings.with_hold_timeout(Duration::from_secs(secs));
        }
        if !self.chat {
            settings = settings.without_chat();
        }
        settings.requests_per_second = self.requests_per_second;
        settings.burst = self.burst;
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        settings.token_max_age = Duration::from_secs(self.token_max_age_secs);
        settings.elevated_queue_enabled = self.elevated_queue;
        if let Some(ua) = &self.user_agent {
            settings.user_agent.clone_from(ua);
        }
        settings
    }

    /// Reads the credentials, taking secrets from the environment.
    pub fn credentials(&self) -> Result<Credentials, StoreError> {
        let password = std::env::var(&self.password_env)
            .map_err(|_| StoreError::MissingEnv(self.password_env.clone()))?;
        let mut credentials = Credentials::new(self.username.clone(), password);
        if let Some(var) = &self.otp_secret_env {
            let secret = std::env::var(var).map_err(|_| StoreError::MissingEnv(var.clone()))?;
            credentials = credentials.with_otp_secret(secret);
        }
        Ok(credentials)
    }
}
