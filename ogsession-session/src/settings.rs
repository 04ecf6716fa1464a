//! Session settings.

use ogsession_core::ServerIdentity;
use ogsession_fetch::DEFAULT_USER_AGENT;
use std::time::Duration;

// ============================================================================
// Endpoints
// ============================================================================

/// Base URLs of every remote service the session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Account service hosting `/api/v1/auth/thin/sessions`.
    pub auth_base: String,
    /// Game lobby (`/api/servers`, `/api/users/me/...`).
    pub lobby_base: String,
    /// Challenge bootstrap service.
    pub challenge_base: String,
    /// Image-drop challenge service.
    pub image_drop_base: String,
    /// Universe URL with `{number}` and `{lang}` placeholders.
    pub server_url_template: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::for_lobby("lobby")
    }
}

impl Endpoints {
    /// Production endpoints for a lobby (`lobby` or `lobby-pioneers`).
    pub fn for_lobby(lobby: &str) -> Self {
        Self {
            auth_base: "https://gameforge.com".to_string(),
            lobby_base: format!("https://{lobby}.ogame.gameforge.com"),
            challenge_base: "https://challenge.gameforge.com".to_string(),
            image_drop_base: "https://image-drop-challenge.gameforge.com".to_string(),
            server_url_template: "https://s{number}-{lang}.ogame.gameforge.com".to_string(),
        }
    }

    /// Every service on one host, universes under `/s{number}-{lang}`.
    ///
    /// Used against local mock servers.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_base: base.to_string(),
            lobby_base: base.to_string(),
            challenge_base: base.to_string(),
            image_drop_base: base.to_string(),
            server_url_template: format!("{base}/s{{number}}-{{lang}}"),
        }
    }

    /// Base URL of a universe.
    pub fn server_url(&self, server: &ServerIdentity) -> String {
        self.server_url_template
            .replace("{number}", &server.number.to_string())
            .replace("{lang}", &server.language)
    }
}

// ============================================================================
// Session Settings
// ============================================================================

/// Knobs for one session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Universe name (e.g. `Zibal`).
    pub universe: String,
    /// Universe language code.
    pub language: String,
    /// Explicit player id; picks the account directly when set.
    pub player_id: Option<i64>,
    /// Remote endpoints.
    pub endpoints: Endpoints,
    /// Challenges solved per login before giving up.
    pub max_challenge_retries: u32,
    /// Steady-state requests per second. Zero disables limiting.
    pub requests_per_second: u32,
    /// Token bucket burst.
    pub burst: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Upper bound for one login run.
    pub login_timeout: Duration,
    /// Whether elevated tasks jump the normal queue.
    pub elevated_queue_enabled: bool,
    /// How long a held slot may stay held. `None` trusts the holder.
    pub hold_timeout: Option<Duration>,
    /// Age after which a cached anti-forgery token is refreshed.
    pub token_max_age: Duration,
    /// Whether to run the chat handshake probe.
    pub chat_enabled: bool,
    /// Consecutive chat failures before the handshake probe gives up.
    pub chat_max_attempts: u32,
    /// User agent.
    pub user_agent: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            universe: String::new(),
            language: "en".to_string(),
            player_id: None,
            endpoints: Endpoints::default(),
            max_challenge_retries: 3,
            requests_per_second: 0,
            burst: 6,
            request_timeout: Duration::from_secs(60),
            login_timeout: Duration::from_secs(60),
            elevated_queue_enabled: true,
            hold_timeout: None,
            token_max_age: Duration::from_secs(10 * 60),
            chat_enabled: true,
            chat_max_attempts: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SessionSettings {
    /// Creates settings for a universe.
    pub fn new(universe: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            universe: universe.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    /// Sets the endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the player id.
    pub fn with_player_id(mut self, player_id: i64) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// Sets the challenge budget.
    pub fn with_max_challenge_retries(mut self, retries: u32) -> Self {
        self.max_challenge_retries = retries;
        self
    }

    /// Sets the hold timeout.
    pub fn with_hold_timeout(mut self, timeout: Duration) -> Self {
        self.hold_timeout = Some(timeout);
        self
    }

    /// Sets the login timeout.
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Disables the chat handshake probe.
    pub fn without_chat(mut self) -> Self {
        self.chat_enabled = false;
        self
    }
}
