//! Session controller.
//!
//! Owns the live session: bearer token, universe binding, active strategy,
//! cached pages, anti-forgery tokens. Every page and action goes through
//! here so authentication loss is detected and recovered in one place.
//!
//! The controller has no internal locking. It is meant to be driven by the
//! holder of the arbiter slot (see [`crate::handle::SessionHandle`]).

use chrono::{FixedOffset, NaiveDateTime, Utc};
use ogsession_core::{
    Account, ChallengeSolver, Credentials, DeviceFingerprint, Page, PageExtractor, PageKind,
    ServerData, SessionError, SessionSnapshot, StaticFingerprint,
};
use ogsession_extractors::Strategy;
use ogsession_fetch::{ClientSettings, Method, RateLimitedClient, StatsSnapshot};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::chat::ChatSupervisor;
use crate::lobby::{LobbyApi, check_upstream};
use crate::login::{LoginMachine, LoginOutcome, LoginTarget};
use crate::settings::SessionSettings;

/// Server clock offsets are rounded to this many seconds.
const OFFSET_GRANULARITY_SECS: i64 = 15 * 60;

/// Snapshot shared with readers outside the arbiter slot.
pub type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

// ============================================================================
// Options
// ============================================================================

/// Per-call page fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Always hit the network.
    pub skip_cache: bool,
    /// Fail with [`SessionError::NotAuthenticated`] instead of logging in
    /// again when the page shows a logged-out state.
    pub skip_retry_on_auth_loss: bool,
    /// Render the page for this planet.
    pub force_planet: Option<i64>,
}

impl FetchOptions {
    /// Options that bypass the page cache.
    pub fn fresh() -> Self {
        Self {
            skip_cache: true,
            ..Self::default()
        }
    }

    /// Sets the planet.
    pub fn with_planet(mut self, planet_id: i64) -> Self {
        self.force_planet = Some(planet_id);
        self
    }

    /// Disables the re-login retry.
    pub fn without_retry(mut self) -> Self {
        self.skip_retry_on_auth_loss = true;
        self
    }
}

/// A form submission against an in-game page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    /// Name used in logs.
    pub name: String,
    /// Page the form lives on; its token authorises the action.
    pub origin: PageKind,
    /// Extra query parameters after `page=ingame&component=...`.
    pub query: Vec<(String, String)>,
    /// Form fields. `token` is appended automatically.
    pub form: Vec<(String, String)>,
    /// Planet to act on.
    pub planet: Option<i64>,
    /// Fail instead of logging in again on auth loss.
    pub skip_retry_on_auth_loss: bool,
}

impl ActionSpec {
    /// Creates an action posting to `origin`.
    pub fn new(name: impl Into<String>, origin: PageKind) -> Self {
        Self {
            name: name.into(),
            origin,
            query: Vec::new(),
            form: Vec::new(),
            planet: None,
            skip_retry_on_auth_loss: false,
        }
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds a form field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Sets the planet.
    pub fn with_planet(mut self, planet_id: i64) -> Self {
        self.planet = Some(planet_id);
        self
    }
}

/// Response to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    /// HTTP status.
    pub status: u16,
    /// Raw body.
    pub body: String,
    /// Parsed body when it was JSON.
    pub json: Option<Value>,
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    captured_at: Instant,
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: SessionSnapshot,
    strategy: Option<Arc<Strategy>>,
    account: Option<Account>,
    tokens: HashMap<String, CachedToken>,
    pages: HashMap<(String, Option<i64>), Page>,
}

// ============================================================================
// Controller
// ============================================================================

/// Live session plus the machinery to keep it authenticated.
pub struct SessionController {
    settings: SessionSettings,
    credentials: Credentials,
    lobby: LobbyApi,
    solver: Option<Arc<dyn ChallengeSolver>>,
    state: SessionState,
    published: SharedSnapshot,
    chat: Option<ChatSupervisor>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("universe", &self.settings.universe)
            .field("credentials", &self.credentials)
            .field("snapshot", &self.state.snapshot)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller with its own HTTP client.
    pub fn new(settings: SessionSettings, credentials: Credentials) -> Result<Self, SessionError> {
        let client = RateLimitedClient::with_settings(ClientSettings {
            requests_per_second: settings.requests_per_second,
            burst: settings.burst,
            timeout: settings.request_timeout,
            user_agent: settings.user_agent.clone(),
        })?;
        let lobby = LobbyApi::new(
            client,
            settings.endpoints.clone(),
            Arc::new(StaticFingerprint::default()),
        );

        Ok(Self {
            settings,
            credentials,
            lobby,
            solver: None,
            state: SessionState::default(),
            published: Arc::new(RwLock::new(SessionSnapshot::default())),
            chat: None,
        })
    }

    /// Sets the challenge solver.
    pub fn with_solver(mut self, solver: Arc<dyn ChallengeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Sets the device fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: Arc<dyn DeviceFingerprint>) -> Self {
        self.lobby = LobbyApi::new(
            self.lobby.client().clone(),
            self.settings.endpoints.clone(),
            fingerprint,
        );
        self
    }

    /// Seeds a bearer token for the login fast path.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.state.snapshot.bearer_token = token.into();
        self.publish();
        self
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Runs the login machine and binds the session.
    ///
    /// The whole run, including the post-bind preferences read, is bounded by
    /// `login_timeout`. This also covers the re-login done by
    /// [`fetch_page`](Self::fetch_page) and
    /// [`perform_action`](Self::perform_action). A run that hits the deadline
    /// leaves the session logged out and fails with
    /// [`SessionError::DeadlineExceeded`].
    #[instrument(skip_all, fields(universe = %self.settings.universe))]
    pub async fn login(&mut self, cancel: &CancellationToken) -> Result<SessionSnapshot, SessionError> {
        let limit = self.settings.login_timeout;
        let result = tokio::time::timeout(limit, self.run_login(cancel)).await;
        match result {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?limit, "Login timed out");
                self.stop_chat();
                self.mark_logged_out();
                self.publish();
                Err(SessionError::DeadlineExceeded)
            }
        }
    }

    async fn run_login(&mut self, cancel: &CancellationToken) -> Result<SessionSnapshot, SessionError> {
        let target = LoginTarget {
            universe: self.settings.universe.clone(),
            language: self.settings.language.clone(),
            player_id: self.settings.player_id,
        };
        let mut machine =
            LoginMachine::new(self.lobby.clone(), target, self.settings.max_challenge_retries)
                .with_solver(self.solver.clone());

        let known_token = self.state.snapshot.bearer_token.clone();
        let outcome = match machine.run(&self.credentials, Some(known_token.as_str()), cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.mark_logged_out();
                if e.is_terminal() {
                    self.state.snapshot.bearer_token.clear();
                }
                self.publish();
                return Err(e);
            }
        };

        self.apply_outcome(outcome);
        self.publish();
        self.refresh_language(cancel).await;
        self.publish();
        Ok(self.snapshot())
    }

    /// Logs out of the universe and forgets the session.
    #[instrument(skip_all)]
    pub async fn logout(&mut self, cancel: &CancellationToken) -> Result<(), SessionError> {
        if self.state.snapshot.logged_in {
            let url = format!(
                "{}/game/index.php?page=logout",
                self.state.snapshot.server_url
            );
            if let Err(e) = self.lobby.client().get(&url, cancel).await {
                warn!(error = %e, "Logout request failed");
            }
        }
        self.stop_chat();
        self.state = SessionState::default();
        self.publish();
        info!("Logged out");
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: LoginOutcome) {
        self.stop_chat();

        let LoginOutcome {
            bearer_token,
            server,
            account,
            server_data,
            server_url,
            strategy,
            session_marker,
            landing_page,
            reused_token,
        } = outcome;

        let identity = server.identity();
        let snapshot = &mut self.state.snapshot;
        snapshot.bearer_token = bearer_token;
        snapshot.language.clone_from(&identity.language);
        snapshot.server = Some(identity);
        snapshot.server_url = server_url;
        snapshot.server_data = Some(server_data);
        snapshot.strategy = Some(strategy.name().to_string());
        snapshot.session_marker = session_marker;
        snapshot.player_id = account.id;
        snapshot.player_name.clone_from(&account.name);
        snapshot.logged_in = true;
        snapshot.connected = true;
        snapshot.bound_at = Some(Utc::now());

        self.state.account = Some(account);
        self.state.tokens.clear();
        self.state.pages.clear();
        self.state.strategy = Some(Arc::clone(&strategy));

        self.record_token(&PageKind::Overview, &landing_page, &strategy);
        self.absorb_full_page(
            Page::new(PageKind::Overview, None, landing_page.as_str()),
            None,
            &strategy,
        );

        if self.settings.chat_enabled {
            if let Some(endpoint) = strategy.extract_chat_endpoint(&landing_page) {
                self.chat = Some(ChatSupervisor::spawn(
                    self.lobby.client().clone(),
                    endpoint,
                    self.settings.chat_max_attempts,
                ));
            }
        }

        debug!(reused_token, "Session bound");
    }

    /// Reads the preferred interface language. Failures are logged only.
    async fn refresh_language(&mut self, cancel: &CancellationToken) {
        let Some(strategy) = self.state.strategy.clone() else {
            return;
        };
        match self.get_game_page(&PageKind::Preferences, None, cancel).await {
            Ok(body) if !strategy.is_logged_out(&body) => {
                if let Some(language) = strategy.extract_language(&body) {
                    self.state.snapshot.language = language;
                }
            }
            Ok(_) => warn!("Preferences page shows logged-out state"),
            Err(e) => warn!(error = %e, "Failed to read preferences"),
        }
    }

    fn mark_logged_out(&mut self) {
        self.state.snapshot.logged_in = false;
        self.state.snapshot.session_marker.clear();
        self.state.pages.clear();
        self.state.tokens.clear();
    }

    fn stop_chat(&mut self) {
        if let Some(chat) = self.chat.take() {
            chat.stop();
        }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Fetches an in-game page.
    ///
    /// Full pages are served from cache unless `skip_cache` is set. A page
    /// showing a logged-out state triggers one re-login and one retry; a
    /// second loss yields [`SessionError::NotAuthenticated`].
    #[instrument(skip_all, fields(page = %kind))]
    pub async fn fetch_page(
        &mut self,
        kind: PageKind,
        opts: FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Page, SessionError> {
        self.ensure_bound()?;

        if kind.is_full_page() && !opts.skip_cache {
            let key = (kind.component().to_string(), opts.force_planet);
            if let Some(page) = self.state.pages.get(&key) {
                debug!("Serving cached page");
                let mut page = page.clone();
                page.from_cache = true;
                return Ok(page);
            }
        }

        let mut relogged = false;
        loop {
            let strategy = self.strategy_or_unauthenticated()?;
            let body = self.get_game_page(&kind, opts.force_planet, cancel).await?;

            if strategy.is_logged_out(&body) {
                self.mark_logged_out();
                self.publish();
                if opts.skip_retry_on_auth_loss || relogged {
                    warn!(relogged, "Page shows logged-out state");
                    return Err(SessionError::NotAuthenticated);
                }
                info!("Session lost, logging in again");
                relogged = true;
                self.login(cancel).await?;
                continue;
            }

            self.record_token(&kind, &body, &strategy);
            let planet_id = strategy.extract_planet_id(&body).or(opts.force_planet);
            let page = Page::new(kind.clone(), planet_id, body);
            if kind.is_full_page() {
                self.absorb_full_page(page.clone(), opts.force_planet, &strategy);
            }
            self.publish();
            return Ok(page);
        }
    }

    async fn get_game_page(
        &self,
        kind: &PageKind,
        planet: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let url = self.page_url(kind, planet, &[])?;
        let response = self.lobby.client().get(url.as_str(), cancel).await?;
        check_upstream(&response)?;
        Ok(response.text())
    }

    fn page_url(
        &self,
        kind: &PageKind,
        planet: Option<i64>,
        extra: &[(String, String)],
    ) -> Result<Url, SessionError> {
        game_url(&self.state.snapshot.server_url, kind, planet, extra)
    }

    /// Updates derived state from a full page and caches it.
    fn absorb_full_page(&mut self, page: Page, requested_planet: Option<i64>, strategy: &Strategy) {
        let snapshot = &mut self.state.snapshot;
        if let Some(offset) = strategy
            .extract_server_time(&page.body)
            .and_then(|t| server_offset(t, Utc::now().naive_utc()))
        {
            snapshot.server_offset = Some(offset);
        }
        if let Some(planet_id) = strategy.extract_planet_id(&page.body) {
            snapshot.planet_id = Some(planet_id);
        }
        if let Some(resources) = strategy.extract_resources(&page.body) {
            snapshot.resources = Some(resources);
        }
        snapshot.lifeform_enabled = strategy.extract_lifeform_enabled(&page.body);

        let key = (page.kind.component().to_string(), requested_planet);
        self.state.pages.insert(key, page);
    }

    fn record_token(&mut self, kind: &PageKind, body: &str, strategy: &Strategy) {
        if let Some(token) = strategy.extract_token(body) {
            self.store_token(kind, token);
        }
    }

    fn store_token(&mut self, kind: &PageKind, token: String) {
        self.state.tokens.insert(
            kind.component().to_string(),
            CachedToken {
                value: token,
                captured_at: Instant::now(),
            },
        );
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Submits a form on an in-game page.
    ///
    /// The origin page's anti-forgery token is refreshed first when missing
    /// or older than `token_max_age`.
    #[instrument(skip_all, fields(action = %action.name))]
    pub async fn perform_action(
        &mut self,
        action: ActionSpec,
        cancel: &CancellationToken,
    ) -> Result<ActionResult, SessionError> {
        self.ensure_bound()?;

        let mut relogged = false;
        loop {
            let token = self.ensure_token(&action, relogged, cancel).await?;
            let strategy = self.strategy_or_unauthenticated()?;

            let url = self.page_url(&action.origin, action.planet, &action.query)?;
            let mut form = action.form.clone();
            form.push(("token".to_string(), token));

            let client = self.lobby.client();
            let request = client.request(Method::POST, url.as_str()).form(&form);
            let response = client.execute(request, cancel).await?;
            check_upstream(&response)?;

            let status = response.status.as_u16();
            let body = response.text();
            let json = serde_json::from_str::<Value>(&body).ok();

            if json.is_none() && looks_like_html(&body) && strategy.is_logged_out(&body) {
                self.mark_logged_out();
                self.publish();
                if action.skip_retry_on_auth_loss || relogged {
                    return Err(SessionError::NotAuthenticated);
                }
                info!("Session lost during action, logging in again");
                relogged = true;
                self.login(cancel).await?;
                continue;
            }

            // Tokens are single use.
            self.state.tokens.remove(action.origin.component());
            match json.as_ref().and_then(|v| v.get("newAjaxToken")).and_then(Value::as_str) {
                Some(fresh) => self.store_token(&action.origin, fresh.to_string()),
                None => self.record_token(&action.origin, &body, &strategy),
            }

            debug!(status, "Action completed");
            return Ok(ActionResult { status, body, json });
        }
    }

    async fn ensure_token(
        &mut self,
        action: &ActionSpec,
        relogged: bool,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let key = action.origin.component().to_string();
        let max_age = self.settings.token_max_age;
        if let Some(cached) = self.state.tokens.get(&key) {
            if cached.captured_at.elapsed() < max_age {
                return Ok(cached.value.clone());
            }
            debug!(page = %key, "Cached token is stale");
        }

        let opts = FetchOptions {
            skip_cache: true,
            skip_retry_on_auth_loss: action.skip_retry_on_auth_loss || relogged,
            force_planet: action.planet,
        };
        self.fetch_page(action.origin.clone(), opts, cancel).await?;

        self.state
            .tokens
            .get(&key)
            .map(|t| t.value.clone())
            .ok_or(SessionError::MissingToken(key))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Copy of the session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot.clone()
    }

    /// Snapshot cell updated after every mutation.
    pub fn shared_snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.published)
    }

    /// Universe metadata.
    pub fn server_data(&self) -> Option<&ServerData> {
        self.state.snapshot.server_data.as_ref()
    }

    /// Whether the session is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.state.snapshot.logged_in
    }

    /// Lobby bearer token; empty when not authenticated.
    pub fn bearer_token(&self) -> &str {
        &self.state.snapshot.bearer_token
    }

    /// Played account.
    pub fn account(&self) -> Option<&Account> {
        self.state.account.as_ref()
    }

    /// Active strategy.
    pub fn strategy(&self) -> Option<Arc<Strategy>> {
        self.state.strategy.clone()
    }

    /// HTTP usage counters.
    pub fn client_stats(&self) -> StatsSnapshot {
        self.lobby.client().stats_snapshot()
    }

    /// Whether the last chat handshake succeeded.
    pub fn chat_connected(&self) -> bool {
        self.chat.as_ref().is_some_and(ChatSupervisor::is_connected)
    }

    /// Settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn ensure_bound(&self) -> Result<(), SessionError> {
        if self.state.snapshot.server_url.is_empty() || self.state.strategy.is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        Ok(())
    }

    fn strategy_or_unauthenticated(&self) -> Result<Arc<Strategy>, SessionError> {
        self.state
            .strategy
            .clone()
            .ok_or(SessionError::NotAuthenticated)
    }

    fn publish(&self) {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        *published = self.state.snapshot.clone();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop_chat();
    }
}

/// Builds `{server}/game/index.php?page=ingame&component=..` with every
/// extra pair form-encoded.
fn game_url(
    server_url: &str,
    kind: &PageKind,
    planet: Option<i64>,
    extra: &[(String, String)],
) -> Result<Url, SessionError> {
    let base = format!("{server_url}/game/index.php");
    let mut url = Url::parse(&base)
        .map_err(|e| SessionError::InvalidResponse(format!("Invalid server URL {base}: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("page", "ingame")
            .append_pair("component", kind.component());
        for (key, value) in extra {
            query.append_pair(key, value);
        }
        if let Some(cp) = planet {
            query.append_pair("cp", &cp.to_string());
        }
    }
    Ok(url)
}

/// Offset between the server clock and UTC, rounded to 15 minutes.
fn server_offset(server_time: NaiveDateTime, utc_now: NaiveDateTime) -> Option<FixedOffset> {
    let diff = (server_time - utc_now).num_seconds();
    let rounded = (diff + OFFSET_GRANULARITY_SECS / 2).div_euclid(OFFSET_GRANULARITY_SECS)
        * OFFSET_GRANULARITY_SECS;
    FixedOffset::east_opt(i32::try_from(rounded).ok()?)
}

fn looks_like_html(body: &str) -> bool {
    let head = body.get(..512).unwrap_or(body);
    head.to_ascii_lowercase().contains("<html") || head.trim_start().starts_with("<!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 24)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_server_offset_rounds_to_quarter_hour() {
        let utc = at(12, 0, 0);
        assert_eq!(
            server_offset(at(14, 0, 3), utc),
            FixedOffset::east_opt(2 * 3600)
        );
        assert_eq!(
            server_offset(at(11, 59, 58), utc),
            FixedOffset::east_opt(0)
        );
        assert_eq!(
            server_offset(at(6, 31, 0), utc),
            FixedOffset::west_opt(5 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<!DOCTYPE html><html>"));
        assert!(looks_like_html("  <HTML lang=\"en\">"));
        assert!(!looks_like_html("{\"status\":\"ok\"}"));
        assert!(!looks_like_html("OK"));
    }

    #[test]
    fn test_game_url_encodes_query() {
        let extra = vec![("message".to_string(), "hi & bye=1#x".to_string())];
        let url = game_url(
            "https://s180-en.ogame.gameforge.com",
            &PageKind::Supplies,
            Some(33_677_371),
            &extra,
        )
        .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "ingame".to_string()),
                ("component".to_string(), "supplies".to_string()),
                ("message".to_string(), "hi & bye=1#x".to_string()),
                ("cp".to_string(), "33677371".to_string()),
            ]
        );
        assert!(url.fragment().is_none());
        assert_eq!(url.path(), "/game/index.php");
    }

    #[test]
    fn test_game_url_rejects_unbound_server() {
        assert!(matches!(
            game_url("", &PageKind::Overview, None, &[]),
            Err(SessionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_fetch_options() {
        let opts = FetchOptions::fresh().with_planet(7).without_retry();
        assert!(opts.skip_cache);
        assert!(opts.skip_retry_on_auth_loss);
        assert_eq!(opts.force_planet, Some(7));
    }

    #[test]
    fn test_action_spec_builder() {
        let action = ActionSpec::new("build", PageKind::Supplies)
            .with_query("modus", "1")
            .with_field("technologyId", "1")
            .with_planet(33_677_371);
        assert_eq!(action.query, vec![("modus".to_string(), "1".to_string())]);
        assert_eq!(action.form.len(), 1);
        assert_eq!(action.planet, Some(33_677_371));
    }

    #[tokio::test]
    async fn test_unbound_controller_rejects_pages() {
        let mut controller = SessionController::new(
            SessionSettings::new("Zibal", "en"),
            Credentials::new("user@example.com", "secret"),
        )
        .unwrap();
        let cancel = CancellationToken::new();
        assert_eq!(
            controller
                .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
                .await,
            Err(SessionError::NotAuthenticated)
        );
        assert!(!controller.is_logged_in());
    }
}
