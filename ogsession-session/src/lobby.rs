//! Gameforge lobby API.
//!
//! Thin request/response layer over the account service, the lobby, and the
//! universe metadata endpoint. Status codes are mapped to [`SessionError`]
//! here so the login machine only deals with typed outcomes.

use ogsession_core::{
    Account, Credentials, DeviceFingerprint, Server, ServerData, SessionError,
};
use ogsession_fetch::{BufferedResponse, Method, RateLimitedClient, StatusCode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::settings::Endpoints;
use crate::totp;

/// Response header carrying the challenge id.
pub const CHALLENGE_HEADER: &str = "gf-challenge-id";

/// Header carrying the one-time passcode.
const OTP_HEADER: &str = "tnt-2fa-code";

/// Header sent alongside the passcode.
const INSTALLATION_HEADER: &str = "tnt-installation-id";

/// Prefix of the blackbox value.
const BLACKBOX_PREFIX: &str = "tra:";

static GAME_ENVIRONMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""gameEnvironmentId":"([^"]+)""#).expect("Invalid regex"));

static PLATFORM_GAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""platformGameId":"([^"]+)""#).expect("Invalid regex"));

static XML_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+)>([^<]*)</\w+>").expect("Invalid regex"));

// ============================================================================
// Wire Types
// ============================================================================

/// Identifiers read from the lobby's `configuration.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfiguration {
    /// `gameEnvironmentId`.
    pub game_environment_id: String,
    /// `platformGameId`.
    pub platform_game_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    identity: &'a str,
    password: &'a str,
    locale: &'a str,
    gf_lang: &'a str,
    platform_game_id: &'a str,
    blackbox: String,
    game_environment_id: &'a str,
    auto_game_account_creation: bool,
}

#[derive(Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Deserialize)]
struct FailureReason {
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginLinkRequest<'a> {
    blackbox: String,
    id: i64,
    clicked_button: &'a str,
    server: LoginLinkServer<'a>,
}

#[derive(Serialize)]
struct LoginLinkServer<'a> {
    language: &'a str,
    number: i64,
}

#[derive(Deserialize)]
struct LoginLinkResponse {
    url: String,
}

// ============================================================================
// Lobby API
// ============================================================================

/// Lobby endpoints bound to one HTTP client and device fingerprint.
#[derive(Clone)]
pub struct LobbyApi {
    client: RateLimitedClient,
    endpoints: Endpoints,
    fingerprint: Arc<dyn DeviceFingerprint>,
}

impl std::fmt::Debug for LobbyApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LobbyApi")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl LobbyApi {
    /// Creates the API wrapper.
    pub fn new(
        client: RateLimitedClient,
        endpoints: Endpoints,
        fingerprint: Arc<dyn DeviceFingerprint>,
    ) -> Self {
        Self {
            client,
            endpoints,
            fingerprint,
        }
    }

    /// The HTTP client.
    pub fn client(&self) -> &RateLimitedClient {
        &self.client
    }

    /// The endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Reads `gameEnvironmentId` and `platformGameId` from the lobby config.
    #[instrument(skip_all)]
    pub async fn configuration(
        &self,
        cancel: &CancellationToken,
    ) -> Result<GameConfiguration, SessionError> {
        let url = format!("{}/config/configuration.js", self.endpoints.lobby_base);
        let response = self.client.get(&url, cancel).await?;
        check_upstream(&response)?;
        let body = response.text();

        let capture = |re: &Regex, what: &str| {
            re.captures(&body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| SessionError::InvalidResponse(format!("{what} not found")))
        };

        Ok(GameConfiguration {
            game_environment_id: capture(&GAME_ENVIRONMENT_RE, "gameEnvironmentId")?,
            platform_game_id: capture(&PLATFORM_GAME_RE, "platformGameId")?,
        })
    }

    /// Submits credentials and returns the bearer token.
    ///
    /// Status mapping:
    /// - `409` with a challenge header: [`SessionError::ChallengeRequired`]
    /// - `403`: [`SessionError::AccountBlocked`]
    /// - `>= 500`: [`SessionError::UpstreamUnavailable`]
    /// - OTP reasons: [`SessionError::OtpRequired`] / [`SessionError::OtpInvalid`]
    /// - any other non-`201`: [`SessionError::BadCredentials`]
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn create_session(
        &self,
        credentials: &Credentials,
        config: &GameConfiguration,
        challenge_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let payload = SessionRequest {
            identity: &credentials.username,
            password: &credentials.password,
            locale: "en_GB",
            gf_lang: "en",
            platform_game_id: &config.platform_game_id,
            blackbox: self.blackbox()?,
            game_environment_id: &config.game_environment_id,
            auto_game_account_creation: false,
        };

        let url = format!("{}/api/v1/auth/thin/sessions", self.endpoints.auth_base);
        let mut request = self.client.request(Method::POST, &url).json(&payload);
        if let Some(id) = challenge_id {
            request = request.header(CHALLENGE_HEADER, id);
        }
        if let Some(secret) = credentials.otp_secret.as_deref() {
            debug!("Attaching one-time passcode");
            request = request
                .header(OTP_HEADER, totp::generate(secret)?)
                .header(INSTALLATION_HEADER, "");
        }

        let response = self.client.execute(request, cancel).await?;
        let status = response.status;

        if status == StatusCode::CONFLICT {
            if let Some(id) = challenge_id_from(&response) {
                debug!(challenge_id = %id, "Challenge required");
                return Err(SessionError::ChallengeRequired { challenge_id: id });
            }
        }
        if status == StatusCode::FORBIDDEN {
            warn!(body = %response.text(), "Account blocked");
            return Err(SessionError::AccountBlocked);
        }
        check_upstream(&response)?;
        if status != StatusCode::CREATED {
            return Err(match response.json::<FailureReason>() {
                Ok(r) if r.reason == "OTP_REQUIRED" => SessionError::OtpRequired,
                Ok(r) if r.reason == "OTP_INVALID" => SessionError::OtpInvalid,
                _ => SessionError::BadCredentials,
            });
        }

        let session: SessionResponse = response.json()?;
        Ok(session.token)
    }

    /// Lists the game accounts of the bearer token's user.
    ///
    /// `401`/`403` mean the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn accounts(
        &self,
        bearer_token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Account>, SessionError> {
        let url = format!("{}/api/users/me/accounts", self.endpoints.lobby_base);
        let request = self
            .client
            .request(Method::GET, &url)
            .bearer_auth(bearer_token);
        let response = self.client.execute(request, cancel).await?;

        if matches!(
            response.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(SessionError::NotAuthenticated);
        }
        check_upstream(&response)?;
        response
            .json()
            .map_err(|e| SessionError::InvalidResponse(format!("accounts: {e}")))
    }

    /// Lists every universe of the lobby.
    #[instrument(skip_all)]
    pub async fn servers(&self, cancel: &CancellationToken) -> Result<Vec<Server>, SessionError> {
        let url = format!("{}/api/servers", self.endpoints.lobby_base);
        let response = self.client.get(&url, cancel).await?;
        check_upstream(&response)?;
        response
            .json()
            .map_err(|e| SessionError::InvalidResponse(format!("servers: {e}")))
    }

    /// Requests a one-shot login link for an account.
    #[instrument(skip_all, fields(account = account.id))]
    pub async fn login_link(
        &self,
        bearer_token: &str,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let payload = LoginLinkRequest {
            blackbox: self.blackbox()?,
            id: account.id,
            clicked_button: "account_list",
            server: LoginLinkServer {
                language: &account.server.language,
                number: account.server.number,
            },
        };
        let url = format!("{}/api/users/me/loginLink", self.endpoints.lobby_base);
        let request = self
            .client
            .request(Method::POST, &url)
            .bearer_auth(bearer_token)
            .json(&payload);
        let response = self.client.execute(request, cancel).await?;

        if response.status == StatusCode::BAD_REQUEST && response.text().trim() == "[]" {
            return Err(SessionError::LoginLinkUnavailable);
        }
        if matches!(
            response.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(SessionError::NotAuthenticated);
        }
        check_upstream(&response)?;
        let link: LoginLinkResponse = response
            .json()
            .map_err(|e| SessionError::InvalidResponse(format!("login link: {e}")))?;
        Ok(link.url)
    }

    /// Follows a login link and returns the landing page body.
    #[instrument(skip_all)]
    pub async fn open_login_link(
        &self,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let response = self.client.get(link, cancel).await?;
        check_upstream(&response)?;
        Ok(response.text())
    }

    /// Fetches `{server_url}/api/serverData.xml`.
    #[instrument(skip_all, fields(server_url = %server_url))]
    pub async fn server_data(
        &self,
        server_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ServerData, SessionError> {
        let url = format!("{server_url}/api/serverData.xml");
        let response = self.client.get(&url, cancel).await?;
        check_upstream(&response)?;
        if !response.status.is_success() {
            return Err(SessionError::InvalidResponse(format!(
                "server data returned {}",
                response.status
            )));
        }
        parse_server_data(&response.text())
    }

    fn blackbox(&self) -> Result<String, SessionError> {
        Ok(format!("{BLACKBOX_PREFIX}{}", self.fingerprint.blackbox()?))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps 5xx responses to [`SessionError::UpstreamUnavailable`].
pub(crate) fn check_upstream(response: &BufferedResponse) -> Result<(), SessionError> {
    if response.status.is_server_error() {
        return Err(SessionError::UpstreamUnavailable(format!(
            "{} returned {}",
            response.url.path(),
            response.status
        )));
    }
    Ok(())
}

/// Challenge id from `gf-challenge-id: <id>;<base url>`.
fn challenge_id_from(response: &BufferedResponse) -> Option<String> {
    let raw = response.header(CHALLENGE_HEADER)?;
    let id = raw.split(';').next()?.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Picks the universe and account to play.
///
/// An explicit player id wins; otherwise the universe is matched by name
/// (case-insensitive) and language.
pub fn find_server_account(
    accounts: &[Account],
    servers: &[Server],
    universe: &str,
    language: &str,
    player_id: Option<i64>,
) -> Result<(Server, Account), SessionError> {
    if let Some(id) = player_id {
        let account = accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| SessionError::AccountNotFound(format!("player id {id}")))?;
        let identity = account.identity();
        let server = servers
            .iter()
            .find(|s| s.identity() == identity)
            .ok_or_else(|| SessionError::ServerNotFound(identity.to_string()))?;
        return Ok((server.clone(), account.clone()));
    }

    let server = servers
        .iter()
        .find(|s| s.matches(universe, language))
        .ok_or_else(|| SessionError::ServerNotFound(format!("{universe}-{language}")))?;
    let identity = server.identity();
    let account = accounts
        .iter()
        .find(|a| a.identity() == identity)
        .ok_or_else(|| SessionError::AccountNotFound(format!("{universe}-{language}")))?;
    Ok((server.clone(), account.clone()))
}

/// Parses the flat `serverData.xml` document.
pub fn parse_server_data(xml: &str) -> Result<ServerData, SessionError> {
    let fields: HashMap<&str, &str> = XML_FIELD_RE
        .captures_iter(xml)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str().trim())))
        .collect();

    let text = |key: &str| fields.get(key).map(|v| (*v).to_string()).unwrap_or_default();
    let int = |key: &str| fields.get(key).and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    let float = |key: &str| fields.get(key).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);
    let flag = |key: &str| fields.get(key).is_some_and(|v| *v == "1" || *v == "true");

    let data = ServerData {
        name: text("name"),
        number: int("number"),
        language: text("language"),
        timezone: text("timezone"),
        timezone_offset: text("timezoneOffset"),
        version: text("version"),
        speed: int("speed"),
        research_duration_divisor: float("researchDurationDivisor"),
        speed_fleet_peaceful: int("speedFleetPeaceful"),
        speed_fleet_war: int("speedFleetWar"),
        speed_fleet_holding: int("speedFleetHolding"),
        galaxies: int("galaxies"),
        systems: int("systems"),
        donut_galaxy: flag("donutGalaxy"),
        donut_system: flag("donutSystem"),
        global_deuterium_save_factor: float("globalDeuteriumSaveFactor"),
        fleet_ignore_empty_systems: flag("fleetIgnoreEmptySystems"),
        fleet_ignore_inactive_systems: flag("fleetIgnoreInactiveSystems"),
    };

    if data.version.is_empty() {
        return Err(SessionError::InvalidResponse(
            "server data has no version".to_string(),
        ));
    }
    Ok(data)
}
