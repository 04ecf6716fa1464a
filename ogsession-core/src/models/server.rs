//! Lobby directory entries, accounts, and universe metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Server Identity
// ============================================================================

/// Numeric id plus language code of one universe (e.g. `s180-en`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Universe number.
    pub number: i64,
    /// Two-letter language code.
    pub language: String,
}

impl ServerIdentity {
    /// Creates a new identity, sanitizing the language code.
    pub fn new(number: i64, language: impl Into<String>) -> Self {
        Self {
            number,
            language: sanitize_language(&language.into()),
        }
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}-{}", self.number, self.language)
    }
}

/// Maps lobby language codes to the ones used in universe hostnames.
pub(crate) fn sanitize_language(lang: &str) -> String {
    match lang {
        "yu" => "ba".to_string(),
        other => other.to_lowercase(),
    }
}

// ============================================================================
// Lobby Directory
// ============================================================================

/// One entry of the lobby server directory (`/api/servers`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Server {
    /// Language code.
    pub language: String,
    /// Universe number.
    pub number: i64,
    /// Account group (`en_180`).
    pub account_group: String,
    /// Universe name.
    pub name: String,
    /// Registered players.
    pub player_count: i64,
    /// Players currently online.
    pub players_online: i64,
    /// Opening date.
    pub opened: String,
    /// Start date.
    pub start_date: String,
    /// Closing flag.
    pub server_closed: i64,
    /// Signup closed flag.
    pub signup_closed: i64,
}

impl Server {
    /// Returns the identity of this universe.
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity::new(self.number, &self.language)
    }

    /// Returns true if this entry matches a universe name and language.
    pub fn matches(&self, universe: &str, language: &str) -> bool {
        self.name.eq_ignore_ascii_case(universe)
            && sanitize_language(&self.language) == sanitize_language(language)
    }
}

/// Universe reference embedded in an [`Account`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountServer {
    /// Language code.
    pub language: String,
    /// Universe number.
    pub number: i64,
}

/// One game account of the logged-in lobby user (`/api/users/me/accounts`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    /// Universe the account lives in.
    pub server: AccountServer,
    /// Player id.
    pub id: i64,
    /// Player name.
    pub name: String,
    /// Last time the account was played.
    pub last_played: String,
    /// Whether the account is blocked.
    pub blocked: bool,
}

impl Account {
    /// Returns the identity of the universe this account lives in.
    pub fn identity(&self) -> ServerIdentity {
        ServerIdentity::new(self.server.number, &self.server.language)
    }
}

// ============================================================================
// Server Data
// ============================================================================

/// Universe settings published at `/api/serverData.xml`.
///
/// Fetched once per login and cached for the lifetime of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerData {
    /// Universe name.
    pub name: String,
    /// Universe number.
    pub number: i64,
    /// Language code.
    pub language: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Timezone offset as published (`+01:00`).
    pub timezone_offset: String,
    /// Game version string (`12.0.0-beta10`).
    pub version: String,
    /// Economy speed.
    pub speed: i64,
    /// Research speed multiplier.
    pub research_duration_divisor: f64,
    /// Peaceful fleet speed.
    pub speed_fleet_peaceful: i64,
    /// War fleet speed.
    pub speed_fleet_war: i64,
    /// Holding fleet speed.
    pub speed_fleet_holding: i64,
    /// Number of galaxies.
    pub galaxies: i64,
    /// Systems per galaxy.
    pub systems: i64,
    /// Galaxies wrap around.
    pub donut_galaxy: bool,
    /// Systems wrap around.
    pub donut_system: bool,
    /// Deuterium consumption factor.
    pub global_deuterium_save_factor: f64,
    /// Empty systems are skipped when computing distance.
    pub fleet_ignore_empty_systems: bool,
    /// Inactive systems are skipped when computing distance.
    pub fleet_ignore_inactive_systems: bool,
}
