//! Read-only session snapshots.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::page::Resources;
use super::server::{ServerData, ServerIdentity};

/// Host and port of the in-game chat socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEndpoint {
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl fmt::Display for ChatEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Point-in-time copy of the session state, handed out to callers.
///
/// The live state is owned by the session controller; snapshots never
/// alias it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Lobby bearer token, empty when not authenticated.
    pub bearer_token: String,
    /// Bound universe.
    pub server: Option<ServerIdentity>,
    /// Base URL of the bound universe.
    pub server_url: String,
    /// Universe metadata.
    pub server_data: Option<ServerData>,
    /// Name of the active extraction strategy.
    pub strategy: Option<String>,
    /// In-game session marker.
    pub session_marker: String,
    /// Player id.
    pub player_id: i64,
    /// Player name.
    pub player_name: String,
    /// Language used for page extraction.
    pub language: String,
    /// Server clock offset from UTC, derived from the last full page.
    /// Serialized as seconds east of UTC.
    #[serde(default, with = "offset_seconds")]
    pub server_offset: Option<FixedOffset>,
    /// Planet the last full page was rendered for.
    pub planet_id: Option<i64>,
    /// Last resource snapshot.
    pub resources: Option<Resources>,
    /// Whether lifeforms are enabled on this universe.
    pub lifeform_enabled: bool,
    /// Logged-in flag.
    pub logged_in: bool,
    /// Connected flag.
    pub connected: bool,
    /// When the session was last bound.
    pub bound_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Returns the current server time, if the offset is known.
    pub fn server_time(&self) -> Option<DateTime<FixedOffset>> {
        self.server_offset.map(|offset| Utc::now().with_timezone(&offset))
    }
}

mod offset_seconds {
    use chrono::FixedOffset;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        offset: &Option<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match offset {
            Some(o) => serializer.serialize_some(&o.local_minus_utc()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<FixedOffset>, D::Error> {
        Option::<i32>::deserialize(deserializer)?
            .map(|secs| {
                FixedOffset::east_opt(secs)
                    .ok_or_else(|| D::Error::custom(format!("offset out of range: {secs}")))
            })
            .transpose()
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("bearer_token", &(!self.bearer_token.is_empty()).then_some("<redacted>"))
            .field("server", &self.server)
            .field("strategy", &self.strategy)
            .field("player_name", &self.player_name)
            .field("planet_id", &self.planet_id)
            .field("logged_in", &self.logged_in)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}
