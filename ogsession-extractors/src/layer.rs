//! Extraction layers.
//!
//! A layer knows how one family of server versions renders a handful of
//! values. Every method defaults to `None`, meaning "not my concern, ask the
//! next layer". Strategies stack layers newest first.

use chrono::NaiveDateTime;
use ogsession_core::{ChatEndpoint, Resources};
use std::fmt;

/// One version family's extraction rules.
pub trait ExtractorLayer: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Session marker (`ogame-session`).
    fn session_marker(&self, _page: &str) -> Option<String> {
        None
    }

    /// Game version string.
    fn server_version(&self, _page: &str) -> Option<String> {
        None
    }

    /// Logged-out verdict.
    fn is_logged_out(&self, _page: &str) -> Option<bool> {
        None
    }

    /// Anti-forgery token.
    fn token(&self, _page: &str) -> Option<String> {
        None
    }

    /// Server wall clock.
    fn server_time(&self, _page: &str) -> Option<NaiveDateTime> {
        None
    }

    /// Current planet id.
    fn planet_id(&self, _page: &str) -> Option<i64> {
        None
    }

    /// Resource bar.
    fn resources(&self, _page: &str) -> Option<Resources> {
        None
    }

    /// Chat socket endpoint.
    fn chat_endpoint(&self, _page: &str) -> Option<ChatEndpoint> {
        None
    }

    /// Lifeform flag.
    fn lifeform_enabled(&self, _page: &str) -> Option<bool> {
        None
    }

    /// Interface language.
    fn language(&self, _page: &str) -> Option<String> {
        None
    }
}

/// Returns the first capture group of `re` in `page`.
pub(crate) fn capture(re: &regex::Regex, page: &str) -> Option<String> {
    re.captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
