//! Base layer: page layout shared by every version since 7.0.0.

use chrono::NaiveDateTime;
use ogsession_core::{ChatEndpoint, Resources};
use regex::Regex;
use std::sync::LazyLock;

use crate::layer::{ExtractorLayer, capture};

// ============================================================================
// Patterns
// ============================================================================

static SESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="ogame-session"\s+content="([^"]*)""#).expect("Invalid regex")
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="ogame-version"\s+content="([^"]*)""#).expect("Invalid regex")
});

static PLANET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="ogame-planet-id"\s+content="(\d+)""#).expect("Invalid regex")
});

static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="ogame-language"\s+content="([a-zA-Z]{2})""#)
        .expect("Invalid regex")
});

/// Hidden form field, attributes in any order.
static TOKEN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]*name=["']token["'][^>]*value=["']([^"']+)["']"#)
        .expect("Invalid regex")
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="OGameClock"[^>]*>(.*?)</(?:div|li)>"#).expect("Invalid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

static RESOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"id="resources_(metal|crystal|deuterium|energy|darkmatter)"[^>]*data-raw="(-?[\d.]+)""#,
    )
    .expect("Invalid regex")
});

static NODE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"var nodeUrl\s?=\s?"https:\\/\\/([^:]+):(\d+)\\/socket\.io\\/socket\.io\.js""#)
        .expect("Invalid regex")
});

const CLOCK_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

// ============================================================================
// Layer
// ============================================================================

/// Meta tags, the hidden token input, the clock, the resource bar, and the
/// chat bootstrap script.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseLayer;

impl ExtractorLayer for BaseLayer {
    fn name(&self) -> &'static str {
        "base"
    }

    fn session_marker(&self, page: &str) -> Option<String> {
        capture(&SESSION_RE, page).filter(|s| !s.is_empty())
    }

    fn server_version(&self, page: &str) -> Option<String> {
        capture(&VERSION_RE, page).filter(|s| !s.is_empty())
    }

    fn is_logged_out(&self, page: &str) -> Option<bool> {
        Some(self.session_marker(page).is_none())
    }

    fn token(&self, page: &str) -> Option<String> {
        capture(&TOKEN_INPUT_RE, page)
    }

    fn server_time(&self, page: &str) -> Option<NaiveDateTime> {
        let raw = capture(&CLOCK_RE, page)?;
        let text = TAG_RE.replace_all(&raw, " ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        NaiveDateTime::parse_from_str(&text, CLOCK_FORMAT).ok()
    }

    fn planet_id(&self, page: &str) -> Option<i64> {
        capture(&PLANET_RE, page)?.parse().ok()
    }

    fn resources(&self, page: &str) -> Option<Resources> {
        parse_resource_pairs(&RESOURCE_RE, page)
    }

    fn chat_endpoint(&self, page: &str) -> Option<ChatEndpoint> {
        let caps = NODE_URL_RE.captures(page)?;
        Some(ChatEndpoint {
            host: caps.get(1)?.as_str().to_string(),
            port: caps.get(2)?.as_str().parse().ok()?,
        })
    }

    fn language(&self, page: &str) -> Option<String> {
        capture(&LANGUAGE_RE, page).map(|l| l.to_ascii_lowercase())
    }
}

/// Collects `(name, amount)` captures into a [`Resources`].
///
/// Returns `None` unless at least the metal amount was found.
pub(crate) fn parse_resource_pairs(re: &Regex, page: &str) -> Option<Resources> {
    let mut resources = Resources::default();
    let mut found_metal = false;

    for caps in re.captures_iter(page) {
        let (Some(name), Some(amount)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(value) = amount.as_str().parse::<f64>() else {
            continue;
        };
        // Amounts are whole units rendered as floats.
        #[allow(clippy::cast_possible_truncation)]
        let value = value.floor() as i64;
        match name.as_str() {
            "metal" => {
                resources.metal = value;
                found_metal = true;
            }
            "crystal" => resources.crystal = value,
            "deuterium" => resources.deuterium = value,
            "energy" => resources.energy = value,
            "darkmatter" => resources.darkmatter = value,
            _ => {}
        }
    }

    found_metal.then_some(resources)
}
