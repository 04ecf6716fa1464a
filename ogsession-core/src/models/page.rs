//! Page kinds and fetched page bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Page Kind
// ============================================================================

/// In-game pages the session layer knows how to address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Overview of the current planet.
    Overview,
    /// Mines and storage.
    Supplies,
    /// Facilities.
    Facilities,
    /// Research lab.
    Research,
    /// Shipyard.
    Shipyard,
    /// Defenses.
    Defenses,
    /// Fleet dispatch.
    FleetDispatch,
    /// Fleet movements.
    Movement,
    /// Galaxy view.
    Galaxy,
    /// Messages.
    Messages,
    /// Account preferences.
    Preferences,
    /// Any other component, addressed by name.
    Other(String),
}

impl PageKind {
    /// Returns the `component` query value for this page.
    pub fn component(&self) -> &str {
        match self {
            Self::Overview => "overview",
            Self::Supplies => "supplies",
            Self::Facilities => "facilities",
            Self::Research => "research",
            Self::Shipyard => "shipyard",
            Self::Defenses => "defenses",
            Self::FleetDispatch => "fleetdispatch",
            Self::Movement => "movement",
            Self::Galaxy => "galaxy",
            Self::Messages => "messages",
            Self::Preferences => "preferences",
            Self::Other(name) => name,
        }
    }

    /// Parses a component name.
    pub fn from_component(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "overview" => Self::Overview,
            "supplies" | "resources" => Self::Supplies,
            "facilities" => Self::Facilities,
            "research" => Self::Research,
            "shipyard" => Self::Shipyard,
            "defenses" | "defense" => Self::Defenses,
            "fleetdispatch" | "fleet1" => Self::FleetDispatch,
            "movement" => Self::Movement,
            "galaxy" => Self::Galaxy,
            "messages" => Self::Messages,
            "preferences" => Self::Preferences,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true for pages carrying the full status header (resources,
    /// planet list, server clock).
    pub fn is_full_page(&self) -> bool {
        matches!(
            self,
            Self::Overview
                | Self::Supplies
                | Self::Facilities
                | Self::Research
                | Self::Shipyard
                | Self::Defenses
                | Self::FleetDispatch
                | Self::Movement
                | Self::Preferences
        )
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.component())
    }
}

// ============================================================================
// Page
// ============================================================================

/// A fetched in-game page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Which page this is.
    pub kind: PageKind,
    /// Planet the page was fetched for, if known.
    pub planet_id: Option<i64>,
    /// Raw HTML body.
    pub body: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
    /// True when the page was served from the session cache.
    pub from_cache: bool,
}

impl Page {
    /// Creates a freshly fetched page.
    pub fn new(kind: PageKind, planet_id: Option<i64>, body: impl Into<String>) -> Self {
        Self {
            kind,
            planet_id,
            body: body.into(),
            fetched_at: Utc::now(),
            from_cache: false,
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Resource snapshot of the current planet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Metal.
    pub metal: i64,
    /// Crystal.
    pub crystal: i64,
    /// Deuterium.
    pub deuterium: i64,
    /// Energy balance.
    pub energy: i64,
    /// Dark matter.
    pub darkmatter: i64,
}
