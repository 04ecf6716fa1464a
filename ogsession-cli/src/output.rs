//! Output formatting for CLI.

use anyhow::Result;
use ogsession_core::{Page, Resources, SessionSnapshot};
use serde::Serialize;

/// Session summary. Never carries the bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe: Option<String>,
    pub server_url: String,
    pub player_id: i64,
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planet_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    pub lifeform_enabled: bool,
}

impl From<&SessionSnapshot> for SessionOutput {
    fn from(s: &SessionSnapshot) -> Self {
        Self {
            logged_in: s.logged_in,
            universe: s.server_data.as_ref().map(|d| d.name.clone()),
            server_url: s.server_url.clone(),
            player_id: s.player_id,
            player_name: s.player_name.clone(),
            strategy: s.strategy.clone(),
            server_version: s.server_data.as_ref().map(|d| d.version.clone()),
            language: s.language.clone(),
            server_time: s
                .server_time()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S %:z").to_string()),
            planet_id: s.planet_id,
            resources: s.resources,
            lifeform_enabled: s.lifeform_enabled,
        }
    }
}

/// Page summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planet_id: Option<i64>,
    pub bytes: usize,
    pub from_cache: bool,
    pub fetched_at: String,
}

impl From<&Page> for PageOutput {
    fn from(p: &Page) -> Self {
        Self {
            page: p.kind.to_string(),
            planet_id: p.planet_id,
            bytes: p.body.len(),
            from_cache: p.from_cache,
            fetched_at: p.fetched_at.to_rfc3339(),
        }
    }
}

/// Prints any serializable value as JSON.
pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

pub fn print_session(s: &SessionOutput) {
    println!(
        "{} ({})",
        s.universe.as_deref().unwrap_or("<unbound>"),
        s.server_url
    );
    println!("{}", "─".repeat(40));
    println!("Player:    {} ({})", s.player_name, s.player_id);
    println!(
        "Version:   {} via {}",
        s.server_version.as_deref().unwrap_or("?"),
        s.strategy.as_deref().unwrap_or("?")
    );
    println!("Language:  {}", s.language);
    if let Some(time) = &s.server_time {
        println!("Time:      {time}");
    }
    if let Some(planet) = s.planet_id {
        println!("Planet:    {planet}");
    }
    if let Some(r) = &s.resources {
        println!(
            "Resources: M {} / C {} / D {} / E {} / DM {}",
            r.metal, r.crystal, r.deuterium, r.energy, r.darkmatter
        );
    }
    println!("Lifeforms: {}", if s.lifeform_enabled { "yes" } else { "no" });
}

pub fn print_page(p: &PageOutput) {
    let planet = p.planet_id.map(|id| format!(" planet {id}")).unwrap_or_default();
    let source = if p.from_cache { "cache" } else { "network" };
    println!("{}{planet}: {} bytes from {source}", p.page, p.bytes);
}
