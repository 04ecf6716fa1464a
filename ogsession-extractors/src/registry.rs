//! Strategy registry.
//!
//! Maps a server version string to the strategy that knows how to read its
//! pages. The table is built once and is read-only afterwards.

use ogsession_core::SessionError;
use regex::Regex;
use semver::Version;
use std::sync::{Arc, LazyLock, OnceLock};
use tracing::debug;

use crate::layer::ExtractorLayer;
use crate::strategy::Strategy;
use crate::versions::{BaseLayer, V9Layer, V11Layer, V12Layer};

// ============================================================================
// Static Registry
// ============================================================================

/// Strategies ordered newest to oldest.
static STRATEGIES: OnceLock<Vec<Arc<Strategy>>> = OnceLock::new();

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("Invalid regex"));

/// Which layer stack a table entry uses.
#[derive(Debug, Clone, Copy)]
enum Family {
    V7,
    V9,
    V11,
    V12,
}

/// Known minimum versions, newest first.
const TABLE: &[((u64, u64, u64), Family)] = &[
    ((12, 0, 0), Family::V12),
    ((11, 15, 0), Family::V11),
    ((11, 13, 0), Family::V11),
    ((11, 9, 0), Family::V11),
    ((11, 0, 0), Family::V11),
    ((10, 4, 0), Family::V9),
    ((10, 0, 0), Family::V9),
    ((9, 0, 0), Family::V9),
    ((8, 7, 4), Family::V7),
    ((8, 0, 0), Family::V7),
    ((7, 1, 0), Family::V7),
    ((7, 0, 0), Family::V7),
];

fn layers_for(family: Family) -> Vec<Arc<dyn ExtractorLayer>> {
    let base: Arc<dyn ExtractorLayer> = Arc::new(BaseLayer);
    let v9: Arc<dyn ExtractorLayer> = Arc::new(V9Layer);
    let v11: Arc<dyn ExtractorLayer> = Arc::new(V11Layer);
    let v12: Arc<dyn ExtractorLayer> = Arc::new(V12Layer);

    match family {
        Family::V7 => vec![base],
        Family::V9 => vec![v9, base],
        Family::V11 => vec![v11, v9, base],
        Family::V12 => vec![v12, v11, v9, base],
    }
}

fn init_strategies() -> Vec<Arc<Strategy>> {
    let mut strategies = Vec::with_capacity(TABLE.len());
    let mut newer: Option<Version> = None;

    for &((major, minor, patch), family) in TABLE {
        let min = Version::new(major, minor, patch);
        strategies.push(Arc::new(Strategy::new(
            min.clone(),
            newer.take(),
            layers_for(family),
        )));
        newer = Some(min);
    }

    strategies
}

// ============================================================================
// Strategy Registry
// ============================================================================

/// Global registry of page strategies.
pub struct StrategyRegistry;

impl StrategyRegistry {
    /// Returns all strategies, newest first.
    pub fn all() -> &'static [Arc<Strategy>] {
        STRATEGIES.get_or_init(init_strategies)
    }

    /// Returns the number of strategies.
    pub fn len() -> usize {
        Self::all().len()
    }

    /// Returns the newest strategy.
    pub fn latest() -> Option<Arc<Strategy>> {
        Self::all().first().cloned()
    }

    /// Extracts and parses the `major.minor.patch` part of a version string.
    ///
    /// Suffixes such as `-beta1` or a fourth component are ignored.
    pub fn parse_version(raw: &str) -> Option<Version> {
        let found = VERSION_RE.find(raw)?;
        Version::parse(found.as_str()).ok()
    }

    /// Returns the strategy for a server version.
    ///
    /// Versions newer than the newest entry resolve to it.
    pub fn resolve(version: &str) -> Result<Arc<Strategy>, SessionError> {
        let parsed = Self::parse_version(version)
            .ok_or_else(|| SessionError::UnsupportedVersion(version.to_string()))?;

        let strategy = Self::all()
            .iter()
            .find(|s| *s.min() <= parsed)
            .cloned()
            .ok_or_else(|| SessionError::UnsupportedVersion(version.to_string()))?;

        debug!(version, strategy = %strategy.min(), "Resolved strategy");
        Ok(strategy)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ogsession_core::PageExtractor;

    #[test]
    fn test_registry_has_12_entries() {
        assert_eq!(StrategyRegistry::len(), 12);
    }

    #[test]
    fn test_ranges_chain_without_gaps() {
        let all = StrategyRegistry::all();
        assert!(all[0].max().is_none());
        for pair in all.windows(2) {
            assert_eq!(pair[1].max(), Some(pair[0].min()));
        }
    }

    #[test]
    fn test_resolve_picks_range() {
        let cases = [
            ("7.0.0", "v7.0.0"),
            ("7.6.3", "v7.1.0"),
            ("8.7.3", "v8.0.0"),
            ("8.7.4", "v8.7.4"),
            ("10.4.2", "v10.4.0"),
            ("11.14.1", "v11.13.0"),
            ("11.15.0", "v11.15.0"),
            ("12.0.0", "v12.0.0"),
            ("13.2.0", "v12.0.0"),
        ];
        for (version, expected) in cases {
            let strategy = StrategyRegistry::resolve(version).unwrap();
            assert_eq!(strategy.name(), expected, "version {version}");
            assert!(strategy.covers(&StrategyRegistry::parse_version(version).unwrap()));
        }
    }

    #[test]
    fn test_suffix_is_ignored() {
        let a = StrategyRegistry::resolve("12.3.4-beta1").unwrap();
        let b = StrategyRegistry::resolve("12.3.4").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = StrategyRegistry::resolve("11.9.0.2").unwrap();
        assert_eq!(c.name(), "v11.9.0");
    }

    #[test]
    fn test_unsupported_versions() {
        assert!(matches!(
            StrategyRegistry::resolve("6.8.8"),
            Err(SessionError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            StrategyRegistry::resolve("garbage"),
            Err(SessionError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            StrategyRegistry::resolve(""),
            Err(SessionError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for _ in 0..3 {
            let a = StrategyRegistry::resolve("9.1.0").unwrap();
            let b = StrategyRegistry::resolve("9.1.0").unwrap();
            assert!(Arc::ptr_eq(&a, &b));
        }
    }

    #[test]
    fn test_layer_stacks() {
        let latest = StrategyRegistry::latest().unwrap();
        assert_eq!(latest.layer_names(), vec!["v12", "v11", "v9", "base"]);
        let oldest = StrategyRegistry::resolve("7.0.0").unwrap();
        assert_eq!(oldest.layer_names(), vec!["base"]);
    }
}
