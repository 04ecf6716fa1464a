//! 9.x layer: the resource bar is seeded from an inline JSON blob.

use ogsession_core::Resources;
use regex::Regex;
use std::sync::LazyLock;

use super::base::parse_resource_pairs;
use crate::layer::ExtractorLayer;

static RELOAD_RESOURCES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(metal|crystal|deuterium|energy|darkmatter)":\{"amount":(-?[\d.]+)"#)
        .expect("Invalid regex")
});

/// Reads `reloadResources({...})` before falling back to the DOM bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct V9Layer;

impl ExtractorLayer for V9Layer {
    fn name(&self) -> &'static str {
        "v9"
    }

    fn resources(&self, page: &str) -> Option<Resources> {
        parse_resource_pairs(&RELOAD_RESOURCES_RE, page)
    }
}
