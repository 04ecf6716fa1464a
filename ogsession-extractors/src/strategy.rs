//! Composed strategies.

use chrono::NaiveDateTime;
use ogsession_core::{ChatEndpoint, PageExtractor, Resources};
use semver::Version;
use std::fmt;
use std::sync::Arc;

use crate::layer::ExtractorLayer;

/// Extraction behaviour for one version range `[min, max)`.
///
/// Every capability asks the layers in order and returns the first answer.
#[derive(Clone)]
pub struct Strategy {
    name: String,
    min: Version,
    max: Option<Version>,
    layers: Vec<Arc<dyn ExtractorLayer>>,
}

impl Strategy {
    /// Creates a strategy. `layers` are consulted in order.
    pub fn new(min: Version, max: Option<Version>, layers: Vec<Arc<dyn ExtractorLayer>>) -> Self {
        Self {
            name: format!("v{min}"),
            min,
            max,
            layers,
        }
    }

    /// Lowest version covered.
    pub fn min(&self) -> &Version {
        &self.min
    }

    /// First version no longer covered, if any.
    pub fn max(&self) -> Option<&Version> {
        self.max.as_ref()
    }

    /// Returns true if `version` falls in `[min, max)`.
    pub fn covers(&self, version: &Version) -> bool {
        *version >= self.min && self.max.as_ref().is_none_or(|max| version < max)
    }

    /// Names of the layers, in lookup order.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    fn first<T>(&self, f: impl Fn(&dyn ExtractorLayer) -> Option<T>) -> Option<T> {
        self.layers.iter().find_map(|layer| f(layer.as_ref()))
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("layers", &self.layer_names())
            .finish()
    }
}

impl PageExtractor for Strategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_range(&self) -> (Version, Option<Version>) {
        (self.min.clone(), self.max.clone())
    }

    fn extract_session_marker(&self, page: &str) -> Option<String> {
        self.first(|l| l.session_marker(page))
    }

    fn extract_server_version(&self, page: &str) -> Option<String> {
        self.first(|l| l.server_version(page))
    }

    fn is_logged_out(&self, page: &str) -> bool {
        self.first(|l| l.is_logged_out(page))
            .unwrap_or_else(|| self.extract_session_marker(page).is_none())
    }

    fn extract_token(&self, page: &str) -> Option<String> {
        self.first(|l| l.token(page))
    }

    fn extract_server_time(&self, page: &str) -> Option<NaiveDateTime> {
        self.first(|l| l.server_time(page))
    }

    fn extract_planet_id(&self, page: &str) -> Option<i64> {
        self.first(|l| l.planet_id(page))
    }

    fn extract_resources(&self, page: &str) -> Option<Resources> {
        self.first(|l| l.resources(page))
    }

    fn extract_chat_endpoint(&self, page: &str) -> Option<ChatEndpoint> {
        self.first(|l| l.chat_endpoint(page))
    }

    fn extract_lifeform_enabled(&self, page: &str) -> bool {
        self.first(|l| l.lifeform_enabled(page)).unwrap_or(false)
    }

    fn extract_language(&self, page: &str) -> Option<String> {
        self.first(|l| l.language(page))
    }
}
