//! 11.x layer: lifeforms and the script-level token.

use regex::Regex;
use std::sync::LazyLock;

use crate::layer::{ExtractorLayer, capture};

static TOKEN_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var token\s*=\s*"([^"]+)""#).expect("Invalid regex"));

static LIFEFORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var lifeformEnabled\s*=\s*(true|false)").expect("Invalid regex")
});

/// Script variables introduced with lifeforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct V11Layer;

impl ExtractorLayer for V11Layer {
    fn name(&self) -> &'static str {
        "v11"
    }

    fn token(&self, page: &str) -> Option<String> {
        capture(&TOKEN_VAR_RE, page)
    }

    fn lifeform_enabled(&self, page: &str) -> Option<bool> {
        capture(&LIFEFORM_RE, page).map(|v| v == "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_token() {
        let page = r#"<script>var token = "0a1b2c3d";</script>"#;
        assert_eq!(V11Layer.token(page).as_deref(), Some("0a1b2c3d"));
    }

    #[test]
    fn test_lifeform_flag() {
        assert_eq!(V11Layer.lifeform_enabled("var lifeformEnabled = true;"), Some(true));
        assert_eq!(V11Layer.lifeform_enabled("var lifeformEnabled=false;"), Some(false));
        assert_eq!(V11Layer.lifeform_enabled("<html></html>"), None);
    }
}
