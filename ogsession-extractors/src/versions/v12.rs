//! 12.x layer.

use regex::Regex;
use std::sync::LazyLock;

use crate::layer::ExtractorLayer;

/// Lifeform menu entry. 12.x dropped the script flag on some pages but
/// keeps the menu link whenever lifeforms are on.
static LIFEFORM_MENU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"component=lf(?:buildings|research|settings)").expect("Invalid regex")
});

/// Menu based lifeform detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct V12Layer;

impl ExtractorLayer for V12Layer {
    fn name(&self) -> &'static str {
        "v12"
    }

    fn lifeform_enabled(&self, page: &str) -> Option<bool> {
        LIFEFORM_MENU_RE.is_match(page).then_some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_link_enables_lifeforms() {
        let page = r#"<a href="index.php?page=ingame&amp;component=lfbuildings">"#;
        assert_eq!(V12Layer.lifeform_enabled(page), Some(true));
        // Absent link defers to older layers.
        assert_eq!(V12Layer.lifeform_enabled("<html></html>"), None);
    }
}
