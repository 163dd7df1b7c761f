//! Selectors for a particular board site.

use serde::{Deserialize, Serialize};

use super::Locator;

/// Where things live on the board and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// One rendered pin card on the board.
    pub pin: String,
    /// Link inside a pin card pointing at the pin's own page.
    pub pin_link: String,
    /// Thumbnail inside a pin card.
    pub pin_thumbnail: String,
    /// Full image in the detail view.
    pub detail_image: String,
    pub menu: Vec<Locator>,
    pub download_action: Vec<Locator>,
    pub close: Vec<Locator>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            pin: r#"[data-test-id="pin"]"#.to_string(),
            pin_link: r#"a[href*="/pin/"]"#.to_string(),
            pin_thumbnail: "img".to_string(),
            detail_image: r#"img[src*="pinimg"]"#.to_string(),
            menu: vec![
                Locator::aria_label("More options"),
                Locator::test_id("more-options-button"),
                Locator::tag_with_text("button", "More"),
                Locator::aria_label("More actions"),
            ],
            download_action: vec![
                Locator::text("Download image"),
                Locator::text("Download"),
                Locator::test_id("download-button"),
                Locator::tag_with_text("div", "Download image"),
            ],
            close: vec![
                Locator::aria_label("Close"),
                Locator::test_id("closeup-close-button"),
                Locator::tag_with_text("button", "Close"),
            ],
        }
    }
}
