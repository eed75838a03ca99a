//! Selector registry data: per-platform CSS rules.
//!
//! Entries are plain data; the [`registry`](crate::registry) module compiles
//! them into a lookup table. User config merges over the built-in entries by
//! platform id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rule matching one kind of post container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRule {
    /// Selector for the post container.
    pub selector: String,
    /// Optional selector, relative to the container, for the text body.
    /// When absent the container's full text is used.
    #[serde(default)]
    pub text_selector: Option<String>,
}

impl PostRule {
    fn new(selector: &str, text_selector: Option<&str>) -> Self {
        Self {
            selector: selector.to_string(),
            text_selector: text_selector.map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlatformConfig {
    /// Host suffixes that identify the platform (e.g. `x.com`).
    pub hosts: Vec<String>,
    /// Post rules, checked in order; first match per node wins.
    pub post_selectors: Vec<PostRule>,
    /// Author lookups, tried inside the post first, then on its ancestors.
    pub author_selectors: Vec<String>,
    pub image_selectors: Vec<String>,
    pub video_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in platform entries.
pub fn default_platforms() -> BTreeMap<String, PlatformConfig> {
    let mut platforms = BTreeMap::new();

    platforms.insert(
        "linkedin".to_string(),
        PlatformConfig {
            hosts: strings(&["linkedin.com"]),
            post_selectors: vec![
                PostRule::new(
                    "div.feed-shared-update-v2",
                    Some(".feed-shared-update-v2__description, .update-components-text"),
                ),
                PostRule::new("div.feed-shared-text", None),
            ],
            author_selectors: strings(&[
                ".update-components-actor__name",
                ".feed-shared-actor__name",
            ]),
            image_selectors: strings(&[".update-components-image", "img.feed-shared-image"]),
            video_selectors: strings(&["video", ".update-components-linkedin-video"]),
            link_selectors: strings(&[".update-components-article", "article a[href]"]),
        },
    );

    platforms.insert(
        "twitter".to_string(),
        PlatformConfig {
            hosts: strings(&["twitter.com", "x.com"]),
            post_selectors: vec![
                PostRule::new("article[data-testid=\"tweet\"]", Some("[data-testid=\"tweetText\"]")),
                PostRule::new("[data-testid=\"tweetText\"]", None),
            ],
            author_selectors: strings(&["[data-testid=\"User-Name\"] span"]),
            image_selectors: strings(&["[data-testid=\"tweetPhoto\"]"]),
            video_selectors: strings(&["[data-testid=\"videoPlayer\"]", "video"]),
            link_selectors: strings(&["[data-testid=\"card.wrapper\"]"]),
        },
    );

    platforms.insert(
        "instagram".to_string(),
        PlatformConfig {
            hosts: strings(&["instagram.com"]),
            post_selectors: vec![PostRule::new("article", Some("h1, ._a9zs"))],
            author_selectors: strings(&["header a[role=\"link\"]", "header a"]),
            image_selectors: strings(&["img[srcset]"]),
            video_selectors: strings(&["video"]),
            link_selectors: Vec::new(),
        },
    );

    platforms.insert(
        "facebook".to_string(),
        PlatformConfig {
            hosts: strings(&["facebook.com"]),
            post_selectors: vec![
                PostRule::new("div[role=\"article\"]", Some("div[data-ad-preview=\"message\"]")),
                PostRule::new("div[data-ad-preview=\"message\"]", None),
            ],
            author_selectors: strings(&["h2 strong", "h3 strong", "strong a"]),
            image_selectors: strings(&["img[referrerpolicy]"]),
            video_selectors: strings(&["video"]),
            link_selectors: strings(&["a[role=\"link\"][target=\"_blank\"]"]),
        },
    );

    platforms.insert(
        "whatsapp".to_string(),
        PlatformConfig {
            hosts: strings(&["web.whatsapp.com"]),
            post_selectors: vec![PostRule::new(
                "div.message-in",
                Some("span.selectable-text"),
            )],
            author_selectors: strings(&["span[data-testid=\"author\"]", "span[aria-label]"]),
            image_selectors: strings(&["img[src^=\"blob:\"]"]),
            video_selectors: strings(&["video"]),
            link_selectors: strings(&["a[href^=\"http\"]"]),
        },
    );

    platforms.insert(
        "telegram".to_string(),
        PlatformConfig {
            hosts: strings(&["telegram.org"]),
            post_selectors: vec![PostRule::new("div.message", Some("div.text-content"))],
            author_selectors: strings(&[".peer-title", ".name"]),
            image_selectors: strings(&["img.media-photo"]),
            video_selectors: strings(&["video"]),
            link_selectors: strings(&[".web-page"]),
        },
    );

    platforms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_known_platforms() {
        let platforms = default_platforms();
        for id in ["linkedin", "twitter", "instagram", "facebook", "whatsapp", "telegram"] {
            let entry = platforms.get(id).expect("platform present");
            assert!(!entry.hosts.is_empty(), "{id} has hosts");
            assert!(!entry.post_selectors.is_empty(), "{id} has post rules");
        }
    }

    #[test]
    fn test_post_rule_text_selector_optional() {
        let rule: PostRule = toml::from_str("selector = \"article\"").unwrap();
        assert_eq!(rule.selector, "article");
        assert!(rule.text_selector.is_none());
    }
}
