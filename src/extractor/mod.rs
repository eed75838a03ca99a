//! Platform-aware post extraction from rendered HTML subtrees.
//!
//! # Architecture
//!
//! ```text
//! added subtree (outerHTML) → post rules (registration order) → RawCandidate
//! ```
//!
//! Each rule claims the nodes it accepts; a later rule never yields a node
//! that overlaps (contains or sits inside) an already claimed one. Candidates
//! whose collapsed text is shorter than the minimum length are dropped.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::{Result, SocialcastError};
use crate::config::MIN_TEXT_LEN;
use crate::domain::{MediaKind, PlatformId};
use crate::normalizer::collapse_whitespace;
use crate::registry::{CompiledPostRule, PlatformRules, SelectorRegistry};

/// Author used when no author selector resolves.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("invalid selector {selector:?} for {platform}: {reason}")]
    InvalidSelector {
        platform: String,
        selector: String,
        reason: String,
    },

    #[error("candidate text too short ({len} < {min} chars)")]
    TooShort { len: usize, min: usize },
}

/// A post-shaped piece of content found in a subtree, before identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub author: String,
    pub text: String,
    pub media_kind: MediaKind,
}

/// Extracts candidates using the compiled selector registry.
pub struct Extractor {
    registry: Arc<SelectorRegistry>,
    min_text_len: usize,
}

impl Extractor {
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self::with_min_text_len(registry, MIN_TEXT_LEN)
    }

    pub fn with_min_text_len(registry: Arc<SelectorRegistry>, min_text_len: usize) -> Self {
        Self {
            registry,
            min_text_len,
        }
    }

    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Scan an HTML subtree (self-node included) for post candidates.
    ///
    /// Fails only for an unregistered platform. Rejected or broken candidates
    /// are logged and skipped; they never abort the rest of the subtree.
    pub fn extract(&self, fragment: &str, platform: &PlatformId) -> Result<Vec<RawCandidate>> {
        let rules = self
            .registry
            .get(platform)
            .ok_or_else(|| SocialcastError::UnknownPlatform(platform.to_string()))?;

        let document = Html::parse_fragment(fragment);
        let mut claimed: Vec<ElementRef<'_>> = Vec::new();
        let mut candidates = Vec::new();

        for rule in &rules.post_rules {
            for element in document.select(&rule.selector) {
                if overlaps_claimed(element, &claimed) {
                    continue;
                }

                match self.candidate(element, rule, rules) {
                    Ok(candidate) => {
                        claimed.push(element);
                        candidates.push(candidate);
                    }
                    Err(e @ ExtractionError::TooShort { .. }) => {
                        debug!("Rejected {} candidate: {}", platform, e);
                    }
                    Err(e) => {
                        warn!("Skipping {} candidate: {}", platform, e);
                    }
                }
            }
        }

        Ok(candidates)
    }

    fn candidate(
        &self,
        element: ElementRef<'_>,
        rule: &CompiledPostRule,
        rules: &PlatformRules,
    ) -> std::result::Result<RawCandidate, ExtractionError> {
        let text = post_text(element, rule.text_selector.as_ref());
        let len = text.chars().count();
        if len < self.min_text_len {
            return Err(ExtractionError::TooShort {
                len,
                min: self.min_text_len,
            });
        }

        Ok(RawCandidate {
            author: resolve_author(element, rules),
            text,
            media_kind: resolve_media_kind(element, rules),
        })
    }
}

fn overlaps_claimed(element: ElementRef<'_>, claimed: &[ElementRef<'_>]) -> bool {
    claimed.iter().any(|c| {
        c.id() == element.id()
            || element.ancestors().any(|n| n.id() == c.id())
            || c.ancestors().any(|n| n.id() == element.id())
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn post_text(element: ElementRef<'_>, text_selector: Option<&Selector>) -> String {
    if let Some(selector) = text_selector {
        let parts: Vec<String> = element
            .select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }
    element_text(element)
}

fn author_from(element: ElementRef<'_>) -> Option<String> {
    let text = element_text(element);
    if !text.is_empty() {
        return Some(text);
    }
    element
        .value()
        .attr("aria-label")
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
}

/// Nested lookup first, then each ancestor outward; `"Unknown"` otherwise.
///
/// The walk stops at the first ancestor that also holds another post, so an
/// author is never borrowed from a sibling.
fn resolve_author(element: ElementRef<'_>, rules: &PlatformRules) -> String {
    let selectors = &rules.author_selectors;
    for selector in selectors {
        if let Some(author) = element.select(selector).find_map(author_from) {
            return author;
        }
    }

    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        if let Some(author) = selectors
            .iter()
            .filter(|s| s.matches(&ancestor))
            .find_map(|_| author_from(ancestor))
        {
            return author;
        }
        if holds_other_post(ancestor, element, rules) {
            break;
        }
        for selector in selectors {
            if let Some(author) = ancestor.select(selector).find_map(author_from) {
                return author;
            }
        }
    }

    UNKNOWN_AUTHOR.to_string()
}

fn holds_other_post(ancestor: ElementRef<'_>, post: ElementRef<'_>, rules: &PlatformRules) -> bool {
    let own = [post];
    rules.post_rules.iter().any(|rule| {
        ancestor
            .select(&rule.selector)
            .any(|other| !overlaps_claimed(other, &own))
    })
}

fn matches_any(element: ElementRef<'_>, selectors: &[Selector]) -> bool {
    selectors
        .iter()
        .any(|s| s.matches(&element) || element.select(s).next().is_some())
}

fn resolve_media_kind(element: ElementRef<'_>, rules: &PlatformRules) -> MediaKind {
    if matches_any(element, &rules.image_selectors) {
        MediaKind::Image
    } else if matches_any(element, &rules.video_selectors) {
        MediaKind::Video
    } else if matches_any(element, &rules.link_selectors) {
        MediaKind::Link
    } else {
        MediaKind::Text
    }
}
