//! Platform lookup table.
//!
//! Compiles [`PlatformConfig`] entries into parsed CSS selectors once, so the
//! extractor never branches on platform names. Adding a platform is a config
//! change only.

use std::collections::BTreeMap;

use scraper::Selector;
use tracing::warn;
use url::Url;

use crate::config::{PlatformConfig, PostRule};
use crate::domain::PlatformId;
use crate::extractor::ExtractionError;

/// A post rule with its selectors parsed.
#[derive(Debug)]
pub struct CompiledPostRule {
    pub selector: Selector,
    pub text_selector: Option<Selector>,
}

/// All rules for one platform, in registration order.
#[derive(Debug)]
pub struct PlatformRules {
    pub id: PlatformId,
    pub hosts: Vec<String>,
    pub post_rules: Vec<CompiledPostRule>,
    pub author_selectors: Vec<Selector>,
    pub image_selectors: Vec<Selector>,
    pub video_selectors: Vec<Selector>,
    pub link_selectors: Vec<Selector>,
}

impl PlatformRules {
    /// Compile one entry. Selectors that fail to parse are logged and left
    /// out; the rest of the entry still applies.
    pub fn compile(id: PlatformId, config: &PlatformConfig) -> Self {
        let post_rules = config
            .post_selectors
            .iter()
            .filter_map(|rule| compile_post_rule(&id, rule))
            .collect();

        Self {
            hosts: config.hosts.iter().map(|h| h.trim().to_lowercase()).collect(),
            post_rules,
            author_selectors: compile_all(&id, &config.author_selectors),
            image_selectors: compile_all(&id, &config.image_selectors),
            video_selectors: compile_all(&id, &config.video_selectors),
            link_selectors: compile_all(&id, &config.link_selectors),
            id,
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        self.hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{h}")))
    }
}

pub fn parse_selector(platform: &PlatformId, selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::InvalidSelector {
        platform: platform.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn compile_post_rule(platform: &PlatformId, rule: &PostRule) -> Option<CompiledPostRule> {
    let selector = match parse_selector(platform, &rule.selector) {
        Ok(s) => s,
        Err(e) => {
            warn!("Skipping post rule: {}", e);
            return None;
        }
    };

    let text_selector = match rule.text_selector.as_deref().map(|s| parse_selector(platform, s)) {
        None => None,
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => {
            warn!("Ignoring text selector: {}", e);
            None
        }
    };

    Some(CompiledPostRule {
        selector,
        text_selector,
    })
}

fn compile_all(platform: &PlatformId, selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match parse_selector(platform, s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!("Skipping selector: {}", e);
                None
            }
        })
        .collect()
}

/// Platform id → compiled rules.
#[derive(Debug, Default)]
pub struct SelectorRegistry {
    platforms: BTreeMap<PlatformId, PlatformRules>,
}

impl SelectorRegistry {
    pub fn new(entries: &BTreeMap<String, PlatformConfig>) -> Self {
        let platforms = entries
            .iter()
            .map(|(id, config)| {
                let id = PlatformId::new(id.as_str());
                (id.clone(), PlatformRules::compile(id, config))
            })
            .collect();
        Self { platforms }
    }

    pub fn get(&self, platform: &PlatformId) -> Option<&PlatformRules> {
        self.platforms.get(platform)
    }

    pub fn contains(&self, platform: &PlatformId) -> bool {
        self.platforms.contains_key(platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformRules> {
        self.platforms.values()
    }

    /// Identify the platform serving `url` by host suffix.
    pub fn detect(&self, url: &str) -> Option<PlatformId> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        self.platforms
            .values()
            .find(|rules| rules.matches_host(&host))
            .map(|rules| rules.id.clone())
    }
}
