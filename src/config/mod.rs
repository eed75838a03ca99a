//! Configuration management for SocialCast.
//!
//! Configuration is read from `~/.config/socialcast/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod platforms;

pub use platforms::{default_platforms, PlatformConfig, PostRule};

use crate::narration::NarrationConfig;
use crate::observer::BrowserConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Minimum trimmed text length for a post candidate.
pub const MIN_TEXT_LEN: usize = 10;

/// Default digest horizon in hours.
pub const DEFAULT_HORIZON_HOURS: u64 = 24;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_text_len: usize,
    /// Skip narrating filler posts (they are still deduplicated and digested)
    pub spam_filter: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_len: MIN_TEXT_LEN,
            spam_filter: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub horizon_hours: u64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            horizon_hours: DEFAULT_HORIZON_HOURS,
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub narration: NarrationConfig,
    pub extraction: ExtractionConfig,
    pub digest: DigestConfig,
    /// User platform entries, merged over the built-ins by id.
    pub platforms: BTreeMap<String, PlatformConfig>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/socialcast/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("socialcast").join("config.toml"))
    }

    /// Built-in platform entries with user entries applied on top.
    pub fn platform_entries(&self) -> BTreeMap<String, PlatformConfig> {
        let mut entries = default_platforms();
        for (id, entry) in &self.platforms {
            entries.insert(id.trim().to_lowercase(), entry.clone());
        }
        entries
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# SocialCast Configuration

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Wait after page load before watching for new posts (milliseconds)
wait_after_load_ms = 2000

[narration]
# Speech generation endpoint
endpoint = "https://api.murf.ai/v1/speech/generate"

# API key. Leave unset to read the MURF_API_KEY environment variable.
# api_key = "..."

# Request timeout in seconds
timeout_secs = 30

# Maximum characters per speech request (service limit)
max_chunk = 3000

# Posts narrated at the same time
max_concurrency = 3

[narration.voice]
voice_id = "en-US-amara"
style = "Conversational"
rate = 0
pitch = 0
variation = 1

[extraction]
# Ignore candidates shorter than this (UI chrome, single emoji, labels)
min_text_len = 10

# Don't narrate filler posts like "lol" or "thanks"
spam_filter = true

[digest]
# Rolling window for the digest, in hours
horizon_hours = 24

# Platforms can be added or overridden by id, e.g.
#
# [platforms.mastodon]
# hosts = ["mastodon.social"]
# post_selectors = [{ selector = "article.status", text_selector = ".status__content" }]
# author_selectors = [".display-name__account"]
# image_selectors = [".media-gallery img"]
# video_selectors = ["video"]
# link_selectors = [".status-card"]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert!(config.browser.headless);
        assert_eq!(config.narration.max_chunk, 3000);
        assert_eq!(config.narration.voice.voice_id, "en-US-amara");
        assert_eq!(config.extraction.min_text_len, 10);
        assert_eq!(config.digest.horizon_hours, 24);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[digest]
horizon_hours = 6
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.digest.horizon_hours, 6);
        assert_eq!(config.narration.max_chunk, 3000);
        assert!(config.extraction.spam_filter);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.narration.endpoint, NarrationConfig::default().endpoint);
        assert!(config.platforms.is_empty());
        assert_eq!(config.platform_entries().len(), default_platforms().len());
    }

    #[test]
    fn test_user_platform_merges_over_defaults() {
        let content = r##"
[platforms.mastodon]
hosts = ["mastodon.social"]
post_selectors = [{ selector = "article.status", text_selector = ".status__content" }]

[platforms.Twitter]
hosts = ["x.com"]
post_selectors = [{ selector = "article" }]
"##;
        let config: Config = toml::from_str(content).unwrap();
        let entries = config.platform_entries();

        assert!(entries.contains_key("mastodon"));
        assert!(entries.contains_key("linkedin"));
        assert_eq!(entries["twitter"].hosts, vec!["x.com".to_string()]);
        assert_eq!(entries["twitter"].post_selectors[0].selector, "article");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extraction]\nmin_text_len = 25\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.extraction.min_text_len, 25);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extraction\nmin_text_len = ").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_create_default_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::create_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.narration.max_concurrency, 3);
    }
}
