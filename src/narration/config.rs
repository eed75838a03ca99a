use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chunker::MAX_CHUNK;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "MURF_API_KEY";

/// Voice parameters sent with every speech request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub voice_id: String,
    pub style: String,
    pub rate: i32,
    pub pitch: i32,
    pub variation: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: "en-US-amara".to_string(),
            style: "Conversational".to_string(),
            rate: 0,
            pitch: 0,
            variation: 1,
        }
    }
}

/// Configuration for the remote speech service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Speech generation endpoint
    pub endpoint: String,

    /// API key; falls back to `MURF_API_KEY` when unset
    pub api_key: Option<String>,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Maximum characters per speech request (default: 3000)
    pub max_chunk: usize,

    /// Posts narrated concurrently (default: 3)
    pub max_concurrency: usize,

    /// Audio container format (default: WAV)
    pub format: String,

    pub sample_rate: u32,

    pub channel_type: String,

    pub voice: VoiceConfig,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.murf.ai/v1/speech/generate".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_chunk: MAX_CHUNK,
            max_concurrency: 3,
            format: "WAV".to_string(),
            sample_rate: 44100,
            channel_type: "MONO".to_string(),
            voice: VoiceConfig::default(),
        }
    }
}

impl NarrationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured key, else the environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
