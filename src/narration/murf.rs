use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app::{Result, SocialcastError};
use crate::domain::AudioRef;
use crate::narration::{NarrationConfig, SpeechService, VoiceConfig};

/// Catalogue entry for a speech voice.
#[derive(Debug, Clone, Copy)]
pub struct VoiceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub style: &'static str,
}

pub const KNOWN_VOICES: &[VoiceInfo] = &[
    VoiceInfo { id: "en-US-amara", name: "Amara", language: "en-US", style: "Conversational" },
    VoiceInfo { id: "en-US-jenny", name: "Jenny", language: "en-US", style: "Professional" },
    VoiceInfo { id: "en-US-mike", name: "Mike", language: "en-US", style: "Casual" },
    VoiceInfo { id: "en-IN-priya", name: "Priya", language: "en-IN", style: "Friendly" },
    VoiceInfo { id: "en-GB-charles", name: "Charles", language: "en-GB", style: "Formal" },
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    style: &'a str,
    rate: i32,
    pitch: i32,
    variation: u32,
    format: &'a str,
    sample_rate: u32,
    channel_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    audio_file: Option<String>,
    audio_length_in_seconds: Option<f64>,
}

/// Speech service backed by Murf's HTTP generate endpoint.
pub struct MurfService {
    client: Client,
    endpoint: String,
    format: String,
    sample_rate: u32,
    channel_type: String,
}

impl MurfService {
    pub fn new(config: &NarrationConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            SocialcastError::Config(format!(
                "No speech API key: set narration.api_key or {}",
                crate::narration::config::API_KEY_ENV
            ))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&api_key)
            .map_err(|e| SocialcastError::Config(format!("Invalid API key: {}", e)))?;
        headers.insert("api-key", key);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .user_agent("socialcast/0.1.0")
            .build()
            .map_err(|e| SocialcastError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            format: config.format.clone(),
            sample_rate: config.sample_rate,
            channel_type: config.channel_type.clone(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> SocialcastError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        SocialcastError::ServiceUnavailable(e.to_string())
    } else {
        SocialcastError::ServiceError {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: e.to_string(),
        }
    }
}

fn into_audio_ref(response: GenerateResponse) -> Result<AudioRef> {
    let url = response
        .audio_file
        .filter(|u| !u.is_empty())
        .ok_or_else(|| SocialcastError::ServiceError {
            status: 200,
            message: "response carried no audio reference".to_string(),
        })?;

    let audio = AudioRef::new(url);
    Ok(match response.audio_length_in_seconds {
        Some(secs) if secs.is_finite() && secs > 0.0 => {
            audio.with_duration(Duration::from_secs_f64(secs))
        }
        _ => audio,
    })
}

#[async_trait]
impl SpeechService for MurfService {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<AudioRef> {
        let request = GenerateRequest {
            text,
            voice_id: &voice.voice_id,
            style: &voice.style,
            rate: voice.rate,
            pitch: voice.pitch,
            variation: voice.variation,
            format: &self.format,
            sample_rate: self.sample_rate,
            channel_type: &self.channel_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SocialcastError::ServiceError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await.map_err(transport_error)?;
        into_audio_ref(body)
    }
}
