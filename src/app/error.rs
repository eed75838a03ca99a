use thiserror::Error;

use crate::extractor::ExtractionError;

#[derive(Error, Debug)]
pub enum SocialcastError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Speech service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Speech service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("A digest is already being generated")]
    DigestInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SocialcastError {
    /// Whether the error came from the remote speech service.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            SocialcastError::ServiceUnavailable(_) | SocialcastError::ServiceError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SocialcastError>;
