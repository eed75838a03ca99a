use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PostId;

/// Ordered fragment of a post's text, sized for one speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub post_id: PostId,
    pub index: usize,
    pub text: String,
}

impl Chunk {
    /// Length in characters, the unit the speech service limits on.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Reference to audio rendered by the speech service for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub url: String,
    pub duration: Option<Duration>,
}

impl AudioRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Playable audio for one post, assembled from its chunks in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioUnit {
    pub post_id: PostId,
    pub chunks: Vec<AudioRef>,
    pub assembled_at: DateTime<Utc>,
}

impl AudioUnit {
    pub fn new(post_id: PostId, chunks: Vec<AudioRef>) -> Self {
        Self {
            post_id,
            chunks,
            assembled_at: Utc::now(),
        }
    }

    /// Total playing time; chunks without a reported length count as zero.
    pub fn duration(&self) -> Duration {
        self.chunks.iter().filter_map(|c| c.duration).sum()
    }
}
