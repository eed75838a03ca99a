//! Narration: turning chunked text into playable audio.
//!
//! # Architecture
//!
//! ```text
//! Post → speech text → Chunker → SpeechService (one request per chunk, in order) → AudioUnit
//! ```
//!
//! The [`SpeechService`] trait is the seam to the remote engine;
//! [`MurfService`](murf::MurfService) is the HTTP implementation. If any chunk
//! fails the whole post fails, so a partial [`AudioUnit`] is never produced.

pub mod config;
pub mod murf;
pub mod worker;

pub use config::{NarrationConfig, VoiceConfig};
pub use murf::{MurfService, VoiceInfo, KNOWN_VOICES};
pub use worker::{spawn_narration_worker, NarrationStats, NarrationWorkerHandle};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::chunker::Chunker;
use crate::domain::{AudioRef, AudioUnit, Chunk, Post, PostId};
use crate::normalizer::clean_for_speech;

/// Remote text-to-speech engine.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Render one piece of text (at most the chunk limit) to audio.
    ///
    /// Fails with `ServiceUnavailable` when the endpoint cannot be reached
    /// and `ServiceError` when it answers with a failure.
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<AudioRef>;
}

/// Text spoken for a single post.
pub fn speech_text(post: &Post) -> String {
    format!(
        "{} on {}: {}",
        post.author(),
        post.platform(),
        clean_for_speech(post.content())
    )
}

pub struct NarrationClient {
    service: Arc<dyn SpeechService>,
    chunker: Chunker,
}

impl NarrationClient {
    pub fn new(service: Arc<dyn SpeechService>, chunker: Chunker) -> Self {
        Self { service, chunker }
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Send `chunks` one at a time in sequence order and assemble the
    /// returned audio into a single unit.
    pub async fn narrate(
        &self,
        post_id: &PostId,
        chunks: &[Chunk],
        voice: &VoiceConfig,
    ) -> Result<AudioUnit> {
        let mut ordered: Vec<&Chunk> = chunks.iter().collect();
        ordered.sort_by_key(|c| c.index);

        let mut refs = Vec::with_capacity(ordered.len());
        for chunk in ordered {
            debug!(
                "Narrating chunk {}/{} of {} ({} chars)",
                chunk.index + 1,
                chunks.len(),
                post_id.short(),
                chunk.len()
            );
            match self.service.synthesize(&chunk.text, voice).await {
                Ok(audio) => refs.push(audio),
                Err(e) => {
                    warn!(
                        "Chunk {} of {} failed, dropping narration: {}",
                        chunk.index,
                        post_id.short(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        info!("Narrated {} in {} chunk(s)", post_id.short(), refs.len());
        Ok(AudioUnit::new(post_id.clone(), refs))
    }

    /// Chunk `text` and narrate it as `post_id`.
    pub async fn narrate_text(
        &self,
        post_id: &PostId,
        text: &str,
        voice: &VoiceConfig,
    ) -> Result<AudioUnit> {
        let chunks = self.chunker.chunk(post_id, text);
        self.narrate(post_id, &chunks, voice).await
    }

    pub async fn narrate_post(&self, post: &Post, voice: &VoiceConfig) -> Result<AudioUnit> {
        self.narrate_text(post.id(), &speech_text(post), voice).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable in-memory speech service for tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::app::SocialcastError;

    #[derive(Default)]
    pub struct FakeSpeech {
        pub requests: Mutex<Vec<String>>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
        unavailable: bool,
        hang: bool,
    }

    impl FakeSpeech {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the n-th call (0-based) with a service error.
        pub fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Default::default()
            }
        }

        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Default::default()
            }
        }

        /// Accept every request and never answer.
        pub fn hanging() -> Self {
            Self {
                hang: true,
                ..Default::default()
            }
        }

        pub fn request_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn texts(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechService for FakeSpeech {
        async fn synthesize(&self, text: &str, _voice: &VoiceConfig) -> Result<AudioRef> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(text.to_string());

            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.unavailable {
                return Err(SocialcastError::ServiceUnavailable("connection refused".into()));
            }
            if self.fail_on_call == Some(call) {
                return Err(SocialcastError::ServiceError {
                    status: 500,
                    message: "boom".into(),
                });
            }

            Ok(AudioRef::new(format!("https://audio.test/{call}.wav"))
                .with_duration(Duration::from_secs(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeSpeech;
    use super::*;
    use crate::app::SocialcastError;
    use crate::domain::{MediaKind, PlatformId};

    fn post_id() -> PostId {
        PostId::from_content(&PlatformId::new("twitter"), "post")
    }

    #[tokio::test]
    async fn test_narrate_preserves_chunk_order() {
        let fake = Arc::new(FakeSpeech::new());
        let client = NarrationClient::new(fake.clone(), Chunker::new(25));
        let id = post_id();
        let mut chunks = client
            .chunker()
            .chunk(&id, "First sentence here. Second sentence here. Third one.");
        chunks.reverse();

        let unit = client
            .narrate(&id, &chunks, &VoiceConfig::default())
            .await
            .unwrap();

        assert_eq!(
            fake.texts(),
            vec!["First sentence here.", "Second sentence here.", "Third one."]
        );
        let urls: Vec<_> = unit.chunks.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://audio.test/0.wav",
                "https://audio.test/1.wav",
                "https://audio.test/2.wav"
            ]
        );
        assert_eq!(unit.post_id, id);
    }

    #[tokio::test]
    async fn test_any_failed_chunk_fails_the_post() {
        let fake = Arc::new(FakeSpeech::failing_on(1));
        let client = NarrationClient::new(fake.clone(), Chunker::new(25));
        let id = post_id();

        let result = client
            .narrate_text(
                &id,
                "First sentence here. Second sentence here. Third one.",
                &VoiceConfig::default(),
            )
            .await;

        assert!(matches!(result, Err(SocialcastError::ServiceError { status: 500, .. })));
        // Nothing after the failing chunk is sent.
        assert_eq!(fake.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_service_surfaces() {
        let client = NarrationClient::new(Arc::new(FakeSpeech::unavailable()), Chunker::default());
        let result = client
            .narrate_text(&post_id(), "Hello there everyone", &VoiceConfig::default())
            .await;
        let err = result.unwrap_err();
        assert!(err.is_service_failure());
        assert!(matches!(err, SocialcastError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_speech_text_frames_post() {
        let post = Post::new(
            PlatformId::new("linkedin"),
            "Jordan",
            "Excited to join @acme as a Rust engineer #hiring https://lnkd.in/x",
            MediaKind::Text,
            None,
        );
        assert_eq!(
            speech_text(&post),
            "Jordan on linkedin: Excited to join as a Rust engineer hiring"
        );
    }
}
