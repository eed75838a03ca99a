use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{info, warn};

use crate::app::error::{Result, SocialcastError};
use crate::chunker::Chunker;
use crate::config::Config;
use crate::digest::DigestAggregator;
use crate::domain::{AudioUnit, PlatformId, PlaybackState};
use crate::extractor::Extractor;
use crate::narration::{
    spawn_narration_worker, MurfService, NarrationClient, NarrationStats, NarrationWorkerHandle,
    SpeechService, VoiceConfig, KNOWN_VOICES,
};
use crate::pipeline::{lock_pipeline, Pipeline};
use crate::playback::{parse_utterance, Ack, PlaybackController, TransportCommand};
use crate::registry::SelectorRegistry;

/// Answer to the status query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub is_listening: bool,
    pub platform: String,
    pub posts_observed: usize,
    pub posts_narrated: usize,
    pub narration_failures: usize,
    pub posts_by_platform: BTreeMap<String, usize>,
    pub queue_len: usize,
    pub playback_state: PlaybackState,
    pub digest_pending: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} on {}",
            if self.is_listening { "Listening" } else { "Idle" },
            self.platform
        )?;
        writeln!(
            f,
            "Posts: {} observed, {} narrated, {} failed",
            self.posts_observed, self.posts_narrated, self.narration_failures
        )?;
        for (platform, count) in &self.posts_by_platform {
            writeln!(f, "  {}: {}", platform, count)?;
        }
        writeln!(f, "Playback: {} ({} queued)", self.playback_state, self.queue_len)?;
        write!(f, "Digest: {} post(s) pending", self.digest_pending)
    }
}

/// Wires the pipeline, narration, playback and digest for one watched page.
pub struct AppContext {
    pub config: Config,
    pub registry: Arc<SelectorRegistry>,
    pub pipeline: Arc<Mutex<Pipeline>>,
    pub narration: Arc<NarrationClient>,
    pub playback: Arc<AsyncMutex<PlaybackController>>,
    pub digest: Arc<DigestAggregator>,
    pub stats: Arc<NarrationStats>,
    pub voice: Arc<RwLock<VoiceConfig>>,
}

impl AppContext {
    /// Build a context that narrates through the configured speech service.
    pub fn new(config: Config, platform: PlatformId) -> Result<Self> {
        let speech: Arc<dyn SpeechService> = Arc::new(MurfService::new(&config.narration)?);
        Self::with_speech(config, platform, speech)
    }

    pub fn with_speech(
        config: Config,
        platform: PlatformId,
        speech: Arc<dyn SpeechService>,
    ) -> Result<Self> {
        let registry = Arc::new(SelectorRegistry::new(&config.platform_entries()));
        if !registry.contains(&platform) {
            return Err(SocialcastError::UnknownPlatform(platform.to_string()));
        }

        let extractor = Extractor::with_min_text_len(registry.clone(), config.extraction.min_text_len);
        let pipeline = Arc::new(Mutex::new(Pipeline::new(extractor, platform)));

        let narration = Arc::new(NarrationClient::new(
            speech,
            Chunker::new(config.narration.max_chunk),
        ));
        let digest = Arc::new(DigestAggregator::new(
            narration.clone(),
            config.digest.horizon_hours,
        ));
        let voice = Arc::new(RwLock::new(config.narration.voice.clone()));

        Ok(Self {
            config,
            registry,
            pipeline,
            narration,
            playback: Arc::new(AsyncMutex::new(PlaybackController::new())),
            digest,
            stats: Arc::new(NarrationStats::default()),
            voice,
        })
    }

    /// Resolve the platform for `url`, preferring an explicit override.
    pub fn resolve_platform(
        config: &Config,
        url: &str,
        requested: Option<&str>,
    ) -> Result<PlatformId> {
        if let Some(id) = requested {
            return Ok(PlatformId::new(id));
        }
        let parsed = url::Url::parse(url)?;
        let registry = SelectorRegistry::new(&config.platform_entries());
        registry
            .detect(parsed.as_str())
            .ok_or_else(|| SocialcastError::UnknownPlatform(parsed.host_str().unwrap_or(url).to_string()))
    }

    pub fn spawn_narration_worker(&self) -> NarrationWorkerHandle {
        spawn_narration_worker(
            self.narration.clone(),
            self.playback.clone(),
            self.voice.clone(),
            self.stats.clone(),
            self.config.extraction.spam_filter,
            self.config.narration.max_concurrency,
        )
    }

    pub async fn dispatch(&self, command: TransportCommand) -> Ack {
        match command {
            TransportCommand::Start => {
                if lock_pipeline(&self.pipeline).start() {
                    Ack::ok("listening")
                } else {
                    Ack::ok("already listening")
                }
            }
            TransportCommand::Stop => {
                lock_pipeline(&self.pipeline).stop();
                self.playback.lock().await.stop();
                Ack::ok("stopped listening and playback")
            }
            TransportCommand::Play => self.playback.lock().await.play(),
            TransportCommand::Pause => self.playback.lock().await.pause(),
            TransportCommand::Skip => self.playback.lock().await.skip(),
            TransportCommand::Replay => self.playback.lock().await.replay(),
        }
    }

    /// Run a free-text utterance through the voice command rules.
    pub async fn voice_command(&self, utterance: &str) -> Ack {
        match parse_utterance(utterance) {
            Some(command) => {
                info!("Voice command {:?} from {:?}", command, utterance);
                self.dispatch(command).await
            }
            None => Ack::fail(format!("no command in {:?}", utterance)),
        }
    }

    /// Narrate the digest and queue it for playback. `Ok(None)` if there was
    /// nothing collected.
    pub async fn request_digest(&self, hours: Option<u32>) -> Result<Option<AudioUnit>> {
        let voice = self.voice.read().await.clone();
        let Some(unit) = self.digest.generate(hours, &voice).await? else {
            return Ok(None);
        };
        let ack = self.playback.lock().await.enqueue(unit.clone());
        if !ack.success {
            warn!("Digest not queued: {}", ack.message);
        }
        Ok(Some(unit))
    }

    /// Switch the narration voice for the rest of the session.
    pub async fn set_voice(&self, voice_id: &str) -> Ack {
        let Some(known) = KNOWN_VOICES.iter().find(|v| v.id.eq_ignore_ascii_case(voice_id)) else {
            return Ack::fail(format!("unknown voice {:?}", voice_id));
        };
        let mut voice = self.voice.write().await;
        voice.voice_id = known.id.to_string();
        voice.style = known.style.to_string();
        Ack::ok(format!("voice set to {} ({})", known.name, known.id))
    }

    pub async fn status(&self) -> Status {
        let pipeline = lock_pipeline(&self.pipeline).status();
        let playback = self.playback.lock().await;
        Status {
            is_listening: pipeline.is_listening,
            platform: pipeline.platform,
            posts_observed: pipeline.posts_observed,
            posts_narrated: self.stats.narrated(),
            narration_failures: self.stats.failed(),
            posts_by_platform: pipeline.posts_by_platform,
            queue_len: playback.queue_len(),
            playback_state: playback.state(),
            digest_pending: self.digest.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::testing::FakeSpeech;

    fn context() -> AppContext {
        AppContext::with_speech(
            Config::default(),
            PlatformId::new("twitter"),
            Arc::new(FakeSpeech::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let result = AppContext::with_speech(
            Config::default(),
            PlatformId::new("myspace"),
            Arc::new(FakeSpeech::new()),
        );
        assert!(matches!(result, Err(SocialcastError::UnknownPlatform(_))));
    }

    #[test]
    fn test_resolve_platform() {
        let config = Config::default();
        assert_eq!(
            AppContext::resolve_platform(&config, "https://x.com/home", None).unwrap(),
            PlatformId::new("twitter")
        );
        assert_eq!(
            AppContext::resolve_platform(&config, "https://example.com", Some("LinkedIn")).unwrap(),
            PlatformId::new("linkedin")
        );
        assert!(matches!(
            AppContext::resolve_platform(&config, "https://example.com", None),
            Err(SocialcastError::UnknownPlatform(_))
        ));
        assert!(matches!(
            AppContext::resolve_platform(&config, "not a url", None),
            Err(SocialcastError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let ctx = context();
        assert!(ctx.dispatch(TransportCommand::Start).await.success);
        assert!(ctx.status().await.is_listening);

        let ack = ctx.dispatch(TransportCommand::Stop).await;
        assert!(ack.success);
        let status = ctx.status().await;
        assert!(!status.is_listening);
        assert_eq!(status.playback_state, PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn test_transport_failures_are_acknowledged() {
        let ctx = context();
        assert!(!ctx.dispatch(TransportCommand::Pause).await.success);
        assert!(!ctx.dispatch(TransportCommand::Skip).await.success);
        assert!(!ctx.dispatch(TransportCommand::Replay).await.success);
    }

    #[tokio::test]
    async fn test_voice_command_routes_to_transport() {
        let ctx = context();
        // "stop" in speech is pause, which fails from idle.
        assert!(!ctx.voice_command("stop please").await.success);
        assert!(ctx.status().await.playback_state == PlaybackState::Idle);
        assert!(!ctx.voice_command("hello there").await.success);
    }

    #[tokio::test]
    async fn test_empty_digest_is_no_content() {
        let ctx = context();
        assert!(ctx.request_digest(Some(24)).await.unwrap().is_none());
    }

    #[test]
    fn test_set_voice() {
        let ctx = context();
        assert!(tokio_test::block_on(ctx.set_voice("en-gb-charles")).success);
        assert!(!tokio_test::block_on(ctx.set_voice("robot")).success);

        let voice = tokio_test::block_on(ctx.voice.read()).clone();
        assert_eq!(voice.voice_id, "en-GB-charles");
        assert_eq!(voice.style, "Formal");
    }
}
