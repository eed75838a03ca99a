use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::domain::Post;
use crate::narration::{NarrationClient, VoiceConfig};
use crate::normalizer::{clean_for_speech, is_spam};
use crate::playback::PlaybackController;

/// Message type for the narration worker
#[derive(Debug)]
pub enum NarrationMessage {
    /// Narrate one newly observed post
    Narrate(Post),
    /// Shutdown the worker
    Shutdown,
}

/// Running totals shown by the status query.
#[derive(Debug, Default)]
pub struct NarrationStats {
    narrated: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl NarrationStats {
    pub fn narrated(&self) -> usize {
        self.narrated.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Posts withheld from narration by the spam filter.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Handle to send posts to the narration worker
#[derive(Clone)]
pub struct NarrationWorkerHandle {
    tx: mpsc::Sender<NarrationMessage>,
}

impl NarrationWorkerHandle {
    pub async fn queue_post(&self, post: Post) {
        if let Err(e) = self.tx.send(NarrationMessage::Narrate(post)).await {
            warn!("Failed to queue post for narration: {}", e);
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(NarrationMessage::Shutdown).await;
    }
}

/// Narrates posts off the observation path and hands finished audio to the
/// playback queue. A slow or failing post never holds up the next one.
pub struct NarrationWorker {
    client: Arc<NarrationClient>,
    controller: Arc<Mutex<PlaybackController>>,
    voice: Arc<RwLock<VoiceConfig>>,
    stats: Arc<NarrationStats>,
    spam_filter: bool,
    permits: Arc<Semaphore>,
    rx: mpsc::Receiver<NarrationMessage>,
}

impl NarrationWorker {
    pub fn new(
        client: Arc<NarrationClient>,
        controller: Arc<Mutex<PlaybackController>>,
        voice: Arc<RwLock<VoiceConfig>>,
        stats: Arc<NarrationStats>,
        spam_filter: bool,
        max_concurrency: usize,
    ) -> (Self, NarrationWorkerHandle) {
        let (tx, rx) = mpsc::channel(100);
        let worker = Self {
            client,
            controller,
            voice,
            stats,
            spam_filter,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            rx,
        };
        (worker, NarrationWorkerHandle { tx })
    }

    pub async fn run(mut self) {
        info!("Narration worker started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                NarrationMessage::Narrate(post) => {
                    if self.spam_filter && is_spam(&clean_for_speech(post.content())) {
                        debug!("Not narrating low-value post {}", post.id().short());
                        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }

                    let permits = self.permits.clone();
                    let client = self.client.clone();
                    let controller = self.controller.clone();
                    let voice = self.voice.read().await.clone();
                    let stats = self.stats.clone();

                    // The permit is awaited in the task so the handoff
                    // channel keeps draining while speech is slow.
                    tokio::spawn(async move {
                        let Ok(_permit) = permits.acquire_owned().await else {
                            return;
                        };
                        match client.narrate_post(&post, &voice).await {
                            Ok(unit) => {
                                let ack = controller.lock().await.enqueue(unit);
                                debug!("Playback: {}", ack.message);
                                stats.narrated.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                stats.failed.fetch_add(1, Ordering::Relaxed);
                                warn!("Failed to narrate post {}: {}", post.id().short(), e);
                            }
                        }
                    });
                }
                NarrationMessage::Shutdown => {
                    info!("Narration worker shutting down");
                    break;
                }
            }
        }
    }
}

/// Spawn the narration worker as a tokio task
pub fn spawn_narration_worker(
    client: Arc<NarrationClient>,
    controller: Arc<Mutex<PlaybackController>>,
    voice: Arc<RwLock<VoiceConfig>>,
    stats: Arc<NarrationStats>,
    spam_filter: bool,
    max_concurrency: usize,
) -> NarrationWorkerHandle {
    let (worker, handle) = NarrationWorker::new(
        client,
        controller,
        voice,
        stats,
        spam_filter,
        max_concurrency,
    );

    tokio::spawn(async move {
        worker.run().await;
    });

    handle
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::chunker::Chunker;
    use crate::domain::{MediaKind, PlatformId, PlaybackState};
    use crate::narration::testing::FakeSpeech;

    fn post(content: &str) -> Post {
        Post::new(PlatformId::new("twitter"), "Sam", content, MediaKind::Text, None)
    }

    async fn settle<F: Fn() -> bool>(done: F) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_narrated_post_reaches_playback() {
        let fake = Arc::new(FakeSpeech::new());
        let client = Arc::new(NarrationClient::new(fake.clone(), Chunker::default()));
        let controller = Arc::new(Mutex::new(PlaybackController::new()));
        let stats = Arc::new(NarrationStats::default());

        let handle = spawn_narration_worker(
            client,
            controller.clone(),
            Arc::new(RwLock::new(VoiceConfig::default())),
            stats.clone(),
            true,
            2,
        );
        let p = post("Shipping a new release of our parser today");
        handle.queue_post(p.clone()).await;

        let s = stats.clone();
        settle(move || s.narrated() == 1).await;

        let pc = controller.lock().await;
        assert_eq!(pc.state(), PlaybackState::Playing);
        assert_eq!(pc.current().unwrap().post_id, *p.id());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_failure_is_counted_not_queued() {
        let fake = Arc::new(FakeSpeech::unavailable());
        let client = Arc::new(NarrationClient::new(fake, Chunker::default()));
        let controller = Arc::new(Mutex::new(PlaybackController::new()));
        let stats = Arc::new(NarrationStats::default());

        let handle = spawn_narration_worker(
            client,
            controller.clone(),
            Arc::new(RwLock::new(VoiceConfig::default())),
            stats.clone(),
            true,
            1,
        );
        handle.queue_post(post("This one will not make it through")).await;

        let s = stats.clone();
        settle(move || s.failed() == 1).await;

        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.narrated(), 0);
        assert!(controller.lock().await.current().is_none());
    }

    #[tokio::test]
    async fn test_hung_service_never_backs_up_the_handoff() {
        let fake = Arc::new(FakeSpeech::hanging());
        let client = Arc::new(NarrationClient::new(fake.clone(), Chunker::default()));

        let handle = spawn_narration_worker(
            client,
            Arc::new(Mutex::new(PlaybackController::new())),
            Arc::new(RwLock::new(VoiceConfig::default())),
            Arc::new(NarrationStats::default()),
            true,
            3,
        );

        let queue_all = async {
            for i in 0..250 {
                handle
                    .queue_post(post(&format!("Post number {i} waiting for a voice")))
                    .await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), queue_all)
            .await
            .expect("handoff blocked on a hung speech service");

        let f = fake.clone();
        settle(move || f.request_count() == 3).await;
        assert_eq!(fake.request_count(), 3);
    }

    #[tokio::test]
    async fn test_filler_with_link_and_mention_is_spam() {
        let fake = Arc::new(FakeSpeech::new());
        let client = Arc::new(NarrationClient::new(fake.clone(), Chunker::default()));
        let stats = Arc::new(NarrationStats::default());

        let handle = spawn_narration_worker(
            client,
            Arc::new(Mutex::new(PlaybackController::new())),
            Arc::new(RwLock::new(VoiceConfig::default())),
            stats.clone(),
            true,
            1,
        );
        handle.queue_post(post("lol https://t.co/x @bob")).await;

        let s = stats.clone();
        settle(move || s.skipped() == 1).await;
        assert_eq!(stats.skipped(), 1);
        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_spam_skipped_when_filter_on() {
        let fake = Arc::new(FakeSpeech::new());
        let client = Arc::new(NarrationClient::new(fake.clone(), Chunker::default()));
        let stats = Arc::new(NarrationStats::default());

        let handle = spawn_narration_worker(
            client,
            Arc::new(Mutex::new(PlaybackController::new())),
            Arc::new(RwLock::new(VoiceConfig::default())),
            stats.clone(),
            true,
            1,
        );
        handle.queue_post(post("nice")).await;

        let s = stats.clone();
        settle(move || s.skipped() == 1).await;
        assert_eq!(stats.skipped(), 1);
        assert_eq!(fake.request_count(), 0);
    }
}
