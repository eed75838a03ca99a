use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::Deduplicator;
use crate::domain::{PipelineState, PlatformId, Post};
use crate::extractor::Extractor;
use crate::observer::MutationBatch;

/// Listening flag, counters and dedup set for one watched page, shared by
/// the observation loop and the command surface.
pub struct Pipeline {
    state: PipelineState,
    platform: PlatformId,
    extractor: Extractor,
    dedup: Deduplicator,
    posts_observed: usize,
    by_platform: BTreeMap<String, usize>,
}

/// Lock a shared pipeline, ignoring poisoning.
pub fn lock_pipeline(pipeline: &Mutex<Pipeline>) -> MutexGuard<'_, Pipeline> {
    pipeline.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub is_listening: bool,
    pub platform: String,
    pub posts_observed: usize,
    pub posts_by_platform: BTreeMap<String, usize>,
}

impl Pipeline {
    pub fn new(extractor: Extractor, platform: PlatformId) -> Self {
        Self {
            state: PipelineState::Idle,
            platform,
            extractor,
            dedup: Deduplicator::new(),
            posts_observed: 0,
            by_platform: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == PipelineState::Listening
    }

    pub fn platform(&self) -> &PlatformId {
        &self.platform
    }

    /// Returns false if already listening.
    pub fn start(&mut self) -> bool {
        if self.is_listening() {
            return false;
        }
        info!("Listening for {} posts", self.platform);
        self.state = PipelineState::Listening;
        true
    }

    /// Idempotent. Batches delivered afterwards are discarded.
    pub fn stop(&mut self) -> bool {
        if !self.is_listening() {
            return false;
        }
        info!("Stopped listening");
        self.state = PipelineState::Idle;
        true
    }

    /// Switch to a new page context: forget every post seen so far.
    pub fn reset(&mut self, platform: PlatformId) {
        debug!("Resetting pipeline for {} ({} posts forgotten)", platform, self.dedup.len());
        self.platform = platform;
        self.dedup.reset();
    }

    /// Extract and deduplicate one notification batch, returning only posts
    /// not seen before in this page context.
    pub fn process_batch(&mut self, batch: &MutationBatch) -> Vec<Post> {
        if !self.is_listening() {
            return Vec::new();
        }

        let mut fresh = Vec::new();
        for fragment in &batch.fragments {
            let candidates = match self.extractor.extract(fragment, &self.platform) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Extraction failed: {}", e);
                    continue;
                }
            };

            for candidate in candidates {
                let post = Post::new(
                    self.platform.clone(),
                    candidate.author,
                    candidate.text,
                    candidate.media_kind,
                    batch.page_url.clone(),
                );
                if !self.dedup.admit(post.id()) {
                    continue;
                }

                self.posts_observed += 1;
                *self
                    .by_platform
                    .entry(self.platform.to_string())
                    .or_default() += 1;
                debug!("New {} post {} by {}", post.platform(), post.id().short(), post.author());
                fresh.push(post);
            }
        }
        fresh
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            is_listening: self.is_listening(),
            platform: self.platform.to_string(),
            posts_observed: self.posts_observed,
            posts_by_platform: self.by_platform.clone(),
        }
    }
}
