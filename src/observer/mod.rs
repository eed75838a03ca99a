//! Feeds DOM mutations from the watched page into the pipeline.
//!
//! # Architecture
//!
//! ```text
//! MutationSource ──batch──▶ Pipeline::process_batch ──new posts──▶ DigestAggregator::collect
//!                                                               └─▶ narration worker
//! ```
//!
//! Each batch is handled to completion before the next one is pulled from
//! the source. Narration is handed off to the worker, so a slow speech
//! request never delays extraction.

pub mod chrome;
pub mod config;

pub use chrome::ChromeMutationSource;
pub use config::BrowserConfig;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::digest::DigestAggregator;
use crate::domain::Post;
use crate::narration::NarrationWorkerHandle;
use crate::pipeline::{lock_pipeline, Pipeline};

/// Outer HTML of the subtrees added to the page in one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub fragments: Vec<String>,
    pub page_url: Option<String>,
}

/// Host that delivers mutation notifications.
#[async_trait]
pub trait MutationSource: Send {
    /// Wait for the next batch; `None` once the host has gone away.
    async fn next_batch(&mut self) -> Option<MutationBatch>;
}

pub struct ObservationLoop<S: MutationSource> {
    source: S,
    pipeline: Arc<Mutex<Pipeline>>,
    digest: Arc<DigestAggregator>,
    narration: NarrationWorkerHandle,
}

impl<S: MutationSource> ObservationLoop<S> {
    pub fn new(
        source: S,
        pipeline: Arc<Mutex<Pipeline>>,
        digest: Arc<DigestAggregator>,
        narration: NarrationWorkerHandle,
    ) -> Self {
        Self {
            source,
            pipeline,
            digest,
            narration,
        }
    }

    /// Process batches until the source closes.
    pub async fn run(mut self) {
        info!("Observation loop started");

        while let Some(batch) = self.source.next_batch().await {
            let posts = lock_pipeline(&self.pipeline).process_batch(&batch);
            if posts.is_empty() {
                continue;
            }
            debug!("{} new post(s) from {} fragment(s)", posts.len(), batch.fragments.len());
            self.forward(posts).await;
        }

        info!("Observation loop finished: mutation source closed");
    }

    /// Hand extracted posts to the digest and the narration worker. Returns
    /// how many went through before a stop cut the batch short.
    async fn forward(&self, posts: Vec<Post>) -> usize {
        let total = posts.len();
        let mut forwarded = 0;
        for post in posts {
            // Stopped while this batch was in flight.
            let listening = lock_pipeline(&self.pipeline).is_listening();
            if !listening {
                debug!("Discarding {} post(s) extracted before stop", total - forwarded);
                break;
            }
            self.digest.collect(post.clone());
            self.narration.queue_post(post).await;
            forwarded += 1;
        }
        forwarded
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::mpsc;

    use super::*;

    /// Mutation source fed from a channel.
    pub struct ChannelSource(pub mpsc::Receiver<MutationBatch>);

    #[async_trait]
    impl MutationSource for ChannelSource {
        async fn next_batch(&mut self) -> Option<MutationBatch> {
            self.0.recv().await
        }
    }
}
