//! Rolling digest of observed posts.
//!
//! Posts are collected into a [`DigestWindow`] spanning the configured
//! horizon. [`DigestAggregator::generate`] narrates everything collected as
//! one unit, most important first, and empties the collected set. Only one
//! generation runs at a time; a second caller gets `DigestInProgress`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::app::{Result, SocialcastError};
use crate::domain::{AudioUnit, PlatformId, Post, PostId};
use crate::narration::{NarrationClient, VoiceConfig};
use crate::normalizer::{priority_score, summarize};

/// Platform tag used to fingerprint digest narrations.
pub const DIGEST_PLATFORM: &str = "digest";

const MAX_HORIZON_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone)]
pub struct DigestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub posts: Vec<Post>,
}

impl DigestWindow {
    fn open(now: DateTime<Utc>, horizon: Duration) -> Self {
        Self {
            start: now,
            end: now + horizon,
            posts: Vec::new(),
        }
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }
}

/// Clears the in-flight flag however generation exits.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DigestAggregator {
    window: Mutex<DigestWindow>,
    horizon: Duration,
    in_flight: AtomicBool,
    client: Arc<NarrationClient>,
}

impl DigestAggregator {
    pub fn new(client: Arc<NarrationClient>, horizon_hours: u64) -> Self {
        let horizon = Duration::hours(horizon_hours.clamp(1, MAX_HORIZON_HOURS) as i64);
        Self {
            window: Mutex::new(DigestWindow::open(Utc::now(), horizon)),
            horizon,
            in_flight: AtomicBool::new(false),
            client,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DigestWindow> {
        self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Posts waiting for the next digest.
    pub fn pending(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn window(&self) -> DigestWindow {
        self.lock().clone()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn collect(&self, post: Post) {
        self.collect_at(post, Utc::now());
    }

    /// Add `post` to the current window, first rolling to a fresh window if
    /// the horizon has passed. Posts left in an expired window are dropped.
    pub fn collect_at(&self, post: Post, now: DateTime<Utc>) {
        let mut window = self.lock();
        if window.expired(now) {
            if !window.posts.is_empty() {
                info!(
                    "Digest window expired with {} uncollected post(s)",
                    window.posts.len()
                );
            }
            *window = DigestWindow::open(now, self.horizon);
        }
        window.posts.push(post);
    }

    pub async fn generate(
        &self,
        hours: Option<u32>,
        voice: &VoiceConfig,
    ) -> Result<Option<AudioUnit>> {
        self.generate_at(hours, voice, Utc::now()).await
    }

    /// Narrate every collected post observed within the last `hours` (all
    /// of them when `None`). `Ok(None)` when there is nothing to narrate.
    pub async fn generate_at(
        &self,
        hours: Option<u32>,
        voice: &VoiceConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<AudioUnit>> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(SocialcastError::DigestInProgress)?;

        let taken = std::mem::take(&mut self.lock().posts);
        let cutoff = hours.map(|h| now - Duration::hours(i64::from(h)));
        let posts: Vec<Post> = taken
            .into_iter()
            .filter(|p| cutoff.map_or(true, |c| p.timestamp() >= c))
            .collect();

        if posts.is_empty() {
            debug!("Digest requested with nothing collected");
            self.roll_if_expired(now);
            return Ok(None);
        }

        let text = digest_text(&posts);
        let id = PostId::from_content(&PlatformId::new(DIGEST_PLATFORM), &text);
        info!("Generating digest of {} post(s)", posts.len());

        match self.client.narrate_text(&id, &text, voice).await {
            Ok(unit) => {
                self.roll_if_expired(now);
                Ok(Some(unit))
            }
            Err(e) => {
                warn!("Digest narration failed, keeping {} post(s): {}", posts.len(), e);
                let mut window = self.lock();
                let newer = std::mem::replace(&mut window.posts, posts);
                window.posts.extend(newer);
                Err(e)
            }
        }
    }

    fn roll_if_expired(&self, now: DateTime<Utc>) {
        let mut window = self.lock();
        if window.expired(now) {
            window.start = now;
            window.end = now + self.horizon;
        }
    }
}

/// Build the spoken digest, highest priority first. Ties keep collection
/// order.
pub fn digest_text(posts: &[Post]) -> String {
    let mut ranked: Vec<(f64, &Post)> = posts
        .iter()
        .map(|p| (priority_score(p.content()), p))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut text = format!("Here's your {}-post social media digest: ", posts.len());
    for (i, (_, post)) in ranked.iter().enumerate() {
        text.push_str(&format!(
            "Post {} from {} on {}: {} ",
            i + 1,
            post.author(),
            post.platform(),
            summarize(post.content())
        ));
    }
    text.push_str("That concludes your social media digest. Thanks for listening!");
    text
}
