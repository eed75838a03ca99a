//! # SocialCast
//!
//! Turns live social media feeds into spoken audio.
//!
//! ## Architecture
//!
//! SocialCast follows a pipeline architecture:
//!
//! ```text
//! Page mutations → Extractor → Deduplicator → Chunker → Narration → Playback
//!                                          └──────────▶ Digest
//! ```
//!
//! - [`observer`]: Watches a Chrome page for newly rendered posts
//! - [`extractor`]: Platform-aware post extraction from HTML subtrees
//! - [`chunker`]: Splits text to the speech service's request limit
//! - [`narration`]: Speech synthesis client and background worker
//! - [`playback`]: Play queue and transport state machine
//! - [`digest`]: Rolling digest of everything observed
//!
//! ## Quick Start
//!
//! ```bash
//! # Narrate a feed as new posts appear
//! MURF_API_KEY=... socialcast watch https://www.linkedin.com/feed/
//!
//! # Check how a long text would be split
//! socialcast chunk article.txt
//!
//! # List voices and platforms
//! socialcast voices
//! socialcast platforms
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// pipeline, narration, playback, digest.
pub mod app;

/// Text chunking for the speech service.
pub mod chunker;

/// Command-line interface using clap.
///
/// - `watch <url>` - Observe a page and narrate new posts
/// - `chunk [file]` - Show how text would be chunked
/// - `voices` - List narration voices
/// - `platforms` - List registered platforms
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/socialcast/config.toml`, supporting:
/// - Browser, narration, extraction and digest settings
/// - Custom platform selector entries
pub mod config;

/// Content-addressed deduplication of observed posts.
pub mod dedup;

/// Rolling digest window and digest narration.
pub mod digest;

/// Core domain models.
///
/// - [`Post`](domain::Post): An observed post with its SHA256 [`PostId`](domain::PostId)
/// - [`Chunk`](domain::Chunk): A bounded slice of text for one speech request
/// - [`AudioUnit`](domain::AudioUnit): Playable audio for one post
pub mod domain;

/// Post extraction from rendered HTML.
pub mod extractor;

/// Speech synthesis.
///
/// - [`SpeechService`](narration::SpeechService): Async trait for speech engines
/// - [`MurfService`](narration::MurfService): reqwest-based implementation
/// - [`NarrationClient`](narration::NarrationClient): Chunk-ordered narration
pub mod narration;

/// Text cleanup, spam detection and digest priority.
pub mod normalizer;

/// Mutation sources and the observation loop.
///
/// Uses Chrome via chromiumoxide to watch the feed page.
pub mod observer;

/// Listening state, extraction and deduplication for one page.
pub mod pipeline;

/// Play queue, transport commands and voice commands.
pub mod playback;

/// Compiled per-platform selector rules.
pub mod registry;
