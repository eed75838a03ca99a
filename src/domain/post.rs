use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalizer::collapse_whitespace;

/// Identifier of a platform entry in the selector registry (e.g. `twitter`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Content fingerprint used as the deduplication key.
///
/// Derived from the whitespace-collapsed (case-preserved) content and the
/// platform tag, so a re-rendered DOM node maps to the same id. Two distinct
/// posts with identical text on one platform share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn from_content(platform: &PlatformId, content: &str) -> Self {
        let normalized = collapse_whitespace(content);
        let mut hasher = Sha256::new();
        hasher.update(platform.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(normalized.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Text,
    Image,
    Video,
    Link,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Text => "text",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Link => "link",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed unit of social content. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    id: PostId,
    platform: PlatformId,
    author: String,
    content: String,
    media_kind: MediaKind,
    source_url: Option<String>,
    observed_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        platform: PlatformId,
        author: impl Into<String>,
        content: impl Into<String>,
        media_kind: MediaKind,
        source_url: Option<String>,
    ) -> Self {
        Self::observed_at(platform, author, content, media_kind, source_url, Utc::now())
    }

    pub fn observed_at(
        platform: PlatformId,
        author: impl Into<String>,
        content: impl Into<String>,
        media_kind: MediaKind,
        source_url: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        let id = PostId::from_content(&platform, &content);
        Self {
            id,
            platform,
            author: author.into(),
            content,
            media_kind,
            source_url,
            observed_at,
        }
    }

    pub fn id(&self) -> &PostId {
        &self.id
    }

    pub fn platform(&self) -> &PlatformId {
        &self.platform
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_deterministic() {
        let p = PlatformId::new("twitter");
        let id1 = PostId::from_content(&p, "Hello world, this is a post");
        let id2 = PostId::from_content(&p, "Hello world, this is a post");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_id_ignores_whitespace_layout() {
        let p = PlatformId::new("twitter");
        let id1 = PostId::from_content(&p, "Hello   world,\n this is a post ");
        let id2 = PostId::from_content(&p, "Hello world, this is a post");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_id_preserves_case() {
        let p = PlatformId::new("twitter");
        let id1 = PostId::from_content(&p, "Hello world");
        let id2 = PostId::from_content(&p, "hello world");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_depends_on_platform() {
        let id1 = PostId::from_content(&PlatformId::new("twitter"), "Same text here");
        let id2 = PostId::from_content(&PlatformId::new("linkedin"), "Same text here");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_is_hex_sha256() {
        let id = PostId::from_content(&PlatformId::new("x"), "content");
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_platform_id_normalized() {
        assert_eq!(PlatformId::new(" LinkedIn "), PlatformId::new("linkedin"));
    }

    #[test]
    fn test_post_id_matches_content() {
        let post = Post::new(
            PlatformId::new("twitter"),
            "alice",
            "Shipping the new release today",
            MediaKind::Text,
            None,
        );
        assert_eq!(
            post.id(),
            &PostId::from_content(&PlatformId::new("twitter"), "Shipping the new release today")
        );
        assert_eq!(post.media_kind().as_str(), "text");
    }
}
