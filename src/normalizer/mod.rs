//! Text hygiene for observed posts.
//!
//! - [`collapse_whitespace`] feeds the post fingerprint
//! - [`clean_for_speech`] strips things that narrate badly (URLs, mentions)
//! - [`is_spam`] flags filler content not worth narrating on its own
//! - [`priority_score`] orders posts inside a digest
//! - [`summarize`] shortens a post to its lead sentence for the digest

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("url regex"));
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("mention regex"));
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag regex"));
static PUNCTUATION_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[?!.]+$").expect("punctuation regex"));
static SHORT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{1,3}$").expect("short word regex"));
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1F300}-\x{1F5FF}\x{1F600}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{2600}-\x{27BF}\x{1F900}-\x{1F9FF}]")
        .expect("emoji regex")
});

const FILLER_WORDS: &[&str] = &[
    "ok", "k", "yes", "no", "haha", "lol", "lmao", "thanks", "thx", "ty", "cool", "nice", "wow",
];

const IMPORTANT_KEYWORDS: &[&str] = &[
    "job",
    "career",
    "opportunity",
    "hiring",
    "position",
    "ai",
    "artificial intelligence",
    "machine learning",
    "event",
    "meeting",
    "conference",
    "workshop",
    "update",
    "announcement",
    "news",
    "important",
    "deadline",
    "urgent",
    "critical",
];

const ENGAGEMENT_WORDS: &[&str] = &["please", "help", "need", "urgent", "important"];

/// Longest input considered by [`summarize`], in characters.
pub const SUMMARY_INPUT_CAP: usize = 1000;

/// Longest summary, ellipsis included.
pub const SUMMARY_MAX_LEN: usize = 150;

/// Collapse every whitespace run to a single space and trim the ends.
/// Case is preserved.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prepare post text for narration.
pub fn clean_for_speech(text: &str) -> String {
    let text = URL_RE.replace_all(text, "");
    let text = MENTION_RE.replace_all(&text, "");
    let text = HASHTAG_RE.replace_all(&text, "$1");
    collapse_whitespace(&text)
}

/// Whether the text is filler (acknowledgements, bare punctuation, emoji).
pub fn is_spam(text: &str) -> bool {
    let lower = text.trim().to_lowercase();

    if lower.chars().count() < 5 {
        return true;
    }

    if FILLER_WORDS.contains(&lower.as_str())
        || PUNCTUATION_ONLY_RE.is_match(&lower)
        || SHORT_WORD_RE.is_match(&lower)
    {
        return true;
    }

    let total = text.chars().count();
    let emoji = EMOJI_RE.find_iter(text).count();
    emoji * 2 > total
}

/// Terminate with a period unless the text already ends a sentence.
pub fn end_sentence(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(['.', '?', '!']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Lead sentence of the cleaned text, cut to [`SUMMARY_MAX_LEN`] characters.
pub fn summarize(text: &str) -> String {
    let cleaned: String = clean_for_speech(text)
        .chars()
        .take(SUMMARY_INPUT_CAP)
        .collect();
    let lead = cleaned.split(". ").next().unwrap_or_default();

    let summary = end_sentence(lead);
    if summary.chars().count() <= SUMMARY_MAX_LEN {
        return summary;
    }
    let cut: String = summary.chars().take(SUMMARY_MAX_LEN - 3).collect();
    format!("{}...", cut)
}

/// Heuristic importance score; higher narrates earlier in a digest.
pub fn priority_score(text: &str) -> f64 {
    let mut score = 0.0;

    let length = text.chars().count();
    if (50..=300).contains(&length) {
        score += 2.0;
    } else if length > 300 {
        score += 1.0;
    }

    let lower = text.to_lowercase();
    score += IMPORTANT_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count() as f64;

    if text.contains('?') {
        score += 0.5;
    }

    score += ENGAGEMENT_WORDS.iter().filter(|w| lower.contains(*w)).count() as f64 * 0.3;

    score
}
