//! Splits post text into speech-request sized chunks.
//!
//! Sizes are counted in characters. Text that fits is returned untouched.
//! Longer text is packed greedily by sentence (`". "` delimiter); a sentence
//! that alone exceeds the limit is packed by word, and a single word longer
//! than the limit is hard-truncated (the only lossy case).

use crate::domain::{Chunk, PostId};

/// Request size limit of the speech service.
pub const MAX_CHUNK: usize = 3000;

const SENTENCE_DELIMITER: &str = ". ";

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(MAX_CHUNK)
    }
}

impl Chunker {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Chunk `text` for the post `post_id`; indices are contiguous from 0.
    pub fn chunk(&self, post_id: &PostId, text: &str) -> Vec<Chunk> {
        split(text, self.max_size)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                post_id: post_id.clone(),
                index,
                text,
            })
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into ordered, non-empty pieces of at most `max_size` chars.
pub fn split(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);

    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let mut packer = Packer::new(max_size);
    for sentence in text.split_inclusive(SENTENCE_DELIMITER) {
        packer.push_sentence(sentence);
    }
    packer.finish()
}

struct Packer {
    max: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl Packer {
    fn new(max: usize) -> Self {
        Self {
            max,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.current.clear();
        self.current_len = 0;
    }

    fn append(&mut self, s: &str, len: usize) {
        self.current.push_str(s);
        self.current_len += len;
    }

    fn push_sentence(&mut self, sentence: &str) {
        let len = char_len(sentence);
        if self.current_len + len <= self.max {
            self.append(sentence, len);
            return;
        }

        self.flush();
        if len <= self.max {
            self.append(sentence, len);
        } else {
            self.push_words(sentence);
        }
    }

    fn push_words(&mut self, sentence: &str) {
        for word in sentence.split_whitespace() {
            let len = char_len(word);

            if len > self.max {
                self.flush();
                self.chunks.push(word.chars().take(self.max).collect());
                continue;
            }

            let separator = usize::from(self.current_len > 0);
            if self.current_len + separator + len > self.max {
                self.flush();
            }
            if self.current_len > 0 {
                self.append(" ", 1);
            }
            self.append(word, len);
        }

        // Keep the gap to whatever sentence follows.
        if self.current_len > 0 && sentence.ends_with(char::is_whitespace) {
            self.append(" ", 1);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
