use std::collections::HashSet;

use crate::domain::PostId;

/// Content-addressed set of posts already emitted in this page session.
///
/// This is the only gate against narrating the same content twice when a
/// virtualized feed re-renders nodes. Cleared only by [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<PostId>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, id: &PostId) -> bool {
        self.seen.contains(id)
    }

    pub fn record(&mut self, id: PostId) {
        self.seen.insert(id);
    }

    /// Record `id`, returning true only the first time it is seen.
    pub fn admit(&mut self, id: &PostId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.clone())
    }

    /// Forget everything, e.g. after navigating to a new page context.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
