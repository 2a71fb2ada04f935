//! Token-indexed pattern storage

use crate::pattern::Pattern;
use indexmap::IndexMap;

/// Stable handle to a pattern stored in a [`PatternIndex`]
pub type PatternHandle = usize;

/// Maps every pattern token to the patterns containing it.
///
/// Patterns are only ever appended; per-token lists keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct PatternIndex {
    patterns: Vec<Pattern>,
    by_token: IndexMap<String, Vec<PatternHandle>>,
}

impl PatternIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pattern, indexing it under each of its tokens
    pub fn insert(&mut self, pattern: Pattern) -> PatternHandle {
        let handle = self.patterns.len();

        for token in pattern.tokens() {
            let entries = self.by_token.entry(token.clone()).or_default();
            // a token repeated within one pattern indexes it once
            if entries.last() != Some(&handle) {
                entries.push(handle);
            }
        }

        self.patterns.push(pattern);
        handle
    }

    /// Patterns containing `token`, in insertion order
    pub fn lookup(&self, token: &str) -> Option<&[PatternHandle]> {
        self.by_token.get(token).map(Vec::as_slice)
    }

    /// Resolve a handle returned by [`insert`](Self::insert) or [`lookup`](Self::lookup)
    pub fn get(&self, handle: PatternHandle) -> Option<&Pattern> {
        self.patterns.get(handle)
    }

    /// Number of patterns stored
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns are stored
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of distinct indexed tokens
    pub fn token_count(&self) -> usize {
        self.by_token.len()
    }

    /// All patterns in insertion order
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
