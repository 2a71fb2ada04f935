//! Candidate collection and winner selection
//!
//! Scanning records every n-gram that hits the index (in stream order,
//! duplicates kept) and the union of patterns found under those hits
//! (first-seen order). Selection keeps the valid candidate with the highest
//! rank, breaking rank ties by longer matched length and remaining ties by
//! first-seen order.

use crate::index::{PatternHandle, PatternIndex};
use crate::pattern::Pattern;
use indexmap::IndexSet;
use tracing::trace;

/// A valid candidate with its ranking keys
#[derive(Debug, Clone, Copy)]
pub struct RankedCandidate<'a> {
    pub pattern: &'a Pattern,
    pub rank: i64,
    pub matched_length: usize,
}

impl<'a> RankedCandidate<'a> {
    fn beats(&self, other: &RankedCandidate<'_>) -> bool {
        self.rank > other.rank
            || (self.rank == other.rank && self.matched_length > other.matched_length)
    }
}

/// Result of scanning an n-gram stream against a pattern index
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    matched_tokens: Vec<String>,
    candidates: IndexSet<PatternHandle>,
}

impl MatchState {
    /// Look every candidate string up in `index`
    pub fn scan<I>(index: &PatternIndex, ngrams: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = Self::default();

        for ngram in ngrams {
            if let Some(handles) = index.lookup(&ngram) {
                trace!("Hit: {}, candidates: {}", ngram, handles.len());
                state.candidates.extend(handles.iter().copied());
                state.matched_tokens.push(ngram);
            }
        }

        state
    }

    /// Matched tokens in scan order
    pub fn matched_tokens(&self) -> &[String] {
        &self.matched_tokens
    }

    /// Candidate handles in first-seen order
    pub fn candidates(&self) -> impl Iterator<Item = PatternHandle> + '_ {
        self.candidates.iter().copied()
    }

    /// Candidates that are valid for the matched tokens, in first-seen order
    pub fn ranked<'s, 'i: 's>(
        &'s self,
        index: &'i PatternIndex,
    ) -> impl Iterator<Item = RankedCandidate<'i>> + 's {
        let matched = self.matched_tokens.as_slice();

        self.candidates
            .iter()
            .filter_map(move |&handle| index.get(handle))
            .filter(move |pattern| pattern.is_valid(matched))
            .map(move |pattern| RankedCandidate {
                pattern,
                rank: pattern.rank(),
                matched_length: pattern.matched_length(matched),
            })
    }

    /// Select the winning pattern, if any candidate is valid
    pub fn select<'i>(&self, index: &'i PatternIndex) -> Option<&'i Pattern> {
        let mut winner: Option<RankedCandidate<'i>> = None;

        for candidate in self.ranked(index) {
            trace!(
                "Candidate: {}({},{})",
                candidate.pattern.id(),
                candidate.rank,
                candidate.matched_length
            );

            if winner.as_ref().map_or(true, |best| candidate.beats(best)) {
                winner = Some(candidate);
            }
        }

        winner.map(|w| w.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram::Ngrams;
    use crate::pattern::{PatternType, RankType};

    fn pattern(id: &str, pattern_type: PatternType, tokens: &[&str], rank_type: RankType, value: i32) -> Pattern {
        Pattern::new(
            id,
            pattern_type,
            tokens.iter().map(|s| s.to_string()).collect(),
            rank_type,
            value,
        )
        .unwrap()
    }

    fn scan(index: &PatternIndex, tokens: &[&str], width: usize) -> MatchState {
        MatchState::scan(index, Ngrams::new(tokens, width))
    }

    #[test]
    fn test_scan_records_hits_in_order() {
        let mut index = PatternIndex::new();
        index.insert(pattern("p1", PatternType::Simple, &["b", "a"], RankType::None, 0));

        let state = scan(&index, &["a", "x", "b", "a"], 1);
        assert_eq!(state.matched_tokens(), &["a", "b", "a"]);
        assert_eq!(state.candidates().count(), 1);
    }

    #[test]
    fn test_weak_beats_none() {
        let mut index = PatternIndex::new();
        index.insert(pattern("p3", PatternType::Simple, &["a"], RankType::None, 500));
        index.insert(pattern("p2", PatternType::SimpleAnd, &["a", "b"], RankType::Weak, 0));

        let state = scan(&index, &["a", "b"], 1);
        assert_eq!(state.select(&index).unwrap().id(), "p2");
    }

    #[test]
    fn test_strong_beats_longer_match() {
        let mut index = PatternIndex::new();
        index.insert(pattern("long", PatternType::Simple, &["abcdef"], RankType::Weak, 1000));
        index.insert(pattern("strong", PatternType::Simple, &["x"], RankType::Strong, 0));

        let state = scan(&index, &["abcdef", "x"], 1);
        assert_eq!(state.select(&index).unwrap().id(), "strong");
    }

    #[test]
    fn test_equal_rank_prefers_longer_match() {
        let mut index = PatternIndex::new();
        index.insert(pattern("short", PatternType::Simple, &["ab"], RankType::None, 0));
        index.insert(pattern("long", PatternType::Simple, &["abc"], RankType::None, 0));

        let state = scan(&index, &["ab", "abc"], 1);
        assert_eq!(state.select(&index).unwrap().id(), "long");
    }

    #[test]
    fn test_full_tie_keeps_first_seen() {
        let mut index = PatternIndex::new();
        index.insert(pattern("second", PatternType::Simple, &["b"], RankType::None, 0));
        index.insert(pattern("first", PatternType::Simple, &["a"], RankType::None, 0));

        // "a" is scanned first, so "first" is seen first
        let state = scan(&index, &["a", "b"], 1);
        assert_eq!(state.select(&index).unwrap().id(), "first");
    }

    #[test]
    fn test_ordered_and_rejects_wrong_order() {
        let mut index = PatternIndex::new();
        index.insert(pattern("p4", PatternType::SimpleOrderedAnd, &["a", "b"], RankType::None, 0));

        let state = scan(&index, &["b", "a"], 1);
        assert!(state.select(&index).is_none());

        let state = scan(&index, &["a", "b"], 1);
        assert_eq!(state.select(&index).unwrap().id(), "p4");
    }

    #[test]
    fn test_ngram_hits() {
        let mut index = PatternIndex::new();
        index.insert(pattern("nexus", PatternType::Simple, &["nexus7"], RankType::None, 0));

        let state = scan(&index, &["nexus", "7"], 2);
        assert_eq!(state.matched_tokens(), &["nexus7"]);
        assert_eq!(state.select(&index).unwrap().id(), "nexus");
    }

    #[test]
    fn test_no_hits() {
        let index = PatternIndex::new();
        let state = scan(&index, &["a"], 1);
        assert!(state.matched_tokens().is_empty());
        assert!(state.select(&index).is_none());
    }
}
