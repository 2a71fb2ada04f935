//! Pattern rules and their ranking contract

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use textglass_core::{Error, Result};

/// Rank of every Strong pattern
pub const STRONG_RANK: i64 = 10_000_000;

/// Base rank added to a Weak pattern's rank value
pub const WEAK_RANK_BASE: i64 = 100_000;

/// Largest absolute rank value a pattern may declare
pub const MAX_RANK_VALUE: i32 = 1000;

/// How a pattern's tokens must appear in the matched token stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternType {
    /// Any one token present
    Simple,
    /// Every token present, any order
    SimpleAnd,
    /// Every token present, in declared order
    SimpleOrderedAnd,
}

/// Priority class of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankType {
    /// Always wins over Weak and None
    Strong,
    /// Wins over None
    Weak,
    /// Ranked by value only
    None,
}

impl FromStr for PatternType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Simple" => Ok(Self::Simple),
            "SimpleAnd" => Ok(Self::SimpleAnd),
            "SimpleOrderedAnd" => Ok(Self::SimpleOrderedAnd),
            other => Err(Error::config(format!("Unknown patternType: {}", other))),
        }
    }
}

impl FromStr for RankType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Strong" => Ok(Self::Strong),
            "Weak" => Ok(Self::Weak),
            "None" => Ok(Self::None),
            other => Err(Error::config(format!("Unknown rankType: {}", other))),
        }
    }
}

/// An immutable matching rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    id: String,
    pattern_type: PatternType,
    tokens: Vec<String>,
    rank_type: RankType,
    rank_value: i32,
}

impl Pattern {
    /// Create a validated pattern
    pub fn new(
        id: impl Into<String>,
        pattern_type: PatternType,
        tokens: Vec<String>,
        rank_type: RankType,
        rank_value: i32,
    ) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::config("patternId not found"));
        }

        if !(-MAX_RANK_VALUE..=MAX_RANK_VALUE).contains(&rank_value) {
            return Err(Error::config(format!(
                "Invalid rankValue in {}: {}",
                id, rank_value
            )));
        }

        if rank_type == RankType::Strong && rank_value != 0 {
            return Err(Error::config(format!(
                "Strong pattern {} cannot have a rankValue",
                id
            )));
        }

        if tokens.is_empty() {
            return Err(Error::config(format!("No patternTokens found for: {}", id)));
        }

        if tokens.iter().any(|t| t.is_empty()) {
            return Err(Error::config(format!("Empty patternToken in {}", id)));
        }

        if tokens.len() < 2 && pattern_type != PatternType::Simple {
            return Err(Error::config(format!(
                "patternType {:?} requires more than 1 patternToken: {}",
                pattern_type, id
            )));
        }

        Ok(Self {
            id,
            pattern_type,
            tokens,
            rank_type,
            rank_value,
        })
    }

    /// Pattern id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Match type
    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Tokens, in declared order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Rank class
    pub fn rank_type(&self) -> RankType {
        self.rank_type
    }

    /// Declared rank value
    pub fn rank_value(&self) -> i32 {
        self.rank_value
    }

    /// Whether this pattern is satisfied by `matched`.
    ///
    /// Positions are first occurrences in scan order.
    pub fn is_valid<S: AsRef<str>>(&self, matched: &[S]) -> bool {
        match self.pattern_type {
            PatternType::Simple => self.tokens.iter().any(|t| position(matched, t).is_some()),

            PatternType::SimpleAnd => self.tokens.iter().all(|t| position(matched, t).is_some()),

            PatternType::SimpleOrderedAnd => {
                let mut last: Option<usize> = None;

                for token in &self.tokens {
                    match position(matched, token) {
                        Some(found) if last.map_or(true, |l| found > l) => last = Some(found),
                        _ => return false,
                    }
                }

                true
            }
        }
    }

    /// Rank used to compare valid patterns
    pub fn rank(&self) -> i64 {
        match self.rank_type {
            RankType::Strong => STRONG_RANK,
            RankType::Weak => WEAK_RANK_BASE + i64::from(self.rank_value),
            RankType::None => i64::from(self.rank_value),
        }
    }

    /// Total character length of this pattern's tokens present in `matched`,
    /// each token counted once
    pub fn matched_length<S: AsRef<str>>(&self, matched: &[S]) -> usize {
        self.tokens
            .iter()
            .filter(|t| position(matched, t).is_some())
            .map(|t| t.chars().count())
            .sum()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patternId: {}, patternType: {:?} {:?}, rankType: {:?}:{}",
            self.id, self.pattern_type, self.tokens, self.rank_type, self.rank_value
        )
    }
}

fn position<S: AsRef<str>>(matched: &[S], token: &str) -> Option<usize> {
    matched.iter().position(|m| m.as_ref() == token)
}
