//! TextGlass Classifiers
//!
//! Domain-driven text classification. A domain is described by JSON
//! documents (patterns, attributes, patches and tests) and classifies input
//! strings in a fixed sequence:
//!
//! 1. Normalize the input through the transformer pipeline
//! 2. Split it into tokens on the configured separators
//! 3. Expand the tokens into n-grams and look each one up in the pattern index
//! 4. Rank the valid candidates and pick a single winner
//! 5. Resolve the winner's attribute set, following `parentId` inheritance
//!
//! A loaded [`Domain`] is immutable and safe to share across threads.

pub mod attributes;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod index;
pub mod matcher;
pub mod ngram;
pub mod pattern;
pub mod tokenizer;
pub mod transformer;

pub use attributes::{AttributeSet, AttributeStore, AttributeTransformer};
pub use classifier::{Classifier, SharedClassifier};
pub use config::{Document, DocumentType, TestCaseSpec};
pub use domain::{Domain, DomainBuilder, InputParser};
pub use index::{PatternHandle, PatternIndex};
pub use matcher::{MatchState, RankedCandidate};
pub use ngram::Ngrams;
pub use pattern::{Pattern, PatternType, RankType};
pub use tokenizer::{Segment, Tokenizer};
pub use transformer::{PartIndex, Transformer, TransformerPipeline};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classifier, SharedClassifier};
    pub use crate::config::{Document, DocumentType};
    pub use crate::domain::{Domain, DomainBuilder};
    pub use crate::pattern::{Pattern, PatternType, RankType};
    pub use textglass_core::prelude::*;
}
