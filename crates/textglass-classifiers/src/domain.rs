//! Domain loading and the frozen classification snapshot
//!
//! Loading happens on a mutable [`DomainBuilder`]: the base pattern document
//! establishes the domain identity, then patch and attribute documents merge
//! into it. [`DomainBuilder::build`] consumes the builder and yields an
//! immutable [`Domain`], which only supports classification.
//!
//! A failed load leaves the builder unusable: every later load and `build`
//! return an error, so a partially merged document never reaches a `Domain`.

use crate::attributes::AttributeStore;
use crate::config::{Document, DocumentType};
use crate::index::PatternIndex;
use crate::matcher::MatchState;
use crate::ngram::Ngrams;
use crate::pattern::Pattern;
use crate::tokenizer::Tokenizer;
use crate::transformer::{Transformer, TransformerPipeline};
use std::time::Instant;
use textglass_core::{AttributeMap, DomainIdentity, Error, Result};
use tracing::{debug, info, trace, warn};

/// Mutable load-phase state
#[derive(Debug)]
pub struct DomainBuilder {
    identity: Option<DomainIdentity>,
    transformers: Vec<Transformer>,
    separators: Vec<String>,
    ngram_width: usize,
    index: PatternIndex,
    attributes: AttributeStore,
    default_id: Option<String>,
    attribute_document_loaded: bool,
    failure: Option<String>,
}

impl Default for DomainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            identity: None,
            transformers: Vec::new(),
            separators: Vec::new(),
            ngram_width: 1,
            index: PatternIndex::new(),
            attributes: AttributeStore::new(),
            default_id: None,
            attribute_document_loaded: false,
            failure: None,
        }
    }

    /// Load a complete domain in one step.
    ///
    /// Every document's type and identity is checked against the pattern
    /// document before anything is merged.
    pub fn load(
        pattern: &Document,
        pattern_patch: Option<&Document>,
        attribute: Option<&Document>,
        attribute_patch: Option<&Document>,
    ) -> Result<Domain> {
        pattern.expect_type(DocumentType::Pattern)?;

        let optional = [
            (pattern_patch, DocumentType::PatternPatch),
            (attribute, DocumentType::Attribute),
            (attribute_patch, DocumentType::AttributePatch),
        ];

        for (doc, expected) in optional {
            if let Some(doc) = doc {
                doc.expect_type(expected)?;
                check_identity(&pattern.identity, doc)?;
            }
        }

        let mut builder = Self::new();
        builder.load_patterns(pattern)?;

        if let Some(doc) = pattern_patch {
            builder.load_pattern_patch(doc)?;
        }

        if let Some(doc) = attribute {
            builder.load_attributes(doc)?;
        }

        if let Some(doc) = attribute_patch {
            builder.load_attribute_patch(doc)?;
        }

        builder.build()
    }

    /// Identity established by the base pattern document
    pub fn identity(&self) -> Option<&DomainIdentity> {
        self.identity.as_ref()
    }

    /// Whether an earlier load failed
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Load the base pattern document; allowed once per builder
    pub fn load_patterns(&mut self, doc: &Document) -> Result<()> {
        self.guarded(|builder| {
            doc.expect_type(DocumentType::Pattern)?;

            if let Some(identity) = &builder.identity {
                return Err(Error::already_initialized(format!(
                    "pattern document for {} has already been loaded",
                    identity
                )));
            }

            builder.identity = Some(doc.identity.clone());
            builder.merge_patterns(doc, false)
        })
    }

    /// Merge a pattern patch: replaces the normalization pipeline and the
    /// separator list when present, appends patterns
    pub fn load_pattern_patch(&mut self, doc: &Document) -> Result<()> {
        self.guarded(|builder| {
            doc.expect_type(DocumentType::PatternPatch)?;
            builder.check_identity(doc)?;
            builder.merge_patterns(doc, true)
        })
    }

    /// Load the base attribute document; allowed once per builder
    pub fn load_attributes(&mut self, doc: &Document) -> Result<()> {
        self.guarded(|builder| {
            doc.expect_type(DocumentType::Attribute)?;
            builder.check_identity(doc)?;

            if builder.attribute_document_loaded {
                return Err(Error::config(
                    "attribute document already loaded, use an attributePatch document",
                ));
            }

            builder.merge_attributes(doc)?;
            builder.attribute_document_loaded = true;
            Ok(())
        })
    }

    /// Merge an attribute patch, adding or replacing individual attribute sets
    pub fn load_attribute_patch(&mut self, doc: &Document) -> Result<()> {
        self.guarded(|builder| {
            doc.expect_type(DocumentType::AttributePatch)?;
            builder.check_identity(doc)?;
            builder.merge_attributes(doc)
        })
    }

    /// Freeze the loaded state into a [`Domain`]
    pub fn build(self) -> Result<Domain> {
        if let Some(reason) = &self.failure {
            return Err(unusable(reason));
        }

        let identity = self
            .identity
            .ok_or_else(|| Error::config("no pattern document loaded"))?;

        self.attributes.check_acyclic()?;

        let parser = InputParser {
            transformers: TransformerPipeline::new(self.transformers),
            tokenizer: Tokenizer::new(self.separators)?,
            ngram_width: self.ngram_width,
        };

        info!(
            "Domain {} ready: {} pattern(s), {} indexed token(s), {} attribute set(s)",
            identity,
            self.index.len(),
            self.index.token_count(),
            self.attributes.len()
        );

        Ok(Domain {
            identity,
            parser,
            index: self.index,
            attributes: self.attributes,
            default_id: self.default_id,
        })
    }

    /// Run one load step; the first failure marks the builder unusable
    fn guarded<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if let Some(reason) = &self.failure {
            return Err(unusable(reason));
        }

        let result = step(self);

        if let Err(e) = &result {
            warn!("Load failed, discarding domain: {}", e);
            self.failure = Some(e.to_string());
        }

        result
    }

    fn check_identity(&self, doc: &Document) -> Result<()> {
        let identity = self.identity.as_ref().ok_or_else(|| {
            Error::config(format!(
                "{} document loaded before the pattern document",
                doc.doc_type
            ))
        })?;

        check_identity(identity, doc)
    }

    fn merge_patterns(&mut self, doc: &Document, patch: bool) -> Result<()> {
        info!(
            "Loading pattern domain: {}{}",
            doc.identity,
            if patch { ", patch" } else { "" }
        );

        if let Some(parser) = &doc.input_parser {
            if let Some(transformers) = parser.to_transformers()? {
                for transformer in &transformers {
                    debug!("Found transformer: {}", transformer);
                }

                if patch {
                    self.transformers = transformers;
                } else {
                    self.transformers.extend(transformers);
                }
            }

            info!("Found {} transformer(s)", self.transformers.len());

            if let Some(separators) = parser.to_separators()? {
                for separator in &separators {
                    debug!("Found tokenSeperator: '{}'", separator);
                }

                if patch {
                    self.separators = separators;
                } else {
                    self.separators.extend(separators);
                }

                info!("Found {} tokenSeperator(s)", self.separators.len());
            }

            if let Some(width) = parser.to_ngram_width()? {
                debug!("Found ngramConcatSize: {}", width);
                self.ngram_width = width;
            }
        }

        if let Some(pattern_set) = &doc.pattern_set {
            if let Some(default_id) = pattern_set.default_id() {
                debug!("Found defaultId: {}", default_id);
                self.default_id = Some(default_id.to_string());
            }

            let expected = pattern_set.expected_count()?;
            let patterns = pattern_set.to_patterns()?;
            let count = patterns.len();

            if count == 0 && self.default_id.is_none() {
                return Err(Error::config(format!(
                    "No patterns found in {} document",
                    doc.doc_type
                )));
            }

            if let Some(expected) = expected {
                if expected != count {
                    return Err(Error::config(format!(
                        "Bad simpleHashCount value, found: {}, expected: {}",
                        expected, count
                    )));
                }
            }

            for pattern in patterns {
                trace!("{}", pattern);
                self.index.insert(pattern);
            }

            info!("Found {} pattern(s), total: {}", count, self.index.len());
        }

        if doc.attributes.is_some() {
            self.merge_attributes(doc)?;
        }

        Ok(())
    }

    fn merge_attributes(&mut self, doc: &Document) -> Result<()> {
        info!("Loading attributes: {} ({})", doc.identity, doc.doc_type);

        let mut count = 0;

        for (pattern_id, spec) in doc.attributes.iter().flatten() {
            let set = spec.to_attribute_set(pattern_id)?;
            trace!("Attribute patternId: {}, attribute(s): {:?}", pattern_id, set.attributes());
            self.attributes.insert(set);
            count += 1;
        }

        if count == 0 {
            return Err(Error::config(format!(
                "No attributes found in {} document",
                doc.doc_type
            )));
        }

        info!("Found {} attribute set(s), total: {}", count, self.attributes.len());
        Ok(())
    }
}

fn unusable(reason: &str) -> Error {
    Error::config(format!("builder unusable after a failed load: {}", reason))
}

fn check_identity(identity: &DomainIdentity, doc: &Document) -> Result<()> {
    identity
        .check_matches(&doc.identity)
        .map_err(|e| Error::domain_mismatch(format!("{} document: {}", doc.doc_type, e)))
}

/// Input normalization, tokenization and n-gram settings
#[derive(Debug, Clone)]
pub struct InputParser {
    transformers: TransformerPipeline,
    tokenizer: Tokenizer,
    ngram_width: usize,
}

impl InputParser {
    /// Normalization pipeline
    pub fn transformers(&self) -> &TransformerPipeline {
        &self.transformers
    }

    /// Token separators in priority order
    pub fn separators(&self) -> &[String] {
        self.tokenizer.separators()
    }

    /// Maximum n-gram width
    pub fn ngram_width(&self) -> usize {
        self.ngram_width
    }

    /// Apply the normalization pipeline
    pub fn normalize(&self, input: &str) -> Result<String> {
        self.transformers.apply(input)
    }

    /// Tokenize normalized input
    pub fn tokenize<'a>(&self, normalized: &'a str) -> Vec<&'a str> {
        self.tokenizer.split(normalized)
    }

    /// N-gram stream over tokens
    pub fn ngrams<'a>(&self, tokens: &'a [&'a str]) -> Ngrams<'a, &'a str> {
        Ngrams::new(tokens, self.ngram_width)
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Match,
    Default,
    NoMatch,
    Error,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Default => "default",
            Self::NoMatch => "none",
            Self::Error => "error",
        }
    }
}

/// Immutable, loaded domain. Classification only reads it, so a `Domain`
/// may be shared across threads freely.
#[derive(Debug, Clone)]
pub struct Domain {
    identity: DomainIdentity,
    parser: InputParser,
    index: PatternIndex,
    attributes: AttributeStore,
    default_id: Option<String>,
}

impl Domain {
    /// Start loading a new domain
    pub fn builder() -> DomainBuilder {
        DomainBuilder::new()
    }

    /// Domain name and version
    pub fn identity(&self) -> &DomainIdentity {
        &self.identity
    }

    /// Input parsing settings
    pub fn input_parser(&self) -> &InputParser {
        &self.parser
    }

    /// Pattern index
    pub fn index(&self) -> &PatternIndex {
        &self.index
    }

    /// Attribute sets
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Pattern id used when nothing matches
    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    /// Run matching only and return the winning pattern.
    ///
    /// Fails when the normalization pipeline fails on `input`.
    pub fn find_winner(&self, input: &str) -> Result<Option<&Pattern>> {
        let normalized = self.parser.normalize(input)?;
        trace!("Transformed: '{}'", normalized);

        let tokens = self.parser.tokenize(&normalized);
        trace!("Tokens: {:?}", tokens);

        let state = MatchState::scan(&self.index, self.parser.ngrams(&tokens));
        trace!("Matched tokens: {:?}", state.matched_tokens());

        let winner = state.select(&self.index);
        trace!("Winner: {}", winner.map_or("none", Pattern::id));

        Ok(winner)
    }

    /// Classify `input` and resolve the winner's attributes.
    ///
    /// Returns `None` only when nothing matched and no default id is set.
    pub fn classify(&self, input: &str) -> Result<Option<AttributeMap>> {
        let start = Instant::now();
        debug!("Classify: '{}'", input);

        let winner = match self.find_winner(input) {
            Ok(winner) => winner,
            Err(e) => {
                record(Outcome::Error, start);
                return Err(e);
            }
        };

        let (outcome, pattern_id) = match (winner, self.default_id.as_deref()) {
            (Some(pattern), _) => (Outcome::Match, Some(pattern.id())),
            (None, Some(default_id)) => (Outcome::Default, Some(default_id)),
            (None, None) => (Outcome::NoMatch, None),
        };

        let result = pattern_id.map(|id| self.attributes.resolve(id, input));
        trace!("Attribute map: {:?}", result);

        record(outcome, start);
        Ok(result)
    }

    /// Classify possibly absent input; absent input is treated as empty
    pub fn classify_opt(&self, input: Option<&str>) -> Result<Option<AttributeMap>> {
        self.classify(input.unwrap_or(""))
    }
}

fn record(outcome: Outcome, start: Instant) {
    metrics::counter!("textglass_classifications_total", "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!("textglass_classify_latency_us").record(start.elapsed().as_micros() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Document {
        Document::from_json(json).unwrap()
    }

    fn base() -> Document {
        doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "inputParser": {
                "transformers": [{"type": "LowerCase"}],
                "tokenSeperators": [" "]
            },
            "patternSet": {
                "simpleHashCount": 2,
                "patterns": [
                    {"patternId": "hello", "patternType": "Simple", "patternTokens": ["hello"], "rankType": "None"},
                    {"patternId": "world", "patternType": "Simple", "patternTokens": ["world"], "rankType": "Weak"}
                ]
            }
        }"#)
    }

    #[test]
    fn test_build_and_classify() {
        let domain = DomainBuilder::load(&base(), None, None, None).unwrap();

        let result = domain.classify("HELLO there").unwrap().unwrap();
        assert_eq!(result.get("patternId").unwrap(), "hello");

        let result = domain.classify("hello world").unwrap().unwrap();
        assert_eq!(result.get("patternId").unwrap(), "world");

        assert!(domain.classify("nothing").unwrap().is_none());
        assert!(domain.classify_opt(None).unwrap().is_none());
    }

    #[test]
    fn test_second_base_load_rejected() {
        let mut builder = Domain::builder();
        builder.load_patterns(&base()).unwrap();

        let err = builder.load_patterns(&base()).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized(_)));
    }

    #[test]
    fn test_build_without_base_rejected() {
        assert!(Domain::builder().build().is_err());
    }

    #[test]
    fn test_patch_before_base_rejected() {
        let patch = doc(r#"{"specVersion": 1.0, "type": "patternPatch", "domain": "test", "domainVersion": "1.0"}"#);
        let mut builder = Domain::builder();
        assert!(builder.load_pattern_patch(&patch).is_err());
    }

    #[test]
    fn test_patch_identity_mismatch() {
        let patch = doc(r#"{"specVersion": 1.0, "type": "patternPatch", "domain": "test", "domainVersion": "2.0"}"#);
        let err = DomainBuilder::load(&base(), Some(&patch), None, None).unwrap_err();
        assert!(matches!(err, Error::DomainMismatch(_)));
    }

    #[test]
    fn test_wrong_document_type_in_slot() {
        let attributes = doc(r#"{
            "specVersion": 1.0, "type": "attribute", "domain": "test", "domainVersion": "1.0",
            "attributes": {"hello": {"attributes": {"a": "b"}}}
        }"#);

        assert!(DomainBuilder::load(&base(), Some(&attributes), None, None).is_err());
        assert!(DomainBuilder::load(&attributes, None, None, None).is_err());
    }

    #[test]
    fn test_simple_hash_count_mismatch() {
        let bad = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "patternSet": {
                "simpleHashCount": 3,
                "patterns": [{"patternId": "a", "patternType": "Simple", "patternTokens": ["a"], "rankType": "None"}]
            }
        }"#);

        assert!(DomainBuilder::load(&bad, None, None, None).is_err());
    }

    #[test]
    fn test_empty_pattern_set_needs_default() {
        let empty = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "patternSet": {"patterns": []}
        }"#);
        assert!(DomainBuilder::load(&empty, None, None, None).is_err());

        let with_default = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "patternSet": {"defaultId": "unknown", "patterns": []}
        }"#);
        let domain = DomainBuilder::load(&with_default, None, None, None).unwrap();
        let result = domain.classify("anything").unwrap().unwrap();
        assert_eq!(result.get("patternId").unwrap(), "unknown");
    }

    #[test]
    fn test_second_attribute_document_rejected() {
        let attributes = doc(r#"{
            "specVersion": 1.0, "type": "attribute", "domain": "test", "domainVersion": "1.0",
            "attributes": {"hello": {"attributes": {"a": "b"}}}
        }"#);

        let mut builder = Domain::builder();
        builder.load_patterns(&base()).unwrap();
        builder.load_attributes(&attributes).unwrap();
        assert!(builder.load_attributes(&attributes).is_err());
    }

    #[test]
    fn test_embedded_attributes_in_pattern_document() {
        let with_attributes = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "inputParser": {"tokenSeperators": [" "]},
            "patternSet": {
                "patterns": [{"patternId": "a", "patternType": "Simple", "patternTokens": ["a"], "rankType": "None"}]
            },
            "attributes": {"a": {"attributes": {"letter": "yes"}}}
        }"#);

        let domain = DomainBuilder::load(&with_attributes, None, None, None).unwrap();
        let result = domain.classify("a").unwrap().unwrap();
        assert_eq!(result.get("letter").unwrap(), "yes");
    }

    #[test]
    fn test_cyclic_parents_rejected_at_build() {
        let attributes = doc(r#"{
            "specVersion": 1.0, "type": "attribute", "domain": "test", "domainVersion": "1.0",
            "attributes": {
                "hello": {"parentId": "world"},
                "world": {"parentId": "hello"}
            }
        }"#);

        let err = DomainBuilder::load(&base(), None, Some(&attributes), None).unwrap_err();
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_normalization_failure_is_per_call() {
        let strict = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "inputParser": {"transformers": [{"type": "IsNumber"}]},
            "patternSet": {
                "patterns": [{"patternId": "n", "patternType": "Simple", "patternTokens": ["42"], "rankType": "None"}]
            }
        }"#);

        let domain = DomainBuilder::load(&strict, None, None, None).unwrap();
        assert!(matches!(domain.classify("abc"), Err(Error::Transform(_))));

        let result = domain.classify("42").unwrap().unwrap();
        assert_eq!(result.get("patternId").unwrap(), "n");
    }

    #[test]
    fn test_failed_pattern_load_poisons_builder() {
        let bad_count = doc(r#"{
            "specVersion": 1.0, "type": "pattern", "domain": "test", "domainVersion": "1.0",
            "patternSet": {
                "simpleHashCount": 5,
                "patterns": [{"patternId": "a", "patternType": "Simple", "patternTokens": ["a"], "rankType": "None"}]
            }
        }"#);

        let mut builder = Domain::builder();
        assert!(builder.load_patterns(&bad_count).is_err());
        assert!(builder.is_failed());

        // a valid document cannot rescue the builder
        assert!(builder.load_patterns(&base()).is_err());

        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("simpleHashCount"));
    }

    #[test]
    fn test_failed_attribute_patch_poisons_builder() {
        let attributes = doc(r#"{
            "specVersion": 1.0, "type": "attribute", "domain": "test", "domainVersion": "1.0",
            "attributes": {"hello": {"attributes": {"x": "original"}}}
        }"#);
        let half_bad_patch = doc(r#"{
            "specVersion": 1.0, "type": "attributePatch", "domain": "test", "domainVersion": "1.0",
            "attributes": {
                "hello": {"attributes": {"x": "patched"}},
                "world": {"attributes": {"patternId": "reserved"}}
            }
        }"#);

        let mut builder = Domain::builder();
        builder.load_patterns(&base()).unwrap();
        builder.load_attributes(&attributes).unwrap();
        assert!(builder.load_attribute_patch(&half_bad_patch).is_err());

        assert!(builder.build().is_err());

        let err = DomainBuilder::load(&base(), None, Some(&attributes), Some(&half_bad_patch)).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_mismatched_patch_poisons_builder() {
        let patch = doc(r#"{"specVersion": 1.0, "type": "patternPatch", "domain": "other", "domainVersion": "1.0"}"#);

        let mut builder = Domain::builder();
        builder.load_patterns(&base()).unwrap();
        assert!(matches!(builder.load_pattern_patch(&patch), Err(Error::DomainMismatch(_))));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_domain_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Domain>();
    }
}
