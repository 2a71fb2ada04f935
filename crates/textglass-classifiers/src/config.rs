//! Configuration documents
//!
//! Pattern, attribute, patch and test documents are JSON objects sharing a
//! header (`specVersion`, `type`, `domain`, `domainVersion`). Bodies are
//! deserialized into `*Spec` structs and converted to validated runtime types
//! by the `to_*` methods, which report problems as configuration errors.

use crate::attributes::{AttributeSet, AttributeTransformer};
use crate::pattern::{Pattern, PatternType, RankType};
use crate::transformer::{Transformer, TransformerPipeline};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use textglass_core::{DomainIdentity, Error, Result, SPEC_VERSION};

/// Kind of configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    Pattern,
    PatternPatch,
    Attribute,
    AttributePatch,
    Test,
}

impl DocumentType {
    /// Name as written in the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::PatternPatch => "patternPatch",
            Self::Attribute => "attribute",
            Self::AttributePatch => "attributePatch",
            Self::Test => "test",
        }
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pattern" => Ok(Self::Pattern),
            "patternPatch" => Ok(Self::PatternPatch),
            "attribute" => Ok(Self::Attribute),
            "attributePatch" => Ok(Self::AttributePatch),
            "test" => Ok(Self::Test),
            other => Err(Error::config(format!("Unknown document type: {}", other))),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer field that may be written as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntValue {
    Number(i64),
    Text(String),
}

impl IntValue {
    /// Parse to an integer, naming `field` on failure
    pub fn to_i64(&self, field: &str) -> Result<i64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid integer for {}: '{}'", field, s))),
        }
    }
}

impl From<i64> for IntValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Input normalization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParserSpec {
    /// Normalization transformers, applied in order
    #[serde(default)]
    pub transformers: Option<Vec<TransformerSpec>>,

    /// Token separators, tried in order
    #[serde(default)]
    pub token_seperators: Option<Vec<String>>,

    /// Maximum number of tokens concatenated into one n-gram
    #[serde(default)]
    pub ngram_concat_size: Option<IntValue>,
}

impl InputParserSpec {
    /// Build the normalization transformers, if the field is present
    pub fn to_transformers(&self) -> Result<Option<Vec<Transformer>>> {
        self.transformers
            .as_ref()
            .map(|specs| {
                specs
                    .iter()
                    .map(TransformerSpec::to_transformer)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()
    }

    /// Validated separators, if the field is present
    pub fn to_separators(&self) -> Result<Option<Vec<String>>> {
        match &self.token_seperators {
            Some(separators) if separators.iter().any(String::is_empty) => {
                Err(Error::config("Empty tokenSeperator not allowed"))
            }
            other => Ok(other.clone()),
        }
    }

    /// Validated n-gram width, if the field is present
    pub fn to_ngram_width(&self) -> Result<Option<usize>> {
        let Some(value) = &self.ngram_concat_size else {
            return Ok(None);
        };

        let width = value.to_i64("ngramConcatSize")?;
        if width < 1 {
            return Err(Error::config(format!(
                "Invalid value of ngramConcatSize: {}",
                width
            )));
        }

        usize::try_from(width)
            .map(Some)
            .map_err(|_| Error::config(format!("ngramConcatSize out of range: {}", width)))
    }
}

/// Transformer as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerSpec {
    /// Transformer kind, e.g. `LowerCase`
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Kind-specific parameters
    #[serde(default)]
    pub parameters: TransformerParams,
}

/// Union of every transformer kind's parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerParams {
    #[serde(default)]
    pub find: Option<String>,

    #[serde(default)]
    pub replace_with: Option<String>,

    #[serde(default)]
    pub delimeter: Option<String>,

    #[serde(default)]
    pub get: Option<IntValue>,

    #[serde(default)]
    pub start: Option<IntValue>,

    #[serde(default)]
    pub max_length: Option<IntValue>,
}

impl TransformerSpec {
    /// Convert to a runtime transformer
    pub fn to_transformer(&self) -> Result<Transformer> {
        let p = &self.parameters;

        match self.kind.as_str() {
            "LowerCase" => Ok(Transformer::LowerCase),
            "UpperCase" => Ok(Transformer::UpperCase),
            "IsNumber" => Ok(Transformer::IsNumber),
            "ReplaceFirst" => Transformer::replace_first(
                required_text(&p.find, "ReplaceFirst find")?,
                required(&p.replace_with, "ReplaceFirst replaceWith")?.clone(),
            ),
            "ReplaceAll" => Transformer::replace_all(
                required_text(&p.find, "ReplaceAll find")?,
                required(&p.replace_with, "ReplaceAll replaceWith")?.clone(),
            ),
            "SplitAndGet" => Transformer::split_and_get(
                required_text(&p.delimeter, "SplitAndGet delimeter")?,
                required(&p.get, "SplitAndGet get")?.to_i64("SplitAndGet get")?,
            ),
            "Substring" => Transformer::substring(
                required(&p.start, "Substring start")?.to_i64("Substring start")?,
                p.max_length
                    .as_ref()
                    .map(|v| v.to_i64("Substring maxLength"))
                    .transpose()?,
            ),
            other => Err(Error::config(format!("Transformer not found: {}", other))),
        }
    }
}

/// Pattern set of a pattern or pattern patch document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSetSpec {
    /// Pattern id returned when nothing matches
    #[serde(default)]
    pub default_id: Option<String>,

    /// Expected number of patterns in this document
    #[serde(default)]
    pub simple_hash_count: Option<IntValue>,

    #[serde(default)]
    pub patterns: Option<Vec<PatternSpec>>,
}

impl PatternSetSpec {
    /// Default id, treating an empty string as absent
    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Validated `simpleHashCount`, if present
    pub fn expected_count(&self) -> Result<Option<usize>> {
        let Some(value) = &self.simple_hash_count else {
            return Ok(None);
        };

        let count = value.to_i64("simpleHashCount")?;
        if count < 1 {
            return Err(Error::config(format!(
                "Invalid value of simpleHashCount: {}",
                count
            )));
        }

        usize::try_from(count)
            .map(Some)
            .map_err(|_| Error::config(format!("simpleHashCount out of range: {}", count)))
    }

    /// Build every pattern in document order
    pub fn to_patterns(&self) -> Result<Vec<Pattern>> {
        self.patterns
            .iter()
            .flatten()
            .map(PatternSpec::to_pattern)
            .collect()
    }
}

/// Pattern as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    #[serde(default)]
    pub pattern_id: String,

    /// Kept as text so an unknown kind is reported against its pattern
    #[serde(default)]
    pub pattern_type: Option<String>,

    #[serde(default)]
    pub pattern_tokens: Option<Vec<Value>>,

    #[serde(default)]
    pub rank_type: Option<String>,

    #[serde(default)]
    pub rank_value: Option<IntValue>,
}

impl PatternSpec {
    /// Convert to a validated pattern
    pub fn to_pattern(&self) -> Result<Pattern> {
        let id = &self.pattern_id;

        if id.is_empty() {
            return Err(Error::config("patternId not found"));
        }

        let pattern_type: PatternType = self
            .pattern_type
            .as_deref()
            .ok_or_else(|| Error::config(format!("patternType not found in {}", id)))?
            .parse::<PatternType>()
            .map_err(|e| e.with_context(id))?;

        let tokens = self
            .pattern_tokens
            .as_ref()
            .ok_or_else(|| Error::config(format!("patternTokens array not found in {}", id)))?
            .iter()
            .map(|token| match token {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::config(format!(
                    "{}: patternTokens must be strings, found: {}",
                    id, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let rank_type: RankType = self
            .rank_type
            .as_deref()
            .ok_or_else(|| Error::config(format!("rankType not found in {}", id)))?
            .parse::<RankType>()
            .map_err(|e| e.with_context(id))?;

        let rank_value = match &self.rank_value {
            Some(value) => {
                let value = value.to_i64(&format!("rankValue in {}", id))?;
                i32::try_from(value)
                    .map_err(|_| Error::config(format!("Invalid rankValue in {}: {}", id, value)))?
            }
            None => 0,
        };

        Pattern::new(id.clone(), pattern_type, tokens, rank_type, rank_value)
    }
}

/// Attribute set as written in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSetSpec {
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Static values; scalars are taken as their text form
    #[serde(default)]
    pub attributes: Option<IndexMap<String, Value>>,

    #[serde(default)]
    pub attribute_transformers: Option<IndexMap<String, AttributeTransformerSpec>>,
}

impl AttributeSetSpec {
    /// Convert to a validated attribute set owned by `pattern_id`
    pub fn to_attribute_set(&self, pattern_id: &str) -> Result<AttributeSet> {
        let attributes: IndexMap<String, String> = self
            .attributes
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value_text(value)))
            .collect();

        let mut transformers = IndexMap::new();

        if let Some(specs) = &self.attribute_transformers {
            if specs.is_empty() {
                return Err(Error::config(format!(
                    "No attribute transformers found for {}",
                    pattern_id
                )));
            }

            for (key, spec) in specs {
                let transformer = spec.to_attribute_transformer().map_err(|e| {
                    Error::config(format!("attributeTransformer {} in {}: {}", key, pattern_id, e))
                })?;
                transformers.insert(key.clone(), transformer);
            }
        }

        AttributeSet::new(pattern_id, self.parent_id.clone(), attributes, transformers)
    }
}

/// Attribute transformer as written in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeTransformerSpec {
    #[serde(default)]
    pub default_value: Option<String>,

    #[serde(default)]
    pub transformers: Option<Vec<TransformerSpec>>,
}

impl AttributeTransformerSpec {
    /// Convert to a runtime attribute transformer
    pub fn to_attribute_transformer(&self) -> Result<AttributeTransformer> {
        let stages = self
            .transformers
            .iter()
            .flatten()
            .map(TransformerSpec::to_transformer)
            .collect::<Result<Vec<_>>>()?;

        AttributeTransformer::new(
            TransformerPipeline::new(stages),
            self.default_value.clone().unwrap_or_default(),
        )
    }
}

/// One case of a test document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSpec {
    #[serde(default)]
    pub input: Option<Value>,

    /// Expected pattern id; absent means "no result"
    #[serde(default)]
    pub result_pattern_id: Option<String>,

    /// Expected attribute values
    #[serde(default)]
    pub result_attributes: Option<IndexMap<String, Value>>,
}

impl TestCaseSpec {
    /// Input text, `None` when missing or null
    pub fn input_text(&self) -> Option<String> {
        match &self.input {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_text(value)),
        }
    }

    /// Expected attributes as text
    pub fn expected_attributes(&self) -> IndexMap<String, String> {
        self.result_attributes
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value_text(value)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    spec_version: Option<Value>,

    #[serde(rename = "type", default)]
    doc_type: Option<Value>,

    #[serde(default)]
    domain: Option<Value>,

    #[serde(default)]
    domain_version: Option<Value>,

    #[serde(default)]
    input_parser: Option<InputParserSpec>,

    #[serde(default)]
    pattern_set: Option<PatternSetSpec>,

    #[serde(default)]
    attributes: Option<IndexMap<String, AttributeSetSpec>>,

    #[serde(default)]
    tests: Option<Vec<TestCaseSpec>>,
}

/// A header-validated configuration document
#[derive(Debug, Clone)]
pub struct Document {
    /// Declared document kind
    pub doc_type: DocumentType,

    /// Declared domain and version
    pub identity: DomainIdentity,

    pub input_parser: Option<InputParserSpec>,

    pub pattern_set: Option<PatternSetSpec>,

    /// Attribute sets keyed by pattern id, in document order
    pub attributes: Option<IndexMap<String, AttributeSetSpec>>,

    pub tests: Option<Vec<TestCaseSpec>>,
}

impl Document {
    /// Parse and validate a document from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse and validate a document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|content| Self::from_json(&content))
            .map_err(|e| e.with_context(path.display()))
    }

    /// Validate a document from an already parsed JSON tree
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::config("document is not a JSON object"));
        }

        let raw: RawDocument = serde_json::from_value(value)?;

        let spec_version = raw.spec_version.as_ref().and_then(value_f64).unwrap_or(0.0);
        if spec_version != SPEC_VERSION {
            return Err(Error::config(format!(
                "Bad specVersion found: {}",
                spec_version
            )));
        }

        let doc_type: DocumentType = non_empty_text(&raw.doc_type, "type")?.parse()?;
        let domain = non_empty_text(&raw.domain, "domain")?;
        let domain_version = non_empty_text(&raw.domain_version, "domainVersion")?;

        Ok(Self {
            doc_type,
            identity: DomainIdentity::new(domain, domain_version),
            input_parser: raw.input_parser,
            pattern_set: raw.pattern_set,
            attributes: raw.attributes,
            tests: raw.tests,
        })
    }

    /// Fail unless this document declares `expected` as its type
    pub fn expect_type(&self, expected: DocumentType) -> Result<()> {
        if self.doc_type != expected {
            return Err(Error::config(format!(
                "Unknown {} file type: {}",
                expected, self.doc_type
            )));
        }
        Ok(())
    }
}

/// Text form of a JSON scalar; containers render as JSON
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty_text(value: &Option<Value>, field: &str) -> Result<String> {
    value
        .as_ref()
        .map(value_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::config(format!("{} not defined", field)))
}

fn required<'a, T>(value: &'a Option<T>, field: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| Error::config(format!("{} not defined", field)))
}

fn required_text(value: &Option<String>, field: &str) -> Result<String> {
    match value {
        Some(s) if !s.is_empty() => Ok(s.clone()),
        _ => Err(Error::config(format!("{} not defined", field))),
    }
}
