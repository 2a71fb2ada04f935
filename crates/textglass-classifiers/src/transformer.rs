//! String transformers
//!
//! A transformer maps one string to another or fails. Ordered lists of
//! transformers form a [`TransformerPipeline`]; each stage feeds the next and
//! the first failure aborts the pipeline. Pipelines normalize classification
//! input and compute dynamic attribute values.

use crate::tokenizer::Tokenizer;
use std::fmt;
use textglass_core::{Error, Result};

/// Which part a [`Transformer::SplitAndGet`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartIndex {
    /// Zero-based part index
    At(usize),
    /// The last part
    Last,
}

/// A single validated transformation step
#[derive(Debug, Clone)]
pub enum Transformer {
    /// Lower-case the whole input
    LowerCase,

    /// Upper-case the whole input
    UpperCase,

    /// Replace the first occurrence of `find` unless it starts the input
    ReplaceFirst { find: String, replace_with: String },

    /// Replace every occurrence of `find`
    ReplaceAll { find: String, replace_with: String },

    /// Split on a delimiter (empty parts dropped) and return one part
    SplitAndGet {
        delimiter: String,
        splitter: Tokenizer,
        index: PartIndex,
    },

    /// Pass the input through unchanged if it is a decimal number, else fail
    IsNumber,

    /// Character substring starting at `start`, `max_length` characters long
    Substring {
        start: usize,
        max_length: Option<usize>,
    },
}

impl Transformer {
    /// Create a ReplaceFirst transformer
    pub fn replace_first(find: impl Into<String>, replace_with: impl Into<String>) -> Result<Self> {
        let find = non_empty_find(find.into(), "ReplaceFirst")?;
        Ok(Self::ReplaceFirst {
            find,
            replace_with: replace_with.into(),
        })
    }

    /// Create a ReplaceAll transformer
    pub fn replace_all(find: impl Into<String>, replace_with: impl Into<String>) -> Result<Self> {
        let find = non_empty_find(find.into(), "ReplaceAll")?;
        Ok(Self::ReplaceAll {
            find,
            replace_with: replace_with.into(),
        })
    }

    /// Create a SplitAndGet transformer. `get = -1` selects the last part.
    pub fn split_and_get(delimiter: impl Into<String>, get: i64) -> Result<Self> {
        let delimiter = delimiter.into();

        if delimiter.is_empty() {
            return Err(Error::config("SplitAndGet delimeter not defined"));
        }

        let index = match get {
            -1 => PartIndex::Last,
            i if i < -1 => {
                return Err(Error::config(format!(
                    "Invalid value of get for SplitAndGet: {}",
                    get
                )))
            }
            i => PartIndex::At(to_usize(i, "SplitAndGet get")?),
        };

        let splitter = Tokenizer::new(vec![delimiter.clone()])?;

        Ok(Self::SplitAndGet {
            delimiter,
            splitter,
            index,
        })
    }

    /// Create a Substring transformer
    pub fn substring(start: i64, max_length: Option<i64>) -> Result<Self> {
        if start < 0 {
            return Err(Error::config(format!(
                "Invalid value of start for Substring: {}",
                start
            )));
        }

        let max_length = match max_length {
            Some(len) if len < 0 => {
                return Err(Error::config(format!(
                    "Invalid value of maxLength for Substring: {}",
                    len
                )))
            }
            Some(len) => Some(to_usize(len, "Substring maxLength")?),
            None => None,
        };

        Ok(Self::Substring {
            start: to_usize(start, "Substring start")?,
            max_length,
        })
    }

    /// Name of this transformer kind as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LowerCase => "LowerCase",
            Self::UpperCase => "UpperCase",
            Self::ReplaceFirst { .. } => "ReplaceFirst",
            Self::ReplaceAll { .. } => "ReplaceAll",
            Self::SplitAndGet { .. } => "SplitAndGet",
            Self::IsNumber => "IsNumber",
            Self::Substring { .. } => "Substring",
        }
    }

    /// Apply this transformer to `input`
    pub fn apply(&self, input: &str) -> Result<String> {
        match self {
            Self::LowerCase => Ok(input.to_lowercase()),

            Self::UpperCase => Ok(input.to_uppercase()),

            // only the first occurrence is considered, and one at position 0 is left in place
            Self::ReplaceFirst { find, replace_with } => match input.find(find.as_str()) {
                Some(pos) if pos > 0 => {
                    let mut out = String::with_capacity(input.len() + replace_with.len());
                    out.push_str(&input[..pos]);
                    out.push_str(replace_with);
                    out.push_str(&input[pos + find.len()..]);
                    Ok(out)
                }
                _ => Ok(input.to_string()),
            },

            Self::ReplaceAll { find, replace_with } => Ok(input.replace(find.as_str(), replace_with)),

            Self::SplitAndGet {
                splitter, index, ..
            } => {
                let parts = splitter.split(input);

                let position = match index {
                    PartIndex::Last => parts.len().checked_sub(1),
                    PartIndex::At(i) => Some(*i),
                };

                position
                    .and_then(|i| parts.get(i))
                    .map(|part| part.to_string())
                    .ok_or_else(|| {
                        Error::transform(format!(
                            "SplitAndGet index out of range: {:?} of {} part(s)",
                            index,
                            parts.len()
                        ))
                    })
            }

            Self::IsNumber => {
                if is_number(input) {
                    Ok(input.to_string())
                } else {
                    Err(Error::transform(format!("IsNumber not a number: '{}'", input)))
                }
            }

            Self::Substring { start, max_length } => {
                let length = input.chars().count();

                if *start >= length {
                    return Err(Error::transform(format!(
                        "Substring start position out of range: {} (length {})",
                        start, length
                    )));
                }

                match max_length {
                    Some(max) if start.saturating_add(*max) > length => Err(Error::transform(format!(
                        "Substring range out of bounds: {}+{} (length {})",
                        start, max, length
                    ))),
                    Some(max) => Ok(input.chars().skip(*start).take(*max).collect()),
                    None => Ok(input.chars().skip(*start).collect()),
                }
            }
        }
    }
}

impl fmt::Display for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceFirst { find, replace_with } | Self::ReplaceAll { find, replace_with } => {
                write!(f, "{} find: '{}' replaceWith: '{}'", self.kind(), find, replace_with)
            }
            Self::SplitAndGet {
                delimiter, index, ..
            } => write!(f, "SplitAndGet delimeter: '{}' get: {:?}", delimiter, index),
            Self::Substring { start, max_length } => match max_length {
                Some(max) => write!(f, "Substring start: {} maxLength: {}", start, max),
                None => write!(f, "Substring start: {}", start),
            },
            _ => f.write_str(self.kind()),
        }
    }
}

/// Ordered list of transformers applied in sequence
#[derive(Debug, Clone, Default)]
pub struct TransformerPipeline {
    stages: Vec<Transformer>,
}

impl TransformerPipeline {
    /// Create a pipeline from ordered stages
    pub fn new(stages: Vec<Transformer>) -> Self {
        Self { stages }
    }

    /// Stages in application order
    pub fn stages(&self) -> &[Transformer] {
        &self.stages
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `input` through every stage, stopping at the first failure
    pub fn apply(&self, input: &str) -> Result<String> {
        let mut value = input.to_string();

        for stage in &self.stages {
            value = stage.apply(&value)?;
        }

        Ok(value)
    }
}

impl From<Vec<Transformer>> for TransformerPipeline {
    fn from(stages: Vec<Transformer>) -> Self {
        Self::new(stages)
    }
}

fn non_empty_find(find: String, kind: &str) -> Result<String> {
    if find.is_empty() {
        return Err(Error::config(format!("{} find not defined", kind)));
    }
    Ok(find)
}

fn to_usize(value: i64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::config(format!("{} out of range: {}", field, value)))
}

/// Optional minus sign, digits, and an optional fractional part
fn is_number(input: &str) -> bool {
    let unsigned = input.strip_prefix('-').unwrap_or(input);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(whole) && fraction.map_or(true, all_digits)
}
