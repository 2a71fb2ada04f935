//! Separator-driven tokenizer
//!
//! Splits input on an ordered list of literal separators. At every position the
//! separators are tried in configured order and the first one that matches is
//! consumed, so overlapping separators are order sensitive. Empty tokens are
//! never produced.

use aho_corasick::{AhoCorasick, MatchKind};
use textglass_core::{Error, Result};

/// A piece of tokenized input, either token text or a consumed separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text between separators
    Token(&'a str),
    /// A separator consumed by the scan
    Separator(&'a str),
}

impl<'a> Segment<'a> {
    /// Raw text of this segment
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Token(s) | Self::Separator(s) => s,
        }
    }
}

/// Tokenizer over a fixed, ordered separator list
#[derive(Debug, Clone)]
pub struct Tokenizer {
    separators: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl Tokenizer {
    /// Create a tokenizer.
    ///
    /// Leftmost-first matching reproduces "first separator in list order wins"
    /// at each scan position.
    pub fn new(separators: Vec<String>) -> Result<Self> {
        if let Some(pos) = separators.iter().position(|s| s.is_empty()) {
            return Err(Error::config(format!(
                "empty token separator not allowed (position {})",
                pos
            )));
        }

        let matcher = if separators.is_empty() {
            None
        } else {
            let ac = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostFirst)
                .build(&separators)
                .map_err(|e| Error::config(format!("Failed to build separator matcher: {}", e)))?;
            Some(ac)
        };

        Ok(Self {
            separators,
            matcher,
        })
    }

    /// Configured separators, in priority order
    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    /// Scan `source` into alternating token and separator segments.
    ///
    /// Concatenating every segment reproduces `source` exactly.
    pub fn segments<'a>(&self, source: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();

        let Some(matcher) = &self.matcher else {
            if !source.is_empty() {
                segments.push(Segment::Token(source));
            }
            return segments;
        };

        let mut token_start = 0;

        for mat in matcher.find_iter(source) {
            if mat.start() > token_start {
                segments.push(Segment::Token(&source[token_start..mat.start()]));
            }
            segments.push(Segment::Separator(&source[mat.start()..mat.end()]));
            token_start = mat.end();
        }

        if token_start < source.len() {
            segments.push(Segment::Token(&source[token_start..]));
        }

        segments
    }

    /// Split `source` into its non-empty tokens
    pub fn split<'a>(&self, source: &'a str) -> Vec<&'a str> {
        self.segments(source)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Token(token) => Some(token),
                Segment::Separator(_) => None,
            })
            .collect()
    }
}
