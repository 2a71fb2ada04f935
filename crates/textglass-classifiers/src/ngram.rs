//! N-gram expansion of a token sequence
//!
//! For each start position the expander emits the concatenations of up to
//! `width` consecutive tokens, longest first, before moving to the next
//! position. Tokens are concatenated directly with no separator.

/// Lazy, restartable stream of n-gram candidates
#[derive(Debug, Clone)]
pub struct Ngrams<'a, S> {
    tokens: &'a [S],
    width: usize,
    position: usize,
    pending: Vec<String>,
}

impl<'a, S: AsRef<str>> Ngrams<'a, S> {
    /// Create an expander over `tokens`. A width of zero is treated as one.
    pub fn new(tokens: &'a [S], width: usize) -> Self {
        Self {
            tokens,
            width: width.max(1),
            position: 0,
            pending: Vec::with_capacity(width.max(1)),
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for Ngrams<'a, S> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            // pending holds the prefixes shortest first, so popping yields longest first
            if let Some(ngram) = self.pending.pop() {
                return Some(ngram);
            }

            if self.position >= self.tokens.len() {
                return None;
            }

            let end = (self.position + self.width).min(self.tokens.len());
            let mut ngram = String::new();

            for token in &self.tokens[self.position..end] {
                ngram.push_str(token.as_ref());
                self.pending.push(ngram.clone());
            }

            self.position += 1;
        }
    }
}

/// Materialize the n-gram stream for `tokens`
pub fn expand<S: AsRef<str>>(tokens: &[S], width: usize) -> Vec<String> {
    Ngrams::new(tokens, width).collect()
}
