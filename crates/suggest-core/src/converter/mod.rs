//! Reading converters.
//!
//! A [`ReadingConverter`] turns text into one or more whole-text reading
//! candidates. Converters compose breadth-first in a [`ConverterChain`], so a
//! later stage expands the outputs of an earlier one (katakana conversion
//! feeding romanization, for example).

mod analyzer;
mod katakana;
mod romaji;


use std::collections::VecDeque;
use std::sync::Arc;

use crate::analysis::AnalyzedToken;
use crate::error::Result;

pub use analyzer::AnalyzerConverter;
pub use katakana::KatakanaConverter;
pub use romaji::KatakanaToAlphabetConverter;

/// Default cap on reading candidates.
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Produces reading candidates for a piece of text.
pub trait ReadingConverter: Send + Sync {
    /// Converts `text` taken from `field`, with optional language hints.
    ///
    /// Each returned string is one reading of the whole text.
    ///
    /// # Errors
    ///
    /// Returns an error if a delegated service fails.
    fn convert(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<Vec<String>>;
}

/// Breadth-first composition of converters.
///
/// The chain seeds a queue with the input. Each converter in order drains
/// the queue, and its outputs become the next converter's queue. Outputs of
/// every stage accumulate, deduplicated, into the result; conversion stops
/// once the result exceeds `max_candidates`, and the result is truncated to
/// that cap. Intermediate outputs such as the katakana form take slots too,
/// so the cap should be at least the number of stages.
#[derive(Clone)]
pub struct ConverterChain {
    converters: Vec<Arc<dyn ReadingConverter>>,
    max_candidates: usize,
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }
}

impl std::fmt::Debug for ConverterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterChain")
            .field("stages", &self.converters.len())
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}

impl ConverterChain {
    /// Creates an empty chain. An empty chain returns its input unchanged.
    #[must_use]
    pub fn new(max_candidates: usize) -> Self {
        Self {
            converters: Vec::new(),
            max_candidates: max_candidates.max(1),
        }
    }

    /// Appends a converter.
    #[must_use]
    pub fn with(mut self, converter: Arc<dyn ReadingConverter>) -> Self {
        self.add(converter);
        self
    }

    /// Appends a converter.
    pub fn add(&mut self, converter: Arc<dyn ReadingConverter>) {
        self.converters.push(converter);
    }

    /// Candidate cap.
    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl ReadingConverter for ConverterChain {
    fn convert(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<Vec<String>> {
        if self.converters.is_empty() {
            return Ok(vec![text.to_string()]);
        }

        let mut results: Vec<String> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::from([text.to_string()]);

        'stages: for converter in &self.converters {
            let mut produced: Vec<String> = Vec::new();
            while let Some(pending) = queue.pop_front() {
                for candidate in converter.convert(&pending, field, langs)? {
                    if candidate.is_empty() {
                        continue;
                    }
                    if !results.contains(&candidate) {
                        results.push(candidate.clone());
                    }
                    if !produced.contains(&candidate) {
                        produced.push(candidate);
                    }
                }
                if results.len() > self.max_candidates {
                    break 'stages;
                }
            }
            queue.extend(produced);
        }

        results.truncate(self.max_candidates);
        Ok(results)
    }
}

/// Rebuilds a whole-text reading from analyzer tokens.
///
/// Untokenized gaps go through `gap`, tokens through `token`. Tokens that
/// start before the end of the previous one (overlapping synonyms) are
/// skipped.
pub(crate) fn reconstruct<G, T>(text: &str, tokens: &[AnalyzedToken], gap: G, token: T) -> String
where
    G: Fn(&str) -> String,
    T: Fn(&AnalyzedToken) -> String,
{
    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = 0;

    for tok in tokens {
        if tok.start_offset < cursor || tok.end_offset > text.len() || tok.start_offset > tok.end_offset {
            continue;
        }
        if let Some(between) = text.get(cursor..tok.start_offset) {
            out.push_str(&gap(between));
        }
        out.push_str(&token(tok));
        cursor = tok.end_offset;
    }
    if let Some(rest) = text.get(cursor..) {
        out.push_str(&gap(rest));
    }
    out
}
