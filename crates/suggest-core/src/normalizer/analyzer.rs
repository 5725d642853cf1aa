use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::error::Result;

use super::Normalizer;

/// Delegates normalization to the analyzer and returns its first token.
///
/// The first language hint, if any, selects the analysis chain. When the
/// analyzer returns no tokens the text passes through unchanged.
#[derive(Clone)]
pub struct AnalyzerNormalizer {
    analyzer: Arc<dyn Analyzer>,
}

impl AnalyzerNormalizer {
    /// Creates a normalizer backed by `analyzer`.
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }
}

impl std::fmt::Debug for AnalyzerNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerNormalizer").finish_non_exhaustive()
    }
}

impl Normalizer for AnalyzerNormalizer {
    fn normalize(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<String> {
        let lang = langs.first().map(String::as_str);
        let tokens = self.analyzer.analyze(text, field, lang)?;
        Ok(tokens
            .into_iter()
            .next()
            .map_or_else(|| text.to_string(), |token| token.term))
    }
}
