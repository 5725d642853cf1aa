use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::error::Result;

use super::{reconstruct, ReadingConverter};

/// Delegates reading and tokenization entirely to the analyzer.
///
/// Runs one conversion per requested language (or one without a language
/// when none is given) and concatenates the results. Gaps and tokens without
/// a reading are copied verbatim.
#[derive(Clone)]
pub struct AnalyzerConverter {
    analyzer: Arc<dyn Analyzer>,
}

impl AnalyzerConverter {
    /// Creates a converter backed by `analyzer`.
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }

    fn convert_one(&self, text: &str, field: Option<&str>, lang: Option<&str>) -> Result<String> {
        let tokens = self.analyzer.analyze(text, field, lang)?;
        Ok(reconstruct(text, &tokens, |gap: &str| gap.to_string(), |tok| {
            tok.reading.clone().unwrap_or_else(|| tok.term.clone())
        }))
    }
}

impl std::fmt::Debug for AnalyzerConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConverter").finish_non_exhaustive()
    }
}

impl ReadingConverter for AnalyzerConverter {
    fn convert(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<Vec<String>> {
        if langs.is_empty() {
            return Ok(vec![self.convert_one(text, field, None)?]);
        }
        langs
            .iter()
            .map(|lang| self.convert_one(text, field, Some(lang)))
            .collect()
    }
}
