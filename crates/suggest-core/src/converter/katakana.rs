use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::error::Result;
use crate::script::hiragana_to_katakana;

use super::{reconstruct, ReadingConverter};

/// Converts text to a katakana reading using analyzer-supplied readings.
///
/// Tokens with a reading contribute that reading; tokens without one and the
/// gaps between tokens are transliterated from hiragana to katakana.
/// Produces exactly one candidate.
#[derive(Clone)]
pub struct KatakanaConverter {
    analyzer: Arc<dyn Analyzer>,
}

impl KatakanaConverter {
    /// Creates a converter backed by `analyzer`.
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }
}

impl std::fmt::Debug for KatakanaConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KatakanaConverter").finish_non_exhaustive()
    }
}

impl ReadingConverter for KatakanaConverter {
    fn convert(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<Vec<String>> {
        let lang = langs.first().map(String::as_str);
        let tokens = self.analyzer.analyze(text, field, lang)?;
        let reading = reconstruct(text, &tokens, hiragana_to_katakana, |tok| {
            tok.reading
                .clone()
                .unwrap_or_else(|| hiragana_to_katakana(&tok.term))
        });
        Ok(vec![reading])
    }
}
