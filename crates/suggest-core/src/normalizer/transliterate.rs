use crate::error::Result;
use crate::script::Transliterator;

use super::Normalizer;

/// Applies a [`Transliterator`] such as `"Any-Lower; Fullwidth-Halfwidth"`.
#[derive(Debug, Clone)]
pub struct TransliteratorNormalizer {
    transliterator: Transliterator,
}

impl TransliteratorNormalizer {
    /// Creates a normalizer from a transliterator id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an unknown id.
    pub fn from_id(id: &str) -> Result<Self> {
        Ok(Self::new(Transliterator::from_id(id)?))
    }

    /// Creates a normalizer from a parsed transliterator.
    #[must_use]
    pub fn new(transliterator: Transliterator) -> Self {
        Self { transliterator }
    }
}

impl Normalizer for TransliteratorNormalizer {
    fn normalize(&self, text: &str, _field: Option<&str>, _langs: &[String]) -> Result<String> {
        Ok(self.transliterator.transliterate(text))
    }
}
