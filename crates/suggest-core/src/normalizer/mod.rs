//! Text normalizers.
//!
//! A [`Normalizer`] maps one string to one string. Normalizers compose into a
//! [`NormalizerChain`], which feeds each stage's output to the next in
//! registration order and is itself a `Normalizer`.

mod analyzer;
mod full_width;
mod half_width_kana;
mod transliterate;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::error::Result;

pub use analyzer::AnalyzerNormalizer;
pub use full_width::FullWidthToHalfWidthAlphabetNormalizer;
pub use half_width_kana::HalfWidthToFullWidthKanaNormalizer;
pub use transliterate::TransliteratorNormalizer;

/// Maps text to its normalized form.
pub trait Normalizer: Send + Sync {
    /// Normalizes `text` taken from `field`, with optional language hints.
    ///
    /// # Errors
    ///
    /// Returns an error if a delegated service fails.
    fn normalize(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<String>;
}

/// Applies normalizers in registration order.
#[derive(Clone, Default)]
pub struct NormalizerChain {
    normalizers: Vec<Arc<dyn Normalizer>>,
}

impl NormalizerChain {
    /// Creates an empty chain, which passes text through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a normalizer.
    #[must_use]
    pub fn with(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.add(normalizer);
        self
    }

    /// Appends a normalizer.
    pub fn add(&mut self, normalizer: Arc<dyn Normalizer>) {
        self.normalizers.push(normalizer);
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.normalizers.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalizers.is_empty()
    }
}

impl std::fmt::Debug for NormalizerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizerChain")
            .field("stages", &self.normalizers.len())
            .finish()
    }
}

impl Normalizer for NormalizerChain {
    fn normalize(&self, text: &str, field: Option<&str>, langs: &[String]) -> Result<String> {
        self.normalizers
            .iter()
            .try_fold(text.to_string(), |acc, n| n.normalize(&acc, field, langs))
    }
}
