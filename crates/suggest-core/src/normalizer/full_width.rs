use crate::error::Result;
use crate::script::fold_fullwidth_alphanumeric;

use super::Normalizer;

/// Folds full-width letters and digits (`Ｊａｖａ８`) to ASCII (`Java8`).
///
/// Full-width punctuation and every other character pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullWidthToHalfWidthAlphabetNormalizer;

impl Normalizer for FullWidthToHalfWidthAlphabetNormalizer {
    fn normalize(&self, text: &str, _field: Option<&str>, _langs: &[String]) -> Result<String> {
        Ok(text.chars().map(fold_fullwidth_alphanumeric).collect())
    }
}
