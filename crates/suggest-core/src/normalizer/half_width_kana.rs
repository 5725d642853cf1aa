use crate::error::Result;
use crate::script::halfwidth_kana_to_fullwidth;

use super::Normalizer;

/// Widens half-width katakana (`ﾃﾞｰﾀ`) to full-width (`データ`).
///
/// A base syllable followed by a voicing mark is merged into the single
/// voiced character, consuming both input characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfWidthToFullWidthKanaNormalizer;

impl Normalizer for HalfWidthToFullWidthKanaNormalizer {
    fn normalize(&self, text: &str, _field: Option<&str>, _langs: &[String]) -> Result<String> {
        Ok(halfwidth_kana_to_fullwidth(text))
    }
}
