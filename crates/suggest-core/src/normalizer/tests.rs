//! Tests for normalizers and the normalizer chain.

use std::sync::Arc;

use super::*;
use crate::analysis::{AnalyzedToken, Analyzer};
use crate::error::{Error, Result};

struct FixedAnalyzer(Vec<&'static str>);

impl Analyzer for FixedAnalyzer {
    fn analyze(&self, _text: &str, _field: Option<&str>, _lang: Option<&str>) -> Result<Vec<AnalyzedToken>> {
        Ok(self
            .0
            .iter()
            .enumerate()
            .map(|(i, t)| AnalyzedToken::new(*t, 0, t.len(), i))
            .collect())
    }
}

struct FailingAnalyzer;

impl Analyzer for FailingAnalyzer {
    fn analyze(&self, _text: &str, _field: Option<&str>, _lang: Option<&str>) -> Result<Vec<AnalyzedToken>> {
        Err(Error::backend("analyzer unavailable"))
    }
}

fn normalize(n: &dyn Normalizer, text: &str) -> String {
    n.normalize(text, None, &[]).expect("normalize")
}

#[test]
fn test_full_width_alphabet() {
    assert_eq!(normalize(&FullWidthToHalfWidthAlphabetNormalizer, "Ｊａｖａ８"), "Java8");
    assert_eq!(normalize(&FullWidthToHalfWidthAlphabetNormalizer, "＃タグ"), "＃タグ");
}

#[test]
fn test_half_width_kana_merges_marks() {
    assert_eq!(normalize(&HalfWidthToFullWidthKanaNormalizer, "ﾃﾞｰﾀﾍﾞｰｽ"), "データベース");
    assert_eq!(normalize(&HalfWidthToFullWidthKanaNormalizer, "ﾎﾟｲﾝﾄ"), "ポイント");
}

#[test]
fn test_transliterator_normalizer() {
    let normalizer = TransliteratorNormalizer::from_id("Any-Lower; Fullwidth-Halfwidth").expect("id");

    assert_eq!(normalize(&normalizer, "ＲＵＳＴ Lang"), "rust lang");
}

#[test]
fn test_analyzer_normalizer_returns_first_token() {
    let normalizer = AnalyzerNormalizer::new(Arc::new(FixedAnalyzer(vec!["first", "second"])));

    assert_eq!(normalize(&normalizer, "anything"), "first");
}

#[test]
fn test_analyzer_normalizer_passes_through_on_no_tokens() {
    let normalizer = AnalyzerNormalizer::new(Arc::new(FixedAnalyzer(vec![])));

    assert_eq!(normalize(&normalizer, "untouched"), "untouched");
}

#[test]
fn test_analyzer_normalizer_propagates_failure() {
    let normalizer = AnalyzerNormalizer::new(Arc::new(FailingAnalyzer));

    let result = normalizer.normalize("x", None, &[]);

    assert!(matches!(result, Err(Error::Backend { .. })));
}

#[test]
fn test_chain_applies_in_registration_order() {
    // Arrange: widen kana, then fold width and lower-case
    let chain = NormalizerChain::new()
        .with(Arc::new(HalfWidthToFullWidthKanaNormalizer))
        .with(Arc::new(FullWidthToHalfWidthAlphabetNormalizer))
        .with(Arc::new(TransliteratorNormalizer::from_id("Any-Lower").expect("id")));

    // Act
    let out = normalize(&chain, "ＪＡＶＡﾌﾟﾛｸﾞﾗﾑ");

    // Assert
    assert_eq!(out, "javaプログラム");
    assert_eq!(chain.len(), 3);
}

#[test]
fn test_empty_chain_is_identity() {
    let chain = NormalizerChain::new();

    assert!(chain.is_empty());
    assert_eq!(normalize(&chain, "ｶﾞ Ａ"), "ｶﾞ Ａ");
}

#[test]
fn test_chain_short_circuits_on_error() {
    let chain = NormalizerChain::new()
        .with(Arc::new(AnalyzerNormalizer::new(Arc::new(FailingAnalyzer))))
        .with(Arc::new(FullWidthToHalfWidthAlphabetNormalizer));

    assert!(chain.normalize("x", Some("title"), &["ja".to_string()]).is_err());
}
