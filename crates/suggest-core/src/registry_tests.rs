//! Tests for `registry` module

use std::sync::Arc;

use super::analysis::DictionaryAnalyzer;
use super::config::{ConversionConfig, StageConfig};
use super::converter::ReadingConverter;
use super::error::{Error, Result};
use super::normalizer::Normalizer;
use super::registry::*;

fn context() -> BuildContext {
    BuildContext {
        analyzer: Arc::new(DictionaryAnalyzer::new().with_entry("東京", "トウキョウ")),
        max_candidates: 10,
    }
}

struct Upper;

impl Normalizer for Upper {
    fn normalize(&self, text: &str, _field: Option<&str>, _langs: &[String]) -> Result<String> {
        Ok(text.to_uppercase())
    }
}

#[test]
fn test_defaults_register_builtin_stages() {
    let registry = Registry::with_defaults();

    for name in [
        "full_width_to_half_width_alphabet",
        "half_width_to_full_width_kana",
        "transliterator",
        "analyzer",
    ] {
        assert!(registry.has_normalizer(name), "missing normalizer {name}");
    }
    for name in ["katakana", "romaji", "analyzer"] {
        assert!(registry.has_converter(name), "missing converter {name}");
    }
}

#[test]
fn test_default_config_builds_working_chains() {
    // Arrange
    let registry = Registry::with_defaults();
    let config = ConversionConfig::default();
    let ctx = context();

    // Act
    let normalizers = registry.build_normalizer_chain(&config, &ctx).expect("normalizers");
    let converters = registry.build_converter_chain(&config, &ctx).expect("converters");

    // Assert
    let normalized = normalizers.normalize("ＴＯＫＹＯ ﾃﾞｰﾀ", None, &[]).expect("normalize");
    assert_eq!(normalized, "tokyo データ");
    let readings = converters.convert("東京", None, &[]).expect("convert");
    assert_eq!(readings, vec!["トウキョウ", "toukyou"]);
}

#[test]
fn test_typed_options_are_applied() {
    // Arrange
    let registry = Registry::with_defaults();
    let stage = StageConfig::named("romaji").with_option("max_candidates", 2);

    // Act
    let converter = registry.build_converter(&stage, &context()).expect("build");

    // Assert
    let readings = converter.convert("シチツ", None, &[]).expect("convert");
    assert_eq!(readings.len(), 2);
}

#[test]
fn test_invalid_options_are_config_errors() {
    let registry = Registry::with_defaults();
    let stage = StageConfig::named("transliterator");

    let err = registry.build_normalizer(&stage, &context()).err().expect("missing id");

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_unknown_stage_is_config_error() {
    let registry = Registry::with_defaults();

    let err = registry
        .build_converter(&StageConfig::named("phonetic_magic"), &context())
        .err()
        .expect("unknown");

    assert!(matches!(err, Error::Config(ref msg) if msg.contains("phonetic_magic")));
}

#[test]
fn test_custom_normalizer_registration() {
    // Arrange
    let mut registry = Registry::new();
    registry.register_normalizer("upper", |_: NoOptions, _| Ok(Arc::new(Upper)));
    let config = ConversionConfig {
        normalizers: vec![StageConfig::named("upper")],
        ..ConversionConfig::default()
    };

    // Act
    let chain = registry.build_normalizer_chain(&config, &context()).expect("build");

    // Assert
    assert_eq!(chain.normalize("abc", None, &[]).expect("normalize"), "ABC");
}
