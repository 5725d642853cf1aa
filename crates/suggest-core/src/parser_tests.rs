//! Tests for `parser` module

use std::sync::Arc;

use serde_json::json;

use super::analysis::{Analyzer, DictionaryAnalyzer};
use super::config::{ConversionConfig, IndexerConfig};
use super::item::{Kind, DEFAULT_ROLE};
use super::parser::*;
use super::reader::{Document, QueryLog};
use super::registry::{BuildContext, Registry};
use super::settings::ElevateWord;

fn parser_with(config: IndexerConfig) -> ContentsParser {
    let analyzer: Arc<dyn Analyzer> = Arc::new(
        DictionaryAnalyzer::new()
            .with_entry("東京", "トウキョウ")
            .with_entry("検索", "ケンサク"),
    );
    let ctx = BuildContext {
        analyzer: Arc::clone(&analyzer),
        max_candidates: 10,
    };
    let registry = Registry::with_defaults();
    let conversion = ConversionConfig::default();
    let normalizer = registry.build_normalizer_chain(&conversion, &ctx).expect("normalizers");
    let converter = registry.build_converter_chain(&conversion, &ctx).expect("converters");
    ContentsParser::new(Arc::new(normalizer), Arc::new(converter), analyzer, &config)
}

fn parser() -> ContentsParser {
    parser_with(IndexerConfig {
        supported_fields: vec!["content".into(), "title".into()],
        ..IndexerConfig::default()
    })
}

fn doc(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("test documents are objects"),
    }
}

#[test]
fn test_build_entry_normalizes_and_converts_each_word() {
    // Arrange
    let words = vec!["ＪＡＶＡ".to_string(), "東京".to_string()];

    // Act
    let item = parser()
        .build_entry(&words, Kind::Query, &EntryLabels::fields(["content"]), 1, &[])
        .expect("build")
        .expect("entry");

    // Assert
    assert_eq!(item.text(), "java 東京");
    assert_eq!(item.readings()[0], vec!["java"]);
    assert_eq!(item.readings()[1], vec!["トウキョウ", "toukyou"]);
    assert!(item.fields().contains("content"));
}

#[test]
fn test_build_entry_skips_bad_and_long_words() {
    let parser = parser_with(IndexerConfig {
        max_word_length: 5,
        ..IndexerConfig::default()
    });
    let labels = EntryLabels::default();

    let bad = parser
        .build_entry(&["spammer".into()], Kind::Query, &labels, 1, &["spam".into()])
        .expect("build");
    let long = parser
        .build_entry(&["abcdef".into()], Kind::Query, &labels, 1, &[])
        .expect("build");
    let blank = parser.build_entry(&["  ".into()], Kind::Query, &labels, 1, &[]).expect("build");

    assert!(bad.is_none());
    assert!(long.is_none());
    assert!(blank.is_none());
}

#[test]
fn test_parse_document_yields_content_entry_per_token() {
    // Arrange
    let source = doc(json!({
        "content": "java programming",
        "title": ["東京の検索"],
        "label": ["tech", "news"],
        "role": "staff",
        "lang": "ja",
        "ignored": "not a supported field"
    }));

    // Act
    let items = parser().parse_document(&source, &[]).expect("parse");

    // Assert
    let texts: Vec<&str> = items.iter().map(|i| i.text()).collect();
    assert_eq!(texts, vec!["java", "programming", "東京", "の", "検索"]);
    let first = &items[0];
    assert!(first.is_kind(Kind::Content));
    assert_eq!(first.doc_freq(), 1);
    assert_eq!(first.tags().len(), 2);
    assert!(first.roles().contains("staff") && first.roles().contains(DEFAULT_ROLE));
    assert!(first.languages().contains("ja"));
    assert!(items[2].fields().contains("title"));
}

#[test]
fn test_parse_query_log_takes_labels_from_filter_query() {
    // Arrange
    let log = QueryLog::new("fess suggest title:engine ignored:x").with_filter("label:docs AND role:admin");

    // Act
    let items = parser().parse_query_log(&log, &[]).expect("parse");

    // Assert
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].text(), "fess suggest");
    assert!(items[0].fields().contains("content"));
    assert_eq!(items[1].text(), "engine");
    for item in &items {
        assert!(item.is_kind(Kind::Query));
        assert_eq!(item.query_freq(), 1);
        assert!(item.tags().contains("docs"));
        assert!(item.roles().contains("admin"));
    }
}

#[test]
fn test_unsupported_query_yields_nothing() {
    let items = parser().parse_query_log(&QueryLog::new("a OR b"), &[]).expect("parse");

    assert!(items.is_empty());
}

#[test]
fn test_parse_search_word_splits_on_whitespace() {
    let item = parser()
        .parse_search_word(" apache   solr ", &EntryLabels::fields(["content"]), &[])
        .expect("parse")
        .expect("entry");

    assert_eq!(item.text(), "apache solr");
    assert_eq!(item.readings().len(), 2);
}

#[test]
fn test_parse_elevate_word_uses_per_word_reading() {
    // Arrange
    let elevate = ElevateWord::new("東京 観光", 5).with_reading("とうきょう かんこう");

    // Act
    let item = parser().parse_elevate_word(&elevate).expect("parse");

    // Assert
    assert!(item.is_kind(Kind::User));
    assert_eq!(item.user_boost(), 5);
    assert_eq!(item.readings()[1][0], "カンコウ");
    assert!(item.readings()[1].contains(&"kankou".to_string()));
}

#[test]
fn test_parse_elevate_word_mismatched_reading_falls_back_to_words() {
    let elevate = ElevateWord::new("rust lang", 2).with_reading("らすと");

    let item = parser().parse_elevate_word(&elevate).expect("parse");

    assert_eq!(item.readings()[0], vec!["rust"]);
    assert_eq!(item.readings()[1], vec!["lang"]);
}
