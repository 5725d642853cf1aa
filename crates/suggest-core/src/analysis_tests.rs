//! Tests for `analysis` module

use super::analysis::*;

fn terms(tokens: &[AnalyzedToken]) -> Vec<&str> {
    tokens.iter().map(|t| t.term.as_str()).collect()
}

#[test]
fn test_splits_on_whitespace_and_symbols() {
    let analyzer = DictionaryAnalyzer::new();

    let tokens = analyzer.analyze("hello, world!", None, None).expect("analyze");

    assert_eq!(terms(&tokens), vec!["hello", "world"]);
    assert!(tokens.iter().all(|t| t.reading.is_none()));
}

#[test]
fn test_splits_on_script_boundaries() {
    let analyzer = DictionaryAnalyzer::new();

    let tokens = analyzer.analyze("Rustプログラミングは楽しい", None, None).expect("analyze");

    assert_eq!(terms(&tokens), vec!["Rust", "プログラミング", "は", "楽", "しい"]);
}

#[test]
fn test_dictionary_supplies_reading() {
    // Arrange
    let analyzer = DictionaryAnalyzer::new()
        .with_entry("東京", "トウキョウ")
        .with_entry("東京都", "トウキョウト");

    // Act
    let tokens = analyzer.analyze("東京都に", None, None).expect("analyze");

    // Assert: longest entry wins
    assert_eq!(terms(&tokens), vec!["東京都", "に"]);
    assert_eq!(tokens[0].reading.as_deref(), Some("トウキョウト"));
    assert_eq!(tokens[1].reading, None);
}

#[test]
fn test_offsets_are_byte_offsets() {
    let analyzer = DictionaryAnalyzer::new();
    let text = "ab 東京";

    let tokens = analyzer.analyze(text, None, None).expect("analyze");

    assert_eq!(tokens[1].start_offset, 3);
    assert_eq!(tokens[1].end_offset, text.len());
    assert_eq!(&text[tokens[1].start_offset..tokens[1].end_offset], "東京");
    assert_eq!(tokens[1].position, 1);
}

#[test]
fn test_empty_text_yields_no_tokens() {
    let analyzer = DictionaryAnalyzer::new().with_entry("a", "エー");

    assert!(analyzer.analyze("", None, None).expect("analyze").is_empty());
    assert_eq!(analyzer.len(), 1);
}
