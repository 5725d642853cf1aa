//! Tests for suggest and popular-words requests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::analysis::{Analyzer, DictionaryAnalyzer};
use crate::config::{ConversionConfig, IndexerConfig};
use crate::item::Kind;
use crate::parser::{ContentsParser, EntryLabels};
use crate::registry::{BuildContext, Registry};
use crate::store::{BulkOperation, InMemoryStore};

const INDEX: &str = "suggest";
const WAIT: Duration = Duration::from_secs(10);

struct Fixture {
    store: Arc<InMemoryStore>,
    parser: ContentsParser,
    ctx: QueryContext,
}

impl Fixture {
    fn new() -> Self {
        let analyzer: Arc<dyn Analyzer> = Arc::new(DictionaryAnalyzer::new().with_entry("東京", "トウキョウ"));
        let ctx = BuildContext {
            analyzer: Arc::clone(&analyzer),
            max_candidates: 10,
        };
        let registry = Registry::with_defaults();
        let conversion = ConversionConfig::default();
        let normalizer: Arc<dyn Normalizer> =
            Arc::new(registry.build_normalizer_chain(&conversion, &ctx).expect("normalizers"));
        let converter: Arc<dyn ReadingConverter> =
            Arc::new(registry.build_converter_chain(&conversion, &ctx).expect("converters"));
        let store = Arc::new(InMemoryStore::new());
        let parser = ContentsParser::new(
            Arc::clone(&normalizer),
            Arc::clone(&converter),
            analyzer,
            &IndexerConfig::default(),
        );
        let ctx = QueryContext::new(
            Arc::clone(&store) as Arc<dyn SuggestStore>,
            INDEX,
            normalizer,
            converter,
            SearchConfig::default(),
            PopularWordsConfig::default(),
        );
        Self { store, parser, ctx }
    }

    fn add(&self, text: &str, kind: Kind, freq: u64, labels: &EntryLabels) {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let item = self
            .parser
            .build_entry(&words, kind, labels, freq, &[])
            .expect("build")
            .expect("entry");
        self.store
            .bulk(INDEX, vec![BulkOperation::Upsert { item }])
            .expect("upsert");
    }

    fn suggest(&self, query: &str) -> SuggestRequestBuilder {
        SuggestRequestBuilder::new(self.ctx.clone()).query(query)
    }

    fn popular(&self) -> PopularWordsRequestBuilder {
        PopularWordsRequestBuilder::new(self.ctx.clone())
    }
}

fn words(builder: SuggestRequestBuilder) -> Vec<String> {
    builder.execute().expect("execute").wait(WAIT).expect("response").words
}

fn plain() -> EntryLabels {
    EntryLabels::fields(["content"])
}

// =========================================================================
// Suggest
// =========================================================================

#[test]
fn test_prefix_of_reading_matches() {
    // Arrange
    let fixture = Fixture::new();
    fixture.add("java", Kind::Content, 1, &plain());
    fixture.add("python", Kind::Content, 1, &plain());

    // Act
    let response = fixture.suggest("jav").execute().expect("execute").wait(WAIT).expect("response");

    // Assert
    assert_eq!(response.words, vec!["java"]);
    assert_eq!(response.num(), 1);
    assert_eq!(response.items[0].text(), "java");
    assert_eq!(response.index, INDEX);
}

#[test]
fn test_query_is_normalized_like_entries() {
    let fixture = Fixture::new();
    fixture.add("java", Kind::Content, 1, &plain());

    assert_eq!(words(fixture.suggest("ＪＡＶ")), vec!["java"]);
}

#[test]
fn test_each_word_matches_its_position() {
    let fixture = Fixture::new();
    fixture.add("java", Kind::Content, 1, &plain());
    fixture.add("java script", Kind::Query, 1, &plain());
    fixture.add("script java", Kind::Query, 1, &plain());

    assert_eq!(words(fixture.suggest("java sc")), vec!["java script"]);
}

#[test]
fn test_kana_and_romaji_match_converted_readings() {
    let fixture = Fixture::new();
    fixture.add("東京", Kind::Content, 1, &plain());

    assert_eq!(words(fixture.suggest("とう")), vec!["東京"]);
    assert_eq!(words(fixture.suggest("tou")), vec!["東京"]);
}

#[test]
fn test_results_sorted_by_score() {
    // Arrange
    let fixture = Fixture::new();
    fixture.add("javadoc", Kind::Content, 1, &plain());
    fixture.add("java", Kind::Query, 5, &plain());
    fixture.add("javelin", Kind::Content, 3, &plain());

    // Act
    let found = words(fixture.suggest("jav"));

    // Assert
    assert_eq!(found, vec!["java", "javelin", "javadoc"]);
}

#[test]
fn test_label_and_kind_filters() {
    // Arrange
    let fixture = Fixture::new();
    let tagged = EntryLabels {
        tags: vec!["docs".into()],
        roles: vec!["admin".into()],
        ..plain()
    };
    fixture.add("java", Kind::Query, 1, &tagged);
    fixture.add("javelin", Kind::Content, 1, &plain());

    // Act & Assert
    assert_eq!(words(fixture.suggest("jav").add_tag("docs")), vec!["java"]);
    assert_eq!(words(fixture.suggest("jav").add_role("admin")), vec!["java"]);
    assert_eq!(words(fixture.suggest("jav").add_kind(Kind::Content)), vec!["javelin"]);
    assert!(words(fixture.suggest("jav").add_field("title")).is_empty());
    assert_eq!(words(fixture.suggest("jav").add_role("_default")).len(), 2);
}

#[test]
fn test_skip_duplicate_words() {
    // Arrange
    let fixture = Fixture::new();
    fixture.add("javascript", Kind::Query, 5, &plain());
    fixture.add("java script", Kind::Query, 3, &plain());
    fixture.add("javelin", Kind::Query, 1, &plain());

    // Act
    let skipped = words(fixture.suggest("jav").size(2));
    let kept = words(fixture.suggest("jav").size(2).skip_duplicate_words(false));

    // Assert
    assert_eq!(skipped, vec!["javascript", "javelin"]);
    assert_eq!(kept, vec!["javascript", "java script"]);
}

#[test]
fn test_detail_can_be_disabled() {
    let fixture = Fixture::new();
    fixture.add("java", Kind::Content, 1, &plain());

    let response = fixture
        .suggest("jav")
        .suggest_detail(false)
        .execute()
        .expect("execute")
        .wait(WAIT)
        .expect("response");

    assert_eq!(response.words, vec!["java"]);
    assert!(response.items.is_empty());
}

#[test]
fn test_invalid_size_fails_before_io() {
    let fixture = Fixture::new();

    let zero = fixture.suggest("jav").size(0).execute().unwrap_err();
    let huge = fixture.suggest("jav").size(1_000_000).execute().unwrap_err();

    assert!(zero.is_validation());
    assert!(huge.is_validation());
}

#[test]
fn test_unreadable_hit_rejects_result() {
    // Arrange
    let fixture = Fixture::new();
    fixture
        .store
        .bulk(
            INDEX,
            vec![BulkOperation::Index {
                id: "foreign".into(),
                document: json!({"text": 42}),
            }],
        )
        .expect("seed");

    // Act
    let result = fixture.suggest("").execute().expect("execute").wait(WAIT);

    // Assert
    assert_eq!(result.unwrap_err().code(), "SUGGEST-007");
}

// =========================================================================
// Popular words
// =========================================================================

fn popular_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.add("rust", Kind::Query, 20, &plain());
    fixture.add("java", Kind::Query, 15, &plain());
    fixture.add("go", Kind::Query, 5, &plain());
    fixture.add("apache solr", Kind::Query, 30, &plain());
    fixture.add("python", Kind::Content, 50, &plain());
    fixture
}

fn popular_words(builder: PopularWordsRequestBuilder) -> Vec<String> {
    builder.execute().expect("execute").wait(WAIT).expect("response").words
}

#[test]
fn test_popular_words_are_frequent_single_word_queries() {
    let fixture = popular_fixture();

    let found = popular_words(fixture.popular().window_size(1));

    assert_eq!(found, vec!["rust", "java"]);
}

#[test]
fn test_popular_words_exclude_and_threshold() {
    let fixture = popular_fixture();

    let excluded = popular_words(fixture.popular().add_exclude_word("java"));
    let lowered = popular_words(fixture.popular().query_freq_threshold(1).window_size(1));

    assert_eq!(excluded, vec!["rust"]);
    assert_eq!(lowered, vec!["rust", "java", "go"]);
}

#[test]
fn test_popular_words_seed_is_reproducible() {
    // Arrange
    let fixture = Fixture::new();
    for i in 0..30 {
        fixture.add(&format!("word{i:02}"), Kind::Query, 10 + i, &plain());
    }

    // Act
    let first = popular_words(fixture.popular().seed(7).size(10));
    let second = popular_words(fixture.popular().seed(7).size(10));

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
    // Only the top window (word10..word29) is eligible.
    assert!(first.iter().all(|w| w.as_str() >= "word10"));
}

#[test]
fn test_popular_words_validation() {
    let fixture = Fixture::new();

    assert!(fixture.popular().window_size(0).execute().unwrap_err().is_validation());
    assert!(fixture.popular().size(0).execute().unwrap_err().is_validation());
}
