//! Tests for suggestion entries and merge rules.

use proptest::prelude::*;

use super::merge::template;
use super::*;

fn words(text: &str) -> Vec<String> {
    text.split(' ').map(str::to_string).collect()
}

fn readings_for(text: &str) -> Vec<Vec<String>> {
    text.split(' ').map(|w| vec![w.to_string()]).collect()
}

fn query_item(text: &str, freq: u64) -> SuggestItem {
    SuggestItem::builder(words(text), readings_for(text), Kind::Query)
        .freq(freq)
        .timestamp(1)
        .build()
        .expect("build")
}

fn content_item(text: &str, freq: u64) -> SuggestItem {
    SuggestItem::builder(words(text), readings_for(text), Kind::Content)
        .freq(freq)
        .timestamp(1)
        .build()
        .expect("build")
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_id_is_digest_of_text() {
    let a = query_item("fess suggest", 1);
    let b = content_item("fess suggest", 4);

    assert_eq!(a.id(), b.id());
    assert_eq!(a.id(), item_id("fess suggest"));
    assert_eq!(a.id().len(), 64);
    assert_ne!(a.id(), item_id("fess"));
}

#[test]
fn test_text_joins_words_with_space() {
    let item = query_item("apache solr", 1);

    assert_eq!(item.text(), "apache solr");
    assert_eq!(item.words().collect::<Vec<_>>(), vec!["apache", "solr"]);
    assert_eq!(item.readings().len(), 2);
}

#[test]
fn test_default_role_always_present() {
    let item = SuggestItem::builder(words("a"), readings_for("a"), Kind::Content)
        .roles(["admin"])
        .build()
        .expect("build");

    assert!(item.roles().contains(DEFAULT_ROLE));
    assert!(item.roles().contains("admin"));
}

#[test]
fn test_active_score_field_per_kind() {
    let content = content_item("a", 3);
    let query = query_item("a", 5);
    let user = SuggestItem::builder(words("a"), readings_for("a"), Kind::User)
        .user_boost(20)
        .build()
        .expect("build");

    assert_eq!((content.doc_freq(), content.query_freq(), content.user_boost()), (3, 0, UNSET_BOOST));
    assert_eq!((query.doc_freq(), query.query_freq(), query.user_boost()), (0, 5, UNSET_BOOST));
    assert_eq!((user.doc_freq(), user.query_freq(), user.user_boost()), (0, 0, 20));
}

#[test]
fn test_builder_rejects_mismatched_readings() {
    let err = SuggestItem::builder(words("a b"), readings_for("a"), Kind::Query)
        .build()
        .expect_err("mismatch");

    assert!(err.is_validation());
}

#[test]
fn test_builder_rejects_empty_words() {
    assert!(SuggestItem::builder(Vec::new(), Vec::new(), Kind::Query).build().is_err());
    assert!(SuggestItem::builder(vec![" ".into()], vec![vec![]], Kind::Query)
        .build()
        .is_err());
}

#[test]
fn test_document_carries_score_and_round_trips() {
    // Arrange
    let stored = apply_update(None, &content_item("java", 2)).merge(&query_item("java", 3));

    // Act
    let doc = stored.to_document().expect("doc");
    let back = SuggestItem::from_document(doc.clone()).expect("parse");

    // Assert
    assert_eq!(doc["score"], 5);
    assert_eq!(doc["kinds"], serde_json::json!(["content", "query"]));
    assert_eq!(back, stored);
}

// =========================================================================
// Merge rules
// =========================================================================

#[test]
fn test_upsert_into_missing_uses_template() {
    let stored = apply_update(None, &content_item("hoge", 1));

    assert_eq!(stored.doc_freq(), 1);
    assert_eq!(stored.user_boost(), 1);
    assert_eq!(stored.score(), 1);
}

#[test]
fn test_upsert_twice_accumulates_doc_freq() {
    let incoming = content_item("hoge", 1);

    let stored = apply_update(Some(apply_update(None, &incoming)), &incoming);

    assert_eq!(stored.doc_freq(), 2);
    assert_eq!(stored.score(), 2);
}

#[test]
fn test_unset_boost_keeps_stored_boost() {
    // Arrange
    let boosted = SuggestItem::builder(words("hoge"), readings_for("hoge"), Kind::User)
        .user_boost(10)
        .build()
        .expect("build");
    let stored = apply_update(Some(apply_update(None, &boosted)), &content_item("hoge", 3));

    // Assert
    assert_eq!(stored.user_boost(), 10);
    assert_eq!(stored.score(), 30);
    assert!(stored.is_kind(Kind::User) && stored.is_kind(Kind::Content));
}

#[test]
fn test_merge_unions_labels_and_takes_latest_timestamp() {
    // Arrange
    let a = SuggestItem::builder(words("x"), readings_for("x"), Kind::Query)
        .tags(["t1"])
        .roles(["r1"])
        .languages(["ja"])
        .fields(["title"])
        .timestamp(10)
        .build()
        .expect("build");
    let b = SuggestItem::builder(words("x"), vec![vec!["y".into()]], Kind::Query)
        .tags(["t2"])
        .languages(["en"])
        .timestamp(5)
        .build()
        .expect("build");

    // Act
    let merged = a.merge(&b);

    // Assert
    assert_eq!(merged.tags().len(), 2);
    assert_eq!(merged.roles().len(), 2);
    assert_eq!(merged.languages().len(), 2);
    assert_eq!(merged.timestamp(), 10);
    assert_eq!(merged.readings(), &[vec!["y".to_string()]]);
    assert_eq!(merged.query_freq(), 2);
}

#[test]
fn test_merge_batch_collapses_duplicates_in_order() {
    let batch = vec![
        query_item("b", 1),
        query_item("a", 1),
        query_item("b", 2),
        query_item("c", 1),
        query_item("a", 4),
    ];

    let merged = merge_batch(batch);

    let summary: Vec<(&str, u64)> = merged.iter().map(|i| (i.text(), i.query_freq())).collect();
    assert_eq!(summary, vec![("b", 3), ("a", 5), ("c", 1)]);
}

// =========================================================================
// Properties
// =========================================================================

fn arb_item() -> impl Strategy<Value = SuggestItem> {
    (
        prop_oneof![Just(Kind::Content), Just(Kind::Query), Just(Kind::User)],
        0u64..1000,
        prop::collection::btree_set("[a-c]", 0..3),
        prop::collection::btree_set("[r-t]", 0..3),
        0u64..100,
    )
        .prop_map(|(kind, freq, tags, roles, ts)| {
            SuggestItem::builder(vec!["word".into()], vec![vec!["word".into()]], kind)
                .freq(freq)
                .tags(tags)
                .roles(roles)
                .timestamp(ts)
                .build()
                .expect("build")
        })
}

proptest! {
    /// Property: merging into the template adds nothing of its own
    #[test]
    fn prop_template_is_identity(item in arb_item()) {
        let merged = template(&item).merge(&item);
        prop_assert_eq!(merged.query_freq(), item.query_freq());
        prop_assert_eq!(merged.doc_freq(), item.doc_freq());
        prop_assert_eq!(merged.tags(), item.tags());
        prop_assert_eq!(merged.roles(), item.roles());
        prop_assert_eq!(merged.kinds(), item.kinds());
    }

    /// Property: frequencies and labels merge commutatively
    #[test]
    fn prop_merge_is_commutative_on_counts_and_labels(a in arb_item(), b in arb_item()) {
        let ab = a.clone().merge(&b);
        let ba = b.merge(&a);
        prop_assert_eq!(ab.query_freq(), ba.query_freq());
        prop_assert_eq!(ab.doc_freq(), ba.doc_freq());
        prop_assert_eq!(ab.tags(), ba.tags());
        prop_assert_eq!(ab.roles(), ba.roles());
        prop_assert_eq!(ab.kinds(), ba.kinds());
        prop_assert_eq!(ab.timestamp(), ba.timestamp());
    }
}
