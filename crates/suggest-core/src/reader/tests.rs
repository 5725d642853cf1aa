//! Tests for readers, the distributed lock and the concurrent source reader.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::*;
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::store::{
    BulkOperation, BulkResponse, Condition, InMemorySettings, InMemoryStore, ScanPage, ScanRequest, SearchRequest,
    SearchResponse, SettingsStore, SortField, SuggestStore,
};

const INDEX: &str = "docs";

fn fast_config(page_size: usize) -> ReaderConfig {
    ReaderConfig {
        page_size,
        lock_backoff_min_ms: 0,
        lock_backoff_max_ms: 1,
        ..ReaderConfig::default()
    }
}

fn fast_lock() -> LockOptions {
    LockOptions {
        idle_threshold: 3,
        timeout: Duration::from_secs(60),
        backoff_min: Duration::ZERO,
        backoff_max: Duration::from_millis(1),
    }
}

fn corpus(n: usize) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let ops = (0..n)
        .map(|i| BulkOperation::Index {
            id: format!("doc{i:03}"),
            document: json!({"n": i, "content": format!("text {i}")}),
        })
        .collect();
    store.bulk(INDEX, ops).expect("seed");
    store
}

fn drain(reader: &mut dyn DocumentReader) -> Vec<Document> {
    let mut docs = Vec::new();
    while let Some(doc) = reader.read().expect("read") {
        docs.push(doc);
    }
    docs
}

/// Delegates to an in-memory store but fails every `open_scan`.
struct BrokenScans {
    inner: InMemoryStore,
    opens: AtomicUsize,
}

impl SuggestStore for BrokenScans {
    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse> {
        self.inner.search(index, request)
    }
    fn count(&self, index: &str, filter: &Condition) -> Result<u64> {
        self.inner.count(index, filter)
    }
    fn get(&self, index: &str, id: &str) -> Result<Option<Value>> {
        self.inner.get(index, id)
    }
    fn bulk(&self, index: &str, operations: Vec<BulkOperation>) -> Result<BulkResponse> {
        self.inner.bulk(index, operations)
    }
    fn delete_by_query(&self, index: &str, filter: &Condition) -> Result<u64> {
        self.inner.delete_by_query(index, filter)
    }
    fn open_scan(&self, _index: &str, _request: &ScanRequest) -> Result<ScanPage> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Err(Error::backend("scan unavailable"))
    }
    fn continue_scan(&self, cursor: &str) -> Result<ScanPage> {
        self.inner.continue_scan(cursor)
    }
    fn close_scan(&self, cursor: &str) -> Result<()> {
        self.inner.close_scan(cursor)
    }
    fn refresh(&self, index: &str) -> Result<()> {
        self.inner.refresh(index)
    }
}

/// Delegates to an in-memory store but answers `open_scan` with one page
/// and no cursor token, as search-after backends do on their last page.
struct TokenlessScans {
    inner: InMemoryStore,
    opens: AtomicUsize,
}

impl SuggestStore for TokenlessScans {
    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse> {
        self.inner.search(index, request)
    }
    fn count(&self, index: &str, filter: &Condition) -> Result<u64> {
        self.inner.count(index, filter)
    }
    fn get(&self, index: &str, id: &str) -> Result<Option<Value>> {
        self.inner.get(index, id)
    }
    fn bulk(&self, index: &str, operations: Vec<BulkOperation>) -> Result<BulkResponse> {
        self.inner.bulk(index, operations)
    }
    fn delete_by_query(&self, index: &str, filter: &Condition) -> Result<u64> {
        self.inner.delete_by_query(index, filter)
    }
    fn open_scan(&self, index: &str, request: &ScanRequest) -> Result<ScanPage> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let mut page = self.inner.open_scan(index, request)?;
        if let Some(token) = page.cursor.take() {
            self.inner.close_scan(&token)?;
        }
        Ok(page)
    }
    fn continue_scan(&self, cursor: &str) -> Result<ScanPage> {
        self.inner.continue_scan(cursor)
    }
    fn close_scan(&self, cursor: &str) -> Result<()> {
        self.inner.close_scan(cursor)
    }
    fn refresh(&self, index: &str) -> Result<()> {
        self.inner.refresh(index)
    }
}

// =========================================================================
// Distributed lock
// =========================================================================

#[test]
fn test_lock_acquire_and_release() {
    // Arrange
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let keys = LockKeys::new("r");
    let mut lock = DistributedLock::new(Arc::clone(&settings), keys.clone(), fast_lock());

    // Act
    let outcome = lock.acquire().expect("acquire");

    // Assert
    assert_eq!(outcome, LockOutcome::Acquired);
    assert!(lock.is_held());
    assert_eq!(settings.get(&keys.lock1).expect("get").as_deref(), Some(lock.caller_id()));
    assert_eq!(settings.get(&keys.lock2).expect("get").as_deref(), Some(lock.caller_id()));

    lock.release().expect("release");
    assert!(!lock.is_held());
    assert_eq!(settings.get(&keys.lock1).expect("get"), None);
    assert_eq!(settings.get(&keys.lock2).expect("get"), None);
}

#[test]
fn test_lock_returns_idle_without_locking() {
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let keys = LockKeys::new("r");
    settings.set(&keys.exec, EXEC_IDLE).expect("set");
    let mut lock = DistributedLock::new(Arc::clone(&settings), keys.clone(), fast_lock());

    assert_eq!(lock.acquire().expect("acquire"), LockOutcome::Idle);
    assert!(!lock.is_held());
    assert_eq!(settings.get(&keys.lock1).expect("get"), None);
}

#[test]
fn test_lock_breaks_stale_holder_after_timeout() {
    // Arrange: a crashed caller left both fields set
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let keys = LockKeys::new("r");
    settings.set(&keys.lock1, "dead-caller").expect("set");
    settings.set(&keys.lock2, "dead-caller").expect("set");
    let options = LockOptions {
        timeout: Duration::from_millis(30),
        ..fast_lock()
    };
    let mut lock = DistributedLock::new(Arc::clone(&settings), keys.clone(), options);

    // Act
    let outcome = lock.acquire().expect("acquire");

    // Assert
    assert_eq!(outcome, LockOutcome::Acquired);
    assert_eq!(settings.get(&keys.lock2).expect("get").as_deref(), Some(lock.caller_id()));
}

#[test]
fn test_release_without_acquire_leaves_fields() {
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let keys = LockKeys::new("r");
    settings.set(&keys.lock1, "someone").expect("set");
    let mut lock = DistributedLock::new(Arc::clone(&settings), keys.clone(), fast_lock());

    lock.release().expect("release");

    assert_eq!(settings.get(&keys.lock1).expect("get").as_deref(), Some("someone"));
}

// =========================================================================
// Concurrent source reader
// =========================================================================

#[test]
fn test_reader_streams_every_document_in_pages() {
    // Arrange
    let store = corpus(7);
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let mut reader = ConcurrentSourceReader::builder(store.clone(), Arc::clone(&settings), INDEX)
        .config(fast_config(3))
        .sort_by(SortField::asc("n"))
        .build();

    // Act
    let docs = drain(&mut reader);

    // Assert
    let ns: Vec<u64> = docs.iter().filter_map(|d| d["n"].as_u64()).collect();
    assert_eq!(ns, (0..7).collect::<Vec<u64>>());
    assert!(reader.is_finished());
    let keys = reader.keys().clone();
    assert_eq!(settings.get(&keys.exec).expect("get").as_deref(), Some(EXEC_IDLE));
    assert_eq!(settings.get(&keys.cursor).expect("get"), None);
    assert_eq!(store.open_scans(), 0);
}

#[test]
fn test_idle_record_stops_new_readers_until_reset() {
    // Arrange
    let store = corpus(4);
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let build = || {
        ConcurrentSourceReader::builder(store.clone(), Arc::clone(&settings), INDEX)
            .name("shared")
            .config(fast_config(10))
            .build()
    };
    assert_eq!(drain(&mut build()).len(), 4);

    // Act & Assert
    assert!(drain(&mut build()).is_empty());
    ConcurrentSourceReader::reset(settings.as_ref(), "shared").expect("reset");
    assert_eq!(drain(&mut build()).len(), 4);
}

#[test]
fn test_limit_doc_num_percentage_caps_run() {
    // Arrange
    let store = corpus(20);
    let mut reader = ConcurrentSourceReader::builder(store, Arc::new(InMemorySettings::new()), INDEX)
        .config(fast_config(4))
        .build();
    reader.set_limit_doc_num_percentage(25.0).expect("limit");

    // Act
    let docs = drain(&mut reader);

    // Assert
    assert_eq!(docs.len(), 5);
}

#[test]
fn test_limit_doc_num_percentage_rejects_out_of_range() {
    let mut reader = ConcurrentSourceReader::builder(corpus(1), Arc::new(InMemorySettings::new()), INDEX).build();

    assert!(reader.set_limit_doc_num_percentage(0.0).is_err());
    assert!(reader.set_limit_doc_num_percentage(100.5).is_err());
    assert!(reader.set_limit_doc_num_percentage(f64::NAN).is_err());
    assert!(reader.set_limit_doc_num_percentage(100.0).is_ok());
}

#[test]
fn test_fetch_failures_finish_reader_after_retry_limit() {
    // Arrange
    let store = Arc::new(BrokenScans {
        inner: InMemoryStore::new(),
        opens: AtomicUsize::new(0),
    });
    let config = ReaderConfig {
        retry_limit: 2,
        ..fast_config(5)
    };
    let mut reader = ConcurrentSourceReader::builder(store.clone(), Arc::new(InMemorySettings::new()), INDEX)
        .config(config)
        .build();

    // Act
    let first = reader.read().expect("fail-soft");

    // Assert: initial attempt plus two retries
    assert!(first.is_none());
    assert_eq!(store.opens.load(Ordering::SeqCst), 3);
    assert!(reader.is_finished());
}

#[test]
fn test_expired_cursor_is_reopened() {
    // Arrange: a cursor token the store no longer knows
    let store = corpus(3);
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let keys = LockKeys::new("stale");
    settings.set(&keys.cursor, "expired-token").expect("set");
    let mut reader = ConcurrentSourceReader::builder(store, Arc::clone(&settings), INDEX)
        .name("stale")
        .config(fast_config(10))
        .build();

    // Act
    let docs = drain(&mut reader);

    // Assert
    assert_eq!(docs.len(), 3);
}

#[test]
fn test_memory_readers_drain_in_order() {
    let mut docs = MemoryDocumentReader::new(vec![Document::new(), Document::new()]);
    let mut logs = MemoryQueryLogReader::new(vec![QueryLog::new("a"), QueryLog::new("b").with_filter("label:x")]);

    assert_eq!(drain(&mut docs).len(), 2);
    assert_eq!(logs.read().expect("read"), Some(QueryLog::new("a")));
    assert_eq!(
        logs.read().expect("read").and_then(|l| l.filter_query_string),
        Some("label:x".to_string())
    );
    assert_eq!(logs.read().expect("read"), None);
}

#[test]
fn test_page_without_cursor_ends_stream() {
    // Arrange
    let inner = InMemoryStore::new();
    let ops = (0..5)
        .map(|i| BulkOperation::Index {
            id: format!("doc{i}"),
            document: json!({"n": i}),
        })
        .collect();
    inner.bulk(INDEX, ops).expect("seed");
    let store = Arc::new(TokenlessScans {
        inner,
        opens: AtomicUsize::new(0),
    });
    let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettings::new());
    let mut reader = ConcurrentSourceReader::builder(store.clone(), Arc::clone(&settings), INDEX)
        .config(fast_config(10))
        .build();

    // Act: bounded so a restarting scan cannot hang the test
    let mut delivered = 0;
    for _ in 0..50 {
        if reader.read().expect("read").is_none() {
            break;
        }
        delivered += 1;
    }

    // Assert
    assert_eq!(delivered, 5);
    assert!(reader.is_finished());
    assert_eq!(store.opens.load(Ordering::SeqCst), 1);
    let keys = reader.keys().clone();
    assert_eq!(settings.get(&keys.exec).expect("get").as_deref(), Some(EXEC_IDLE));
    assert_eq!(settings.get(&keys.cursor).expect("get"), None);
}
