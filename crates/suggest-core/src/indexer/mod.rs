//! Writes suggestion entries to the backend.
//!
//! [`SuggestIndexer::index`] deduplicates a batch by id and sends one upsert
//! per unique entry as a single bulk request. The `index_from_*` methods turn
//! query strings, query logs, search words and documents into entries first.
//! Streaming sources run on a background thread and report through an
//! [`IndexingTask`].

mod queue;
mod status;


use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::IndexerConfig;
use crate::deferred::Deferred;
use crate::error::{Error, Result};
use crate::item::{merge_batch, Kind, SuggestItem};
use crate::parser::{ContentsParser, EntryLabels};
use crate::reader::{DocumentReader, QueryLog, QueryLogReader};
use crate::settings::{ElevateWord, SuggestSettings};
use crate::store::{BulkOperation, Condition, SuggestStore};

pub use queue::{SubmitOutcome, UpdateQueue};
pub use status::{IndexResponse, IndexingStatus, IndexingSummary, IndexingTask};

/// Indexes entries into one suggestion index.
///
/// Cloning is cheap; clones share the backend, settings and parser.
#[derive(Clone)]
pub struct SuggestIndexer {
    store: Arc<dyn SuggestStore>,
    settings: Arc<SuggestSettings>,
    parser: Arc<ContentsParser>,
    index: String,
    config: IndexerConfig,
}

impl std::fmt::Debug for SuggestIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestIndexer")
            .field("index", &self.index)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SuggestIndexer {
    /// Creates an indexer writing to `index`.
    pub fn new(
        store: Arc<dyn SuggestStore>,
        settings: Arc<SuggestSettings>,
        parser: Arc<ContentsParser>,
        index: impl Into<String>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            settings,
            parser,
            index: index.into(),
            config,
        }
    }

    /// Name of the suggestion index.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Parser used to build entries.
    #[must_use]
    pub fn parser(&self) -> &Arc<ContentsParser> {
        &self.parser
    }

    /// Shared bad-word and elevate-word lists.
    #[must_use]
    pub fn settings(&self) -> &Arc<SuggestSettings> {
        &self.settings
    }

    // =========================================================================
    // Batch indexing
    // =========================================================================

    /// Upserts `items` as one bulk request.
    ///
    /// Entries containing a bad word are dropped and entries sharing an id
    /// are merged before sending. Per-entry rejections are reported in the
    /// response; the batch is never retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the bad-word list cannot be read or the bulk
    /// request fails as a whole.
    pub fn index(&self, items: Vec<SuggestItem>) -> Result<IndexResponse> {
        let bad_words = self.settings.bad_words()?;
        self.index_filtered(items, &bad_words)
    }

    fn index_filtered(&self, items: Vec<SuggestItem>, bad_words: &[String]) -> Result<IndexResponse> {
        let start = Instant::now();
        let items: Vec<SuggestItem> = items
            .into_iter()
            .filter(|item| !bad_words.iter().any(|bad| item.text().contains(bad.as_str())))
            .collect();
        if items.is_empty() {
            return Ok(IndexResponse {
                took: start.elapsed(),
                ..IndexResponse::default()
            });
        }

        let operations: Vec<BulkOperation> =
            merge_batch(items).into_iter().map(|item| BulkOperation::Upsert { item }).collect();
        let unique = operations.len();
        let response = self.store.bulk(&self.index, operations)?;
        if response.has_failures() {
            tracing::warn!(
                index = %self.index,
                failed = response.failures.len(),
                "bulk upsert rejected entries"
            );
        }
        tracing::debug!(index = %self.index, entries = unique, "bulk upsert");

        Ok(IndexResponse {
            indexed: response.succeeded,
            failures: response.failures,
            took: start.elapsed(),
        })
    }

    /// Indexes one `query` entry per supported field of each query string.
    ///
    /// Query strings using unsupported syntax contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion or the bulk request fails.
    pub fn index_from_query_string<I, S>(&self, queries: I, labels: &EntryLabels) -> Result<IndexResponse>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bad_words = self.settings.bad_words()?;
        let mut items = Vec::new();
        for query in queries {
            items.extend(self.parser.parse_query_string(query.as_ref(), labels, &bad_words)?);
        }
        self.index_filtered(items, &bad_words)
    }

    /// Indexes logged queries, taking tags and roles from each filter query.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion or the bulk request fails.
    pub fn index_from_query_log(&self, logs: &[QueryLog]) -> Result<IndexResponse> {
        let bad_words = self.settings.bad_words()?;
        let mut items = Vec::new();
        for log in logs {
            items.extend(self.parser.parse_query_log(log, &bad_words)?);
        }
        self.index_filtered(items, &bad_words)
    }

    /// Indexes a raw search word as one `query` entry.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion or the bulk request fails.
    pub fn index_from_search_word(&self, word: &str, labels: &EntryLabels) -> Result<IndexResponse> {
        let bad_words = self.settings.bad_words()?;
        let items = self.parser.parse_search_word(word, labels, &bad_words)?.into_iter().collect();
        self.index_filtered(items, &bad_words)
    }

    // =========================================================================
    // Streaming ingestion
    // =========================================================================

    /// Indexes every document `reader` yields on a background thread.
    ///
    /// Entries are flushed every `batch_size` entries. A failing document or
    /// batch is captured in the task status and the stream continues; a
    /// failing read stops the stream.
    #[must_use]
    pub fn index_from_document(&self, mut reader: Box<dyn DocumentReader>) -> IndexingTask {
        let parser = Arc::clone(&self.parser);
        self.spawn_stream("suggest-index-documents", move |bad_words| {
            let Some(doc) = reader.read()? else {
                return Ok(None);
            };
            Ok(Some(parser.parse_document(&doc, bad_words)))
        })
    }

    /// Indexes every query log `reader` yields on a background thread.
    ///
    /// Same batching and error capture as [`Self::index_from_document`].
    #[must_use]
    pub fn index_from_query_log_reader(&self, mut reader: Box<dyn QueryLogReader>) -> IndexingTask {
        let parser = Arc::clone(&self.parser);
        self.spawn_stream("suggest-index-query-logs", move |bad_words| {
            let Some(log) = reader.read()? else {
                return Ok(None);
            };
            Ok(Some(parser.parse_query_log(&log, bad_words)))
        })
    }

    /// Runs `next` until it yields `None`. The outer result is the read, the
    /// inner one the parse of what was read.
    fn spawn_stream<F>(&self, name: &str, mut next: F) -> IndexingTask
    where
        F: FnMut(&[String]) -> Result<Option<Result<Vec<SuggestItem>>>> + Send + 'static,
    {
        let status = Arc::new(IndexingStatus::new());
        let worker_status = Arc::clone(&status);
        let indexer = self.clone();

        let result = Deferred::spawn(name, move || {
            let status = worker_status;
            let start = Instant::now();
            status.mark_started();
            tracing::info!(index = %indexer.index, "streaming ingestion started");

            let outcome = indexer.run_stream(&status, &mut next);
            status.mark_done();
            let summary = status.summary(start.elapsed());
            tracing::info!(
                index = %indexer.index,
                processed = summary.processed,
                indexed = summary.indexed,
                errors = summary.errors,
                cancelled = status.is_cancelled(),
                "streaming ingestion finished"
            );
            if status.is_cancelled() {
                return Err(Error::Cancelled);
            }
            outcome.map(|()| summary)
        });

        IndexingTask::new(status, result)
    }

    fn run_stream<F>(&self, status: &IndexingStatus, next: &mut F) -> Result<()>
    where
        F: FnMut(&[String]) -> Result<Option<Result<Vec<SuggestItem>>>>,
    {
        let bad_words = self.settings.bad_words()?;
        let mut batch = Vec::with_capacity(self.config.batch_size);

        while !status.is_cancelled() {
            let parsed = match next(&bad_words) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(index = %self.index, error = %e, "source read failed, stopping stream");
                    status.record_error(e);
                    break;
                }
            };
            status.record_processed();
            match parsed {
                Ok(items) => batch.extend(items),
                Err(e) => {
                    tracing::warn!(index = %self.index, error = %e, "failed to parse source record");
                    status.record_error(e);
                }
            }
            if batch.len() >= self.config.batch_size {
                self.flush_batch(status, std::mem::take(&mut batch), &bad_words);
            }
        }

        if !batch.is_empty() && !status.is_cancelled() {
            self.flush_batch(status, batch, &bad_words);
        }
        Ok(())
    }

    fn flush_batch(&self, status: &IndexingStatus, batch: Vec<SuggestItem>, bad_words: &[String]) {
        match self.index_filtered(batch, bad_words) {
            Ok(response) => {
                status.record_batch(response.indexed);
                for failure in response.failures {
                    status.record_error(Error::backend(format!(
                        "entry {} rejected: {}",
                        failure.id, failure.message
                    )));
                }
            }
            Err(e) => {
                tracing::warn!(index = %self.index, error = %e, "batch failed, continuing");
                status.record_batch(0);
                status.record_error(e);
            }
        }
    }

    // =========================================================================
    // Curated words
    // =========================================================================

    /// Stores an elevate word and indexes its `user` entry.
    ///
    /// The entry carries no frequencies, so until the phrase is observed in
    /// documents or queries it scores 0 and ranks below observed entries.
    /// Each observation then counts `boost` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank phrase or negative boost,
    /// or a settings, conversion or backend error.
    pub fn add_elevate_word(&self, elevate: &ElevateWord) -> Result<IndexResponse> {
        let item = self.parser.parse_elevate_word(elevate)?;
        self.settings.add_elevate_word(elevate)?;
        self.index(vec![item])
    }

    /// Removes an elevate word and its entry. Returns false if the phrase
    /// was not stored.
    ///
    /// # Errors
    ///
    /// Returns a settings, conversion or backend error.
    pub fn delete_elevate_word(&self, word: &str) -> Result<bool> {
        if !self.settings.delete_elevate_word(word)? {
            return Ok(false);
        }
        let item = self.parser.parse_elevate_word(&ElevateWord::new(word, 0))?;
        self.delete(item.id())?;
        Ok(true)
    }

    /// Re-indexes every stored elevate word.
    ///
    /// # Errors
    ///
    /// Returns a settings, conversion or backend error.
    pub fn restore_elevate_words(&self) -> Result<IndexResponse> {
        let items = self
            .settings
            .elevate_words()?
            .iter()
            .map(|elevate| self.parser.parse_elevate_word(elevate))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(index = %self.index, words = items.len(), "restoring elevate words");
        self.index(items)
    }

    /// Adds a bad word and deletes every entry whose text contains it.
    /// Returns the number of deleted entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank word, or a settings or
    /// backend error.
    pub fn add_bad_word(&self, word: &str) -> Result<u64> {
        self.settings.add_bad_word(word)?;
        self.delete_by_query(&Condition::contains("text", word.trim()))
    }

    /// Removes a bad word. Entries deleted when it was added are not
    /// restored.
    ///
    /// # Errors
    ///
    /// Returns a settings error.
    pub fn delete_bad_word(&self, word: &str) -> Result<bool> {
        self.settings.delete_bad_word(word)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes one entry by id.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let response = self.store.bulk(&self.index, vec![BulkOperation::Delete { id: id.to_string() }])?;
        if let Some(failure) = response.failures.into_iter().next() {
            return Err(Error::backend(format!("failed to delete {}: {}", failure.id, failure.message)));
        }
        self.store.refresh(&self.index)
    }

    /// Deletes every entry.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete_all(&self) -> Result<u64> {
        self.delete_by_query(&Condition::MatchAll)
    }

    /// Deletes entries matching `filter`, returning how many.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete_by_query(&self, filter: &Condition) -> Result<u64> {
        let deleted = self.store.delete_by_query(&self.index, filter)?;
        self.store.refresh(&self.index)?;
        tracing::debug!(index = %self.index, deleted, "deleted entries");
        Ok(deleted)
    }

    /// Deletes entries observed only in documents.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete_document_words(&self) -> Result<u64> {
        self.delete_by_query(&only_kind(Kind::Content))
    }

    /// Deletes entries observed only in query logs.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete_query_words(&self) -> Result<u64> {
        self.delete_by_query(&only_kind(Kind::Query))
    }

    /// Deletes non-curated entries last written before `before`
    /// (epoch millis).
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn delete_old_words(&self, before: u64) -> Result<u64> {
        self.delete_by_query(&Condition::and(vec![
            Condition::lt("timestamp", before),
            Condition::not(Condition::term("kinds", Kind::User.as_str())),
        ]))
    }

    /// Makes preceding writes visible to queries.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn refresh(&self) -> Result<()> {
        self.store.refresh(&self.index)
    }

    /// Starts a coalescing update queue feeding this indexer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the consumer thread cannot be spawned.
    pub fn update_queue(&self) -> Result<UpdateQueue> {
        UpdateQueue::start(
            self.clone(),
            self.config.queue_capacity,
            self.config.queue_drain_max,
            Duration::from_millis(self.config.queue_poll_ms),
        )
    }
}

fn only_kind(kind: Kind) -> Condition {
    let others: Vec<&str> = [Kind::Content, Kind::Query, Kind::User]
        .into_iter()
        .filter(|k| *k != kind)
        .map(Kind::as_str)
        .collect();
    Condition::and(vec![
        Condition::term("kinds", kind.as_str()),
        Condition::not(Condition::terms("kinds", others)),
    ])
}
