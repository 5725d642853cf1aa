//! Progress handle and result types of streaming ingestion tasks.
//!
//! Counters use atomic operations so the caller can poll a running task
//! without blocking it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::deferred::Deferred;
use crate::error::{Error, Result};
use crate::store::BulkFailure;

/// Result of one [`SuggestIndexer::index`](super::SuggestIndexer::index) call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexResponse {
    /// Entries upserted after in-batch deduplication.
    pub indexed: usize,
    /// Entries the backend rejected.
    pub failures: Vec<BulkFailure>,
    /// Wall time of the call.
    pub took: Duration,
}

impl IndexResponse {
    /// Returns true if any entry was rejected.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Final report of a streaming ingestion task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingSummary {
    /// Source records read.
    pub processed: u64,
    /// Entries upserted.
    pub indexed: u64,
    /// Batches flushed, failed ones included.
    pub batches: u64,
    /// Errors captured while the task ran.
    pub errors: usize,
    /// Wall time of the task.
    pub took: Duration,
}

/// Live status of a streaming ingestion task.
#[derive(Debug, Default)]
pub struct IndexingStatus {
    started: AtomicBool,
    done: AtomicBool,
    cancelled: AtomicBool,
    processed: AtomicU64,
    indexed: AtomicU64,
    batches: AtomicU64,
    errors: Mutex<Vec<Error>>,
}

impl IndexingStatus {
    /// Creates a status for a task that has not started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Returns true once the task thread has begun reading.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Returns true once the task has stopped, for any reason.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Source records read so far.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Entries upserted so far.
    #[must_use]
    pub fn indexed(&self) -> u64 {
        self.indexed.load(Ordering::Relaxed)
    }

    /// Batches flushed so far.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Snapshot of the captured errors.
    #[must_use]
    pub fn errors(&self) -> Vec<Error> {
        self.errors.lock().clone()
    }

    /// Number of captured errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    // =========================================================================
    // Task side
    // =========================================================================

    /// Requests cooperative cancellation. Returns false if the task has
    /// already finished.
    pub fn cancel(&self) -> bool {
        if self.is_done() {
            return false;
        }
        self.cancelled.store(true, Ordering::Release);
        true
    }

    pub(crate) fn mark_started(&self) {
        self.started.store(true, Ordering::Release);
    }

    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self, indexed: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.indexed.fetch_add(indexed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self, error: Error) {
        self.errors.lock().push(error);
    }

    pub(crate) fn summary(&self, took: Duration) -> IndexingSummary {
        IndexingSummary {
            processed: self.processed(),
            indexed: self.indexed(),
            batches: self.batches(),
            errors: self.error_count(),
            took,
        }
    }
}

/// Handle to a running streaming ingestion task.
///
/// The result settles with an [`IndexingSummary`] when the source is
/// exhausted, or is rejected with [`Error::Cancelled`] once cancelled.
#[derive(Debug, Clone)]
pub struct IndexingTask {
    status: Arc<IndexingStatus>,
    result: Deferred<IndexingSummary>,
}

impl IndexingTask {
    pub(crate) fn new(status: Arc<IndexingStatus>, result: Deferred<IndexingSummary>) -> Self {
        let canceller = Arc::clone(&status);
        result.set_canceller(move || canceller.cancel());
        Self { status, result }
    }

    /// Live status.
    #[must_use]
    pub fn status(&self) -> &Arc<IndexingStatus> {
        &self.status
    }

    /// Completion result.
    #[must_use]
    pub fn result(&self) -> &Deferred<IndexingSummary> {
        &self.result
    }

    /// Cancels the task. Batches already flushed stay indexed.
    ///
    /// Returns false if the task had already finished.
    pub fn cancel(&self) -> bool {
        self.result.cancel()
    }

    /// Blocks until the task settles or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`], [`Error::Cancelled`], or the error that
    /// stopped the task before it read anything.
    pub fn wait(&self, timeout: Duration) -> Result<IndexingSummary> {
        self.result.wait(timeout)
    }
}
