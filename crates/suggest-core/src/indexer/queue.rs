//! Coalescing update queue.
//!
//! Producers push entries into a bounded channel; one consumer thread
//! drains up to `drain_max` entries at a time, merges entries sharing an id
//! and flushes them through [`SuggestIndexer::index`]. A full channel
//! blocks [`UpdateQueue::submit`] and makes [`UpdateQueue::try_submit`]
//! report [`SubmitOutcome::Full`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

use super::SuggestIndexer;
use crate::error::{Error, Result};
use crate::item::SuggestItem;

/// Result of [`UpdateQueue::try_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The entry was queued.
    Queued,
    /// The queue is at capacity; the entry is handed back.
    Full(SuggestItem),
}

#[derive(Debug, Default)]
struct QueueCounters {
    flushed: AtomicU64,
    entries: AtomicU64,
    failed: AtomicU64,
}

/// Bounded queue with a single coalescing consumer.
pub struct UpdateQueue {
    sender: Mutex<Option<Sender<SuggestItem>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<QueueCounters>,
}

impl std::fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending())
            .field("counters", &self.counters)
            .finish()
    }
}

impl UpdateQueue {
    pub(crate) fn start(
        indexer: SuggestIndexer,
        capacity: usize,
        drain_max: usize,
        poll: Duration,
    ) -> Result<Self> {
        let (sender, receiver) = bounded(capacity.max(1));
        let counters = Arc::new(QueueCounters::default());
        let worker_counters = Arc::clone(&counters);
        let worker = std::thread::Builder::new()
            .name("suggest-update-queue".into())
            .spawn(move || consume(&indexer, &receiver, drain_max.max(1), poll, &worker_counters))
            .map_err(|e| Error::Internal(format!("failed to spawn update queue: {e}")))?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            counters,
        })
    }

    fn sender(&self) -> Result<Sender<SuggestItem>> {
        self.sender
            .lock()
            .clone()
            .ok_or_else(|| Error::Internal("update queue is shut down".into()))
    }

    /// Queues an entry, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] after [`Self::shutdown`].
    pub fn submit(&self, item: SuggestItem) -> Result<()> {
        self.sender()?
            .send(item)
            .map_err(|_| Error::Internal("update queue is shut down".into()))
    }

    /// Queues an entry without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] after [`Self::shutdown`].
    pub fn try_submit(&self, item: SuggestItem) -> Result<SubmitOutcome> {
        match self.sender()?.try_send(item) {
            Ok(()) => Ok(SubmitOutcome::Queued),
            Err(TrySendError::Full(item)) => Ok(SubmitOutcome::Full(item)),
            Err(TrySendError::Disconnected(_)) => Err(Error::Internal("update queue is shut down".into())),
        }
    }

    /// Entries waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sender.lock().as_ref().map_or(0, Sender::len)
    }

    /// Flushes performed so far.
    #[must_use]
    pub fn flushed(&self) -> u64 {
        self.counters.flushed.load(Ordering::Relaxed)
    }

    /// Unique entries upserted so far.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.counters.entries.load(Ordering::Relaxed)
    }

    /// Flushes that failed.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Stops accepting entries, flushes what is queued and joins the
    /// consumer. Further calls are no-ops.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::warn!("update queue consumer panicked");
            }
        }
    }
}

impl Drop for UpdateQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn consume(
    indexer: &SuggestIndexer,
    receiver: &Receiver<SuggestItem>,
    drain_max: usize,
    poll: Duration,
    counters: &QueueCounters,
) {
    loop {
        let first = match receiver.recv_timeout(poll) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let mut batch = Vec::with_capacity(drain_max);
        batch.push(first);
        while batch.len() < drain_max {
            match receiver.try_recv() {
                Ok(item) => batch.push(item),
                Err(_) => break,
            }
        }

        let drained = batch.len();
        match indexer.index(batch) {
            Ok(response) => {
                counters.flushed.fetch_add(1, Ordering::Relaxed);
                counters.entries.fetch_add(response.indexed as u64, Ordering::Relaxed);
                tracing::debug!(drained, indexed = response.indexed, "update queue flushed");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(drained, error = %e, "update queue flush failed");
            }
        }
    }
    tracing::debug!("update queue consumer stopped");
}
