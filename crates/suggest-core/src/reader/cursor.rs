use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;

use super::lock::{DistributedLock, LockKeys, LockOptions, LockOutcome, EXEC_ACTIVE, EXEC_IDLE};
use super::{Document, DocumentReader};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::store::{Condition, ScanPage, ScanRequest, SettingsStore, SortField, SuggestStore};

/// Streams an index through a cursor shared by every reader with the same
/// name.
///
/// Each reader keeps a local queue and refills it one page at a time while
/// holding the record's [`DistributedLock`]. The first empty page flips the
/// exec flag to idle, which ends the stream for every reader. A fetch error
/// discards the cursor and opens a fresh scan, up to `retry_limit` times,
/// after which this reader reports itself finished.
///
/// The exec flag is never reset automatically; call
/// [`reset`](Self::reset) before starting a new run under the same name.
pub struct ConcurrentSourceReader {
    store: Arc<dyn SuggestStore>,
    settings: Arc<dyn SettingsStore>,
    index: String,
    keys: LockKeys,
    lock_options: LockOptions,
    filter: Condition,
    sort: Vec<SortField>,
    page_size: usize,
    retry_limit: usize,
    limit_percentage: Option<f64>,
    queue: VecDeque<Document>,
    finished: bool,
}

impl std::fmt::Debug for ConcurrentSourceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSourceReader")
            .field("index", &self.index)
            .field("keys", &self.keys)
            .field("page_size", &self.page_size)
            .field("queued", &self.queue.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConcurrentSourceReader`].
pub struct ConcurrentSourceReaderBuilder {
    store: Arc<dyn SuggestStore>,
    settings: Arc<dyn SettingsStore>,
    index: String,
    name: Option<String>,
    config: ReaderConfig,
    filter: Condition,
    sort: Vec<SortField>,
}

impl ConcurrentSourceReaderBuilder {
    /// Cursor record name; defaults to `<index>.reader`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Page size, retry limit and lock tuning.
    #[must_use]
    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Restricts the scan to matching documents.
    #[must_use]
    pub fn filter(mut self, filter: Condition) -> Self {
        self.filter = filter;
        self
    }

    /// Adds a scan sort key.
    #[must_use]
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// Builds the reader.
    #[must_use]
    pub fn build(self) -> ConcurrentSourceReader {
        let name = self.name.unwrap_or_else(|| format!("{}.reader", self.index));
        ConcurrentSourceReader {
            store: self.store,
            settings: self.settings,
            index: self.index,
            keys: LockKeys::new(&name),
            lock_options: LockOptions::from(&self.config),
            filter: self.filter,
            sort: self.sort,
            page_size: self.config.page_size.max(1),
            retry_limit: self.config.retry_limit,
            limit_percentage: None,
            queue: VecDeque::new(),
            finished: false,
        }
    }
}

impl ConcurrentSourceReader {
    /// Starts building a reader over `index`.
    pub fn builder(
        store: Arc<dyn SuggestStore>,
        settings: Arc<dyn SettingsStore>,
        index: impl Into<String>,
    ) -> ConcurrentSourceReaderBuilder {
        ConcurrentSourceReaderBuilder {
            store,
            settings,
            index: index.into(),
            name: None,
            config: ReaderConfig::default(),
            filter: Condition::MatchAll,
            sort: Vec::new(),
        }
    }

    /// Settings keys of this reader's record.
    #[must_use]
    pub fn keys(&self) -> &LockKeys {
        &self.keys
    }

    /// Caps a run at `percentage` percent of the matching documents,
    /// counted when the cursor is opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] unless `0 < percentage <= 100`.
    pub fn set_limit_doc_num_percentage(&mut self, percentage: f64) -> Result<()> {
        if !(percentage > 0.0 && percentage <= 100.0) {
            return Err(Error::Validation(format!(
                "document limit must be in (0, 100], got {percentage}"
            )));
        }
        self.limit_percentage = Some(percentage);
        Ok(())
    }

    /// Clears the record named `name` so a new run can start.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn reset(settings: &dyn SettingsStore, name: &str) -> Result<()> {
        let keys = LockKeys::new(name);
        for key in [&keys.cursor, &keys.lock1, &keys.lock2, &keys.exec] {
            settings.remove(key)?;
        }
        Ok(())
    }

    /// Returns true once this reader has nothing more to return.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished && self.queue.is_empty()
    }

    fn refill(&mut self) -> Result<()> {
        let mut lock = DistributedLock::new(Arc::clone(&self.settings), self.keys.clone(), self.lock_options);
        if lock.acquire()? == LockOutcome::Idle {
            self.finished = true;
            return Ok(());
        }
        let fetched = self.fetch_locked();
        let released = lock.release();
        fetched.and(released)
    }

    fn fetch_locked(&mut self) -> Result<()> {
        if self.settings.get(&self.keys.exec)?.as_deref() == Some(EXEC_IDLE) {
            self.finished = true;
            return Ok(());
        }

        let mut failures = 0;
        loop {
            let cursor = self.settings.get(&self.keys.cursor)?.filter(|c| !c.is_empty());
            let fetched = match &cursor {
                Some(token) => self.store.continue_scan(token),
                None => self.open_scan(),
            };

            match fetched {
                Ok(page) => return self.accept_page(cursor, page),
                Err(e) => {
                    failures += 1;
                    self.settings.remove(&self.keys.cursor)?;
                    if failures > self.retry_limit {
                        tracing::warn!(
                            index = %self.index,
                            failures,
                            error = %e,
                            "source fetch keeps failing, finishing this reader"
                        );
                        self.finished = true;
                        return Ok(());
                    }
                    tracing::warn!(index = %self.index, failures, error = %e, "source fetch failed, reopening cursor");
                }
            }
        }
    }

    fn open_scan(&self) -> Result<ScanPage> {
        let max_docs = match self.limit_percentage {
            Some(percentage) => {
                let total = self.store.count(&self.index, &self.filter)?;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let cap = ((total as f64) * percentage / 100.0).floor() as usize;
                Some(cap)
            }
            None => None,
        };
        let request = ScanRequest {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            page_size: self.page_size,
            max_docs,
        };
        let page = self.store.open_scan(&self.index, &request)?;
        self.settings.set(&self.keys.exec, EXEC_ACTIVE)?;
        tracing::debug!(index = %self.index, ?max_docs, "source cursor opened");
        Ok(page)
    }

    fn accept_page(&mut self, previous: Option<String>, page: ScanPage) -> Result<()> {
        if page.hits.is_empty() {
            self.settings.set(&self.keys.exec, EXEC_IDLE)?;
            self.settings.remove(&self.keys.cursor)?;
            if let Some(token) = page.cursor.or(previous) {
                if let Err(e) = self.store.close_scan(&token) {
                    tracing::warn!(index = %self.index, error = %e, "failed to close exhausted cursor");
                }
            }
            tracing::debug!(index = %self.index, "source exhausted");
            self.finished = true;
            return Ok(());
        }

        let count = page.hits.len();
        for hit in page.hits {
            match hit.source {
                Value::Object(doc) => self.queue.push_back(doc),
                _ => tracing::warn!(index = %self.index, id = %hit.id, "skipping non-object source document"),
            }
        }
        tracing::debug!(index = %self.index, count, "source page fetched");

        match &page.cursor {
            Some(token) => self.settings.set(&self.keys.cursor, token)?,
            // No token: this was the last page.
            None => {
                self.settings.set(&self.keys.exec, EXEC_IDLE)?;
                self.settings.remove(&self.keys.cursor)?;
                if let Some(token) = previous {
                    if let Err(e) = self.store.close_scan(&token) {
                        tracing::warn!(index = %self.index, error = %e, "failed to close exhausted cursor");
                    }
                }
                tracing::debug!(index = %self.index, "source exhausted on a final page");
                self.finished = true;
            }
        }
        Ok(())
    }
}

impl DocumentReader for ConcurrentSourceReader {
    fn read(&mut self) -> Result<Option<Document>> {
        loop {
            if let Some(doc) = self.queue.pop_front() {
                return Ok(Some(doc));
            }
            if self.finished {
                return Ok(None);
            }
            self.refill()?;
        }
    }
}
