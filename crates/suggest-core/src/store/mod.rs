//! Backend contracts.
//!
//! The suggestion index lives in an external document store reached through
//! [`SuggestStore`]; coordination state (the reader's cursor/lock record,
//! bad words, elevate words) lives in a key-value [`SettingsStore`].
//! [`InMemoryStore`] and [`InMemorySettings`] implement both in-process.

mod filter;
mod memory;


use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::item::SuggestItem;

pub use filter::Condition;
pub(crate) use filter::{compare_values, get_field};
pub use memory::{InMemorySettings, InMemoryStore};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field path
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl SortField {
    /// Ascending sort on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Seeded random reordering of the top `window_size` hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomRescore {
    /// Shuffle seed; equal seeds give equal orders.
    pub seed: u64,
    /// Number of leading hits reordered.
    pub window_size: usize,
}

/// A filtered, sorted, paged query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Documents must match this condition.
    pub filter: Condition,
    /// Sort keys, applied in order; ties fall back to id.
    pub sort: Vec<SortField>,
    /// Hits to skip.
    pub from: usize,
    /// Maximum hits returned.
    pub size: usize,
    /// Optional presentation shuffle.
    pub rescore: Option<RandomRescore>,
    /// Backend-side time limit.
    pub timeout: Option<Duration>,
}

impl SearchRequest {
    /// Creates a request for up to `size` hits matching `filter`.
    #[must_use]
    pub fn new(filter: Condition, size: usize) -> Self {
        Self {
            filter,
            size,
            ..Self::default()
        }
    }

    /// Adds a sort key.
    #[must_use]
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// Sets the offset.
    #[must_use]
    pub fn from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    /// Sets the random rescore window.
    #[must_use]
    pub fn rescore(mut self, rescore: RandomRescore) -> Self {
        self.rescore = Some(rescore);
        self
    }

    /// Sets the backend time limit.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document id
    pub id: String,
    /// Document body
    pub source: Value,
}

/// Result of [`SuggestStore::search`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Number of matching documents before paging.
    pub total: u64,
    /// Returned page.
    pub hits: Vec<Hit>,
    /// Backend time spent.
    pub took: Duration,
}

/// One operation of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Stores `document` under `id`, replacing any existing one.
    Index {
        /// Document id
        id: String,
        /// Document body
        document: Value,
    },
    /// Merges `item` into the stored entry with the same id.
    Upsert {
        /// Incoming entry
        item: SuggestItem,
    },
    /// Removes `id`; a missing document is not a failure.
    Delete {
        /// Document id
        id: String,
    },
}

impl BulkOperation {
    /// Id the operation targets.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Delete { id } => id,
            Self::Upsert { item } => item.id(),
        }
    }
}

/// A failed bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// Id of the failed operation
    pub id: String,
    /// Backend message
    pub message: String,
}

/// Result of [`SuggestStore::bulk`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkResponse {
    /// Operations applied.
    pub succeeded: usize,
    /// Operations rejected.
    pub failures: Vec<BulkFailure>,
}

impl BulkResponse {
    /// Returns true if any operation failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Opens a cursor-paginated scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    /// Documents must match this condition.
    pub filter: Condition,
    /// Scan order; empty means id order.
    pub sort: Vec<SortField>,
    /// Documents per page.
    pub page_size: usize,
    /// Caps the total documents the scan returns.
    pub max_docs: Option<usize>,
}

/// One page of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// Token for [`SuggestStore::continue_scan`]. `None` means no further
    /// pages follow this one.
    pub cursor: Option<String>,
    /// Documents on this page; empty once the scan is exhausted.
    pub hits: Vec<Hit>,
}

/// The document store holding suggestion entries and source documents.
///
/// Every method names the index it operates on.
pub trait SuggestStore: Send + Sync {
    /// Runs a filtered, sorted, paged query.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse>;

    /// Counts documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn count(&self, index: &str, filter: &Condition) -> Result<u64>;

    /// Fetches one document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn get(&self, index: &str, id: &str) -> Result<Option<Value>>;

    /// Applies operations as one batch; per-operation failures are reported
    /// in the response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] if the batch could not be sent.
    fn bulk(&self, index: &str, operations: Vec<BulkOperation>) -> Result<BulkResponse>;

    /// Deletes documents matching `filter`, returning how many.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn delete_by_query(&self, index: &str, filter: &Condition) -> Result<u64>;

    /// Opens a scan and returns its first page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn open_scan(&self, index: &str, request: &ScanRequest) -> Result<ScanPage>;

    /// Returns the next page of an open scan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] if the cursor is unknown or expired.
    fn continue_scan(&self, cursor: &str) -> Result<ScanPage>;

    /// Releases an open scan. Unknown cursors are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn close_scan(&self, cursor: &str) -> Result<()>;

    /// Makes preceding writes visible to searches.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn refresh(&self, index: &str) -> Result<()>;
}

/// Key-value settings shared by every process using the index.
pub trait SettingsStore: Send + Sync {
    /// Reads a key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Backend`] on I/O failure.
    fn remove(&self, key: &str) -> Result<()>;
}
