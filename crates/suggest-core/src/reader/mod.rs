//! Sources feeding streaming ingestion.
//!
//! A [`DocumentReader`] yields source documents and a [`QueryLogReader`]
//! yields logged queries; both return `None` once exhausted.
//! [`ConcurrentSourceReader`] streams a backend index through a shared
//! cursor that any number of readers, in any number of processes, can
//! drain together. Coordination goes through a [`DistributedLock`] kept in
//! the settings store.

mod cursor;
mod lock;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use cursor::{ConcurrentSourceReader, ConcurrentSourceReaderBuilder};
pub use lock::{DistributedLock, LockKeys, LockOptions, LockOutcome, EXEC_ACTIVE, EXEC_IDLE};

/// A source document: field name to value.
pub type Document = Map<String, Value>;

/// Yields source documents.
pub trait DocumentReader: Send {
    /// Returns the next document, or `None` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn read(&mut self) -> Result<Option<Document>>;
}

/// One logged search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLog {
    /// The query the user ran.
    pub query_string: String,
    /// Filter query applied alongside it, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_query_string: Option<String>,
}

impl QueryLog {
    /// Creates a log entry without a filter query.
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            filter_query_string: None,
        }
    }

    /// Sets the filter query.
    #[must_use]
    pub fn with_filter(mut self, filter_query_string: impl Into<String>) -> Self {
        self.filter_query_string = Some(filter_query_string.into());
        self
    }
}

/// Yields logged queries.
pub trait QueryLogReader: Send {
    /// Returns the next log entry, or `None` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    fn read(&mut self) -> Result<Option<QueryLog>>;
}

/// Reader over documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentReader {
    docs: VecDeque<Document>,
}

impl MemoryDocumentReader {
    /// Creates a reader over `docs`.
    pub fn new(docs: impl IntoIterator<Item = Document>) -> Self {
        Self {
            docs: docs.into_iter().collect(),
        }
    }
}

impl DocumentReader for MemoryDocumentReader {
    fn read(&mut self) -> Result<Option<Document>> {
        Ok(self.docs.pop_front())
    }
}

/// Reader over query logs held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryLogReader {
    logs: VecDeque<QueryLog>,
}

impl MemoryQueryLogReader {
    /// Creates a reader over `logs`.
    pub fn new(logs: impl IntoIterator<Item = QueryLog>) -> Self {
        Self {
            logs: logs.into_iter().collect(),
        }
    }
}

impl QueryLogReader for MemoryQueryLogReader {
    fn read(&mut self) -> Result<Option<QueryLog>> {
        Ok(self.logs.pop_front())
    }
}
