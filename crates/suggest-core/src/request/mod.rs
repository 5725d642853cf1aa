//! Suggestion queries.
//!
//! [`SuggestRequestBuilder`] completes typed text: the text goes through the
//! same normalizer and converter chains used at indexing time, and each
//! word's readings become prefix filters on the matching `readings.N` set.
//! [`PopularWordsRequestBuilder`] returns frequent single-word queries in a
//! seeded random order.
//!
//! Parameters are validated when the request is executed, before any
//! backend call; the backend call itself runs on a worker thread and is
//! observed through a [`Deferred`](crate::deferred::Deferred).

mod popular;
mod suggest;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{PopularWordsConfig, SearchConfig};
use crate::converter::ReadingConverter;
use crate::error::{Error, Result};
use crate::item::SuggestItem;
use crate::normalizer::Normalizer;
use crate::store::{Condition, SuggestStore};

pub use popular::{PopularWordsRequest, PopularWordsRequestBuilder};
pub use suggest::{SuggestRequest, SuggestRequestBuilder};

/// Everything a request needs to run against one suggestion index.
#[derive(Clone)]
pub struct QueryContext {
    pub(crate) store: Arc<dyn SuggestStore>,
    pub(crate) index: String,
    pub(crate) normalizer: Arc<dyn Normalizer>,
    pub(crate) converter: Arc<dyn ReadingConverter>,
    pub(crate) search: SearchConfig,
    pub(crate) popular_words: PopularWordsConfig,
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("index", &self.index)
            .field("search", &self.search)
            .field("popular_words", &self.popular_words)
            .finish_non_exhaustive()
    }
}

impl QueryContext {
    /// Creates a context for `index`.
    pub fn new(
        store: Arc<dyn SuggestStore>,
        index: impl Into<String>,
        normalizer: Arc<dyn Normalizer>,
        converter: Arc<dyn ReadingConverter>,
        search: SearchConfig,
        popular_words: PopularWordsConfig,
    ) -> Self {
        Self {
            store,
            index: index.into(),
            normalizer,
            converter,
            search,
            popular_words,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.search.timeout_ms)
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size == 0 || size > self.search.max_size {
            return Err(Error::Validation(format!(
                "size must be in [1, {}], got {size}",
                self.search.max_size
            )));
        }
        Ok(())
    }
}

/// Result of a suggest or popular-words request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestResponse {
    /// Suggestion index queried.
    pub index: String,
    /// Wall time of the backend query.
    pub took: Duration,
    /// Matching entries in the index, before paging and deduplication.
    pub total: u64,
    /// Suggested texts, best first.
    pub words: Vec<String>,
    /// Full entries in the same order as `words`; empty unless detail was
    /// requested.
    pub items: Vec<SuggestItem>,
}

impl SuggestResponse {
    /// Number of suggested words.
    #[must_use]
    pub fn num(&self) -> usize {
        self.words.len()
    }

    /// Returns true if nothing was suggested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Label filters shared by both request kinds. An empty list does not
/// filter. Every entry carries the default role, so asking for it admits
/// everything.
fn label_filters(
    conditions: &mut Vec<Condition>,
    fields: &[String],
    tags: &[String],
    roles: &[String],
    languages: &[String],
) {
    if !fields.is_empty() {
        conditions.push(Condition::terms("fields", fields.iter().cloned()));
    }
    if !tags.is_empty() {
        conditions.push(Condition::terms("tags", tags.iter().cloned()));
    }
    if !roles.is_empty() {
        conditions.push(Condition::terms("roles", roles.iter().cloned()));
    }
    if !languages.is_empty() {
        conditions.push(Condition::terms("languages", languages.iter().cloned()));
    }
}
