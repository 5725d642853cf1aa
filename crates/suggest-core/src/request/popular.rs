//! Popular-words request.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{label_filters, QueryContext, SuggestResponse};
use crate::deferred::Deferred;
use crate::error::{Error, Result};
use crate::item::{Kind, SuggestItem};
use crate::store::{Condition, RandomRescore, SearchRequest, SortField};

/// Parameters of a popular-words query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularWordsRequest {
    /// Only entries with one of these tags.
    pub tags: Vec<String>,
    /// Only entries with one of these roles.
    pub roles: Vec<String>,
    /// Only entries from these source fields.
    pub fields: Vec<String>,
    /// Only entries with one of these languages.
    pub languages: Vec<String>,
    /// Texts never returned.
    pub exclude_words: Vec<String>,
    /// Maximum results; the configured default when unset.
    pub size: Option<usize>,
    /// Shuffle seed; random when unset.
    pub seed: Option<u64>,
    /// Leading entries shuffled; the configured default when unset.
    pub window_size: Option<usize>,
    /// Minimum query frequency; the configured default when unset.
    pub query_freq_threshold: Option<u64>,
    /// Include full entries in the response.
    pub suggest_detail: bool,
}

/// Builds and executes a [`PopularWordsRequest`].
#[derive(Debug, Clone)]
pub struct PopularWordsRequestBuilder {
    ctx: QueryContext,
    request: PopularWordsRequest,
}

impl PopularWordsRequestBuilder {
    /// Creates a request with default parameters against `ctx`.
    #[must_use]
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            request: PopularWordsRequest::default(),
        }
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn request(mut self, request: PopularWordsRequest) -> Self {
        self.request = request;
        self
    }

    /// Adds a tag filter.
    #[must_use]
    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.request.tags.push(tag.into());
        self
    }

    /// Adds a role filter.
    #[must_use]
    pub fn add_role(mut self, role: impl Into<String>) -> Self {
        self.request.roles.push(role.into());
        self
    }

    /// Adds a field filter.
    #[must_use]
    pub fn add_field(mut self, field: impl Into<String>) -> Self {
        self.request.fields.push(field.into());
        self
    }

    /// Adds a language filter.
    #[must_use]
    pub fn add_language(mut self, language: impl Into<String>) -> Self {
        self.request.languages.push(language.into());
        self
    }

    /// Excludes a text from the results.
    #[must_use]
    pub fn add_exclude_word(mut self, word: impl Into<String>) -> Self {
        self.request.exclude_words.push(word.into());
        self
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.request.size = Some(size);
        self
    }

    /// Sets the shuffle seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.request.seed = Some(seed);
        self
    }

    /// Sets the number of leading entries shuffled.
    #[must_use]
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.request.window_size = Some(window_size);
        self
    }

    /// Sets the minimum query frequency.
    #[must_use]
    pub fn query_freq_threshold(mut self, threshold: u64) -> Self {
        self.request.query_freq_threshold = Some(threshold);
        self
    }

    /// Enables or disables full entries in the response.
    #[must_use]
    pub fn suggest_detail(mut self, detail: bool) -> Self {
        self.request.suggest_detail = detail;
        self
    }

    /// Validates the parameters and builds the backend query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an out-of-range size or an empty
    /// shuffle window.
    pub fn build_search(&self) -> Result<SearchRequest> {
        let request = &self.request;
        let defaults = &self.ctx.popular_words;
        let size = request.size.unwrap_or(defaults.default_size);
        self.ctx.check_size(size)?;
        let window_size = request.window_size.unwrap_or(defaults.window_size);
        if window_size == 0 {
            return Err(Error::Validation("window_size must be >= 1".into()));
        }
        let threshold = request.query_freq_threshold.unwrap_or(defaults.query_freq_threshold);

        let mut conditions = vec![
            Condition::term("kinds", Kind::Query.as_str()),
            Condition::not(Condition::exists("readings.1")),
            Condition::gte("query_freq", threshold),
        ];
        label_filters(&mut conditions, &request.fields, &request.tags, &request.roles, &request.languages);
        if !request.exclude_words.is_empty() {
            conditions.push(Condition::not(Condition::terms("text", request.exclude_words.iter().cloned())));
        }

        Ok(SearchRequest::new(Condition::and(conditions), size)
            .sort_by(SortField::desc("query_freq"))
            .rescore(RandomRescore {
                seed: request.seed.unwrap_or_else(rand::random),
                window_size,
            })
            .timeout(self.ctx.timeout()))
    }

    /// Runs the query on a worker thread.
    ///
    /// # Errors
    ///
    /// Fails synchronously with [`Error::Validation`]; backend failures
    /// reject the returned result.
    pub fn execute(self) -> Result<Deferred<SuggestResponse>> {
        let search = self.build_search()?;
        let Self { ctx, request } = self;
        Ok(Deferred::spawn("popular-words-request", move || {
            let start = Instant::now();
            let page = ctx.store.search(&ctx.index, &search)?;
            let mut response = SuggestResponse {
                index: ctx.index.clone(),
                total: page.total,
                ..SuggestResponse::default()
            };
            for hit in page.hits {
                let item = SuggestItem::from_document(hit.source)?;
                response.words.push(item.text().to_string());
                if request.suggest_detail {
                    response.items.push(item);
                }
            }
            response.took = start.elapsed();
            tracing::debug!(index = %ctx.index, words = response.words.len(), "popular words");
            Ok(response)
        }))
    }
}
