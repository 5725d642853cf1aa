//! Search-as-you-type request.

use std::time::Instant;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{label_filters, QueryContext, SuggestResponse};
use crate::deferred::Deferred;
use crate::error::Result;
use crate::item::{Kind, SuggestItem};
use crate::store::{Condition, SearchRequest, SortField};

/// Parameters of a suggest query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestRequest {
    /// Typed text; the last word may be incomplete.
    pub query: String,
    /// Only entries from these source fields.
    pub fields: Vec<String>,
    /// Only entries with one of these tags.
    pub tags: Vec<String>,
    /// Only entries with one of these roles.
    pub roles: Vec<String>,
    /// Only entries with one of these languages. Also passed to the
    /// normalizer and converter chains.
    pub languages: Vec<String>,
    /// Only entries of these kinds.
    pub kinds: Vec<Kind>,
    /// Maximum results; the configured default when unset.
    pub size: Option<usize>,
    /// Collapse entries whose texts differ only in whitespace.
    pub skip_duplicate_words: bool,
    /// Include full entries in the response.
    pub suggest_detail: bool,
}

impl Default for SuggestRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            fields: Vec::new(),
            tags: Vec::new(),
            roles: Vec::new(),
            languages: Vec::new(),
            kinds: Vec::new(),
            size: None,
            skip_duplicate_words: true,
            suggest_detail: true,
        }
    }
}

/// Builds and executes a [`SuggestRequest`].
#[derive(Debug, Clone)]
pub struct SuggestRequestBuilder {
    ctx: QueryContext,
    request: SuggestRequest,
}

impl SuggestRequestBuilder {
    /// Creates an empty request against `ctx`.
    #[must_use]
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            request: SuggestRequest::default(),
        }
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn request(mut self, request: SuggestRequest) -> Self {
        self.request = request;
        self
    }

    /// Sets the typed text.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.request.query = query.into();
        self
    }

    /// Adds a field filter.
    #[must_use]
    pub fn add_field(mut self, field: impl Into<String>) -> Self {
        self.request.fields.push(field.into());
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

    /// Adds a language filter.
    #[must_use]
    pub fn add_language(mut self, language: impl Into<String>) -> Self {
        self.request.languages.push(language.into());
        self
    }

    /// Adds a kind filter.
    #[must_use]
    pub fn add_kind(mut self, kind: Kind) -> Self {
        self.request.kinds.push(kind);
        self
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.request.size = Some(size);
        self
    }

    /// Enables or disables whitespace-insensitive deduplication.
    #[must_use]
    pub fn skip_duplicate_words(mut self, skip: bool) -> Self {
        self.request.skip_duplicate_words = skip;
        self
    }

    /// Enables or disables full entries in the response.
    #[must_use]
    pub fn suggest_detail(mut self, detail: bool) -> Self {
        self.request.suggest_detail = detail;
        self
    }

    /// Validates the parameters and converts the text into a backend query.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for an out-of-range size, or a
    /// conversion error.
    pub fn build_search(&self) -> Result<SearchRequest> {
        let request = &self.request;
        let size = request.size.unwrap_or(self.ctx.search.default_size);
        self.ctx.check_size(size)?;

        let field = request.fields.first().map(String::as_str);
        let normalized = self.ctx.normalizer.normalize(&request.query, field, &request.languages)?;
        let mut conditions = Vec::new();
        for (position, word) in normalized.split_whitespace().enumerate() {
            let path = format!("readings.{position}");
            let readings = self.ctx.converter.convert(word, field, &request.languages)?;
            conditions.push(Condition::or(
                readings.into_iter().map(|reading| Condition::prefix(path.clone(), reading)).collect(),
            ));
        }
        label_filters(&mut conditions, &request.fields, &request.tags, &request.roles, &request.languages);
        if !request.kinds.is_empty() {
            conditions.push(Condition::terms("kinds", request.kinds.iter().map(|k| k.as_str())));
        }

        Ok(SearchRequest::new(Condition::and(conditions), size)
            .sort_by(SortField::desc("score"))
            .timeout(self.ctx.timeout()))
    }

    /// Runs the query on a worker thread.
    ///
    /// # Errors
    ///
    /// Fails synchronously with [`crate::Error::Validation`] or a conversion
    /// error; backend failures reject the returned result.
    pub fn execute(self) -> Result<Deferred<SuggestResponse>> {
        let search = self.build_search()?;
        let Self { ctx, request } = self;
        Ok(Deferred::spawn("suggest-request", move || run(&ctx, &request, search)))
    }
}

fn run(ctx: &QueryContext, request: &SuggestRequest, mut search: SearchRequest) -> Result<SuggestResponse> {
    let start = Instant::now();
    let size = search.size;
    // Duplicates shrink a page, so dedup pages are fetched larger.
    if request.skip_duplicate_words {
        search.size = size.saturating_mul(2);
    }

    let mut response = SuggestResponse {
        index: ctx.index.clone(),
        ..SuggestResponse::default()
    };
    let mut seen = FxHashSet::default();
    loop {
        let page = ctx.store.search(&ctx.index, &search)?;
        response.total = page.total;
        let fetched = page.hits.len();
        for hit in page.hits {
            let item = SuggestItem::from_document(hit.source)?;
            if request.skip_duplicate_words && !seen.insert(item.text().split_whitespace().collect::<String>()) {
                continue;
            }
            response.words.push(item.text().to_string());
            if request.suggest_detail {
                response.items.push(item);
            }
            if response.words.len() == size {
                break;
            }
        }
        search.from += fetched;
        if response.words.len() >= size || fetched < search.size || search.from as u64 >= page.total {
            break;
        }
    }

    response.took = start.elapsed();
    tracing::debug!(
        index = %ctx.index,
        query = %request.query,
        total = response.total,
        words = response.words.len(),
        "suggest"
    );
    Ok(response)
}
