//! Entry point tying configuration, conversion chains, indexing and queries
//! together for one suggestion index.

use std::sync::Arc;

use crate::analysis::{Analyzer, DictionaryAnalyzer};
use crate::config::SuggestConfig;
use crate::converter::ReadingConverter;
use crate::error::Result;
use crate::indexer::SuggestIndexer;
use crate::item::Kind;
use crate::normalizer::Normalizer;
use crate::parser::ContentsParser;
use crate::reader::{ConcurrentSourceReader, ConcurrentSourceReaderBuilder};
use crate::registry::{BuildContext, Registry};
use crate::request::{PopularWordsRequestBuilder, QueryContext, SuggestRequestBuilder};
use crate::settings::SuggestSettings;
use crate::store::{Condition, InMemorySettings, InMemoryStore, SettingsStore, SuggestStore};

/// Suggestion engine for one index.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use suggest_core::parser::EntryLabels;
/// use suggest_core::Suggester;
///
/// let suggester = Suggester::builder().build()?;
/// suggester
///     .indexer()
///     .index_from_search_word("java", &EntryLabels::fields(["content"]))?;
///
/// let response = suggester.suggest().query("jav").execute()?.wait(Duration::from_secs(5))?;
/// assert_eq!(response.words, vec!["java"]);
/// # Ok::<(), suggest_core::Error>(())
/// ```
pub struct Suggester {
    config: SuggestConfig,
    store: Arc<dyn SuggestStore>,
    settings_store: Arc<dyn SettingsStore>,
    indexer: SuggestIndexer,
    query: QueryContext,
}

impl std::fmt::Debug for Suggester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suggester")
            .field("index", &self.config.index.name)
            .finish_non_exhaustive()
    }
}

impl Suggester {
    /// Starts building a suggester.
    #[must_use]
    pub fn builder() -> SuggesterBuilder {
        SuggesterBuilder::default()
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &SuggestConfig {
        &self.config
    }

    /// Name of the suggestion index.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.config.index.name
    }

    /// Backend store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SuggestStore> {
        &self.store
    }

    /// Indexer for this index.
    #[must_use]
    pub fn indexer(&self) -> &SuggestIndexer {
        &self.indexer
    }

    /// Bad-word and elevate-word lists.
    #[must_use]
    pub fn settings(&self) -> &Arc<SuggestSettings> {
        self.indexer.settings()
    }

    /// Parser shared by indexing entry points.
    #[must_use]
    pub fn parser(&self) -> &Arc<ContentsParser> {
        self.indexer.parser()
    }

    /// Normalizer chain built from the configuration.
    #[must_use]
    pub fn normalizer(&self) -> &Arc<dyn Normalizer> {
        &self.query.normalizer
    }

    /// Converter chain built from the configuration.
    #[must_use]
    pub fn converter(&self) -> &Arc<dyn ReadingConverter> {
        &self.query.converter
    }

    /// Starts a suggest query.
    #[must_use]
    pub fn suggest(&self) -> SuggestRequestBuilder {
        SuggestRequestBuilder::new(self.query.clone())
    }

    /// Starts a popular-words query.
    #[must_use]
    pub fn popular_words(&self) -> PopularWordsRequestBuilder {
        PopularWordsRequestBuilder::new(self.query.clone())
    }

    /// Starts a concurrent reader over `source_index`, sharing its cursor
    /// with every reader built for the same source.
    #[must_use]
    pub fn source_reader(&self, source_index: &str) -> ConcurrentSourceReaderBuilder {
        ConcurrentSourceReader::builder(Arc::clone(&self.store), Arc::clone(&self.settings_store), source_index)
            .name(format!("{}.reader.{source_index}", self.config.index.settings_prefix))
            .config(self.config.reader.clone())
    }

    /// Makes preceding writes visible to queries.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn refresh(&self) -> Result<()> {
        self.indexer.refresh()
    }

    /// Number of entries in the index.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn all_words_count(&self) -> Result<u64> {
        self.store.count(self.index_name(), &Condition::MatchAll)
    }

    /// Number of entries observed in documents.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn document_words_count(&self) -> Result<u64> {
        self.store.count(self.index_name(), &Condition::term("kinds", Kind::Content.as_str()))
    }

    /// Number of entries observed in query logs.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub fn query_words_count(&self) -> Result<u64> {
        self.store.count(self.index_name(), &Condition::term("kinds", Kind::Query.as_str()))
    }
}

/// Builder for [`Suggester`].
///
/// Anything not set falls back to defaults: [`SuggestConfig::default`],
/// in-memory stores, an empty [`DictionaryAnalyzer`] and
/// [`Registry::with_defaults`].
#[derive(Default)]
pub struct SuggesterBuilder {
    config: Option<SuggestConfig>,
    store: Option<Arc<dyn SuggestStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    analyzer: Option<Arc<dyn Analyzer>>,
    registry: Option<Registry>,
}

impl std::fmt::Debug for SuggesterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggesterBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SuggesterBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: SuggestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the backend store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SuggestStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the shared settings store.
    #[must_use]
    pub fn settings_store(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(settings);
        self
    }

    /// Sets the morphological analyzer.
    #[must_use]
    pub fn analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Sets the stage registry used to build the conversion chains.
    #[must_use]
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the configuration and builds the conversion chains.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for an invalid configuration or an
    /// unknown stage name.
    pub fn build(self) -> Result<Suggester> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let store = self.store.unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let settings_store = self.settings_store.unwrap_or_else(|| Arc::new(InMemorySettings::new()));
        let analyzer = self.analyzer.unwrap_or_else(|| Arc::new(DictionaryAnalyzer::new()));
        let registry = self.registry.unwrap_or_else(Registry::with_defaults);

        let ctx = BuildContext {
            analyzer: Arc::clone(&analyzer),
            max_candidates: config.conversion.max_candidates,
        };
        let normalizer: Arc<dyn Normalizer> = Arc::new(registry.build_normalizer_chain(&config.conversion, &ctx)?);
        let converter: Arc<dyn ReadingConverter> =
            Arc::new(registry.build_converter_chain(&config.conversion, &ctx)?);

        let parser = ContentsParser::new(Arc::clone(&normalizer), Arc::clone(&converter), analyzer, &config.indexer);
        let settings = SuggestSettings::new(Arc::clone(&settings_store), config.index.settings_prefix.clone());
        let indexer = SuggestIndexer::new(
            Arc::clone(&store),
            Arc::new(settings),
            Arc::new(parser),
            config.index.name.clone(),
            config.indexer.clone(),
        );
        let query = QueryContext::new(
            Arc::clone(&store),
            config.index.name.clone(),
            normalizer,
            converter,
            config.search.clone(),
            config.popular_words.clone(),
        );

        tracing::info!(
            index = %config.index.name,
            normalizers = config.conversion.normalizers.len(),
            converters = config.conversion.converters.len(),
            "suggester ready"
        );

        Ok(Suggester {
            config,
            store,
            settings_store,
            indexer,
            query,
        })
    }
}
