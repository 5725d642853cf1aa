//! Suggest engine configuration.
//!
//! Provides configuration file support via `suggest.toml`, environment
//! variables, and programmatic overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`SUGGEST_*`)
//! 2. Configuration file (`suggest.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// Unknown normalizer or converter name.
    #[error("Unknown {kind} stage '{name}'")]
    UnknownStage {
        /// "normalizer" or "converter".
        kind: &'static str,
        /// Name that was not registered.
        name: String,
    },
}

/// One normalizer or converter stage in a chain.
///
/// `name` selects the factory in the [`Registry`](crate::registry::Registry);
/// the remaining keys are deserialized into that factory's typed options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Registered stage name.
    pub name: String,
    /// Stage specific options.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl StageConfig {
    /// Creates a stage entry without options.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    /// Adds an option value.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Suggestion index configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Name of the suggestion index in the backend store.
    pub name: String,
    /// Prefix for every key written to the settings store.
    pub settings_prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "suggest".to_string(),
            settings_prefix: "suggest".to_string(),
        }
    }
}

/// Reading conversion configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Maximum number of reading candidates produced per word.
    pub max_candidates: usize,
    /// Normalizer chain, applied in order.
    pub normalizers: Vec<StageConfig>,
    /// Reading converter chain, applied breadth-first in order.
    pub converters: Vec<StageConfig>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            normalizers: vec![
                StageConfig::named("full_width_to_half_width_alphabet"),
                StageConfig::named("half_width_to_full_width_kana"),
                StageConfig::named("transliterator").with_option("id", "Any-Lower"),
            ],
            converters: vec![StageConfig::named("katakana"), StageConfig::named("romaji")],
        }
    }
}

/// Indexer configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Entries accumulated by a streaming task before each flush.
    pub batch_size: usize,
    /// Capacity of the coalescing update queue.
    pub queue_capacity: usize,
    /// Maximum entries drained per queue flush.
    pub queue_drain_max: usize,
    /// Queue consumer poll interval in milliseconds.
    pub queue_poll_ms: u64,
    /// Document fields that produce suggestion words.
    pub supported_fields: Vec<String>,
    /// Document/query fields whose values become entry tags.
    pub tag_field_names: Vec<String>,
    /// Document/query fields whose values become entry roles.
    pub role_field_names: Vec<String>,
    /// Document field holding language hints.
    pub lang_field_name: String,
    /// Field assigned to unqualified query-string terms.
    pub default_field: String,
    /// Words longer than this (in characters) are skipped.
    pub max_word_length: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            queue_capacity: 1000,
            queue_drain_max: 100,
            queue_poll_ms: 200,
            supported_fields: vec!["content".to_string()],
            tag_field_names: vec!["label".to_string()],
            role_field_names: vec!["role".to_string()],
            lang_field_name: "lang".to_string(),
            default_field: "content".to_string(),
            max_word_length: 64,
        }
    }
}

/// Concurrent source reader configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Documents fetched per cursor page.
    pub page_size: usize,
    /// Fresh-cursor retries after a fetch failure.
    pub retry_limit: usize,
    /// Uncontested iterations before the second lock field is attempted.
    pub lock_idle_threshold: usize,
    /// Lock wait after which both lock fields are forcibly cleared.
    pub lock_timeout_ms: u64,
    /// Lower bound of the randomized contention backoff.
    pub lock_backoff_min_ms: u64,
    /// Upper bound of the randomized contention backoff.
    pub lock_backoff_max_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            retry_limit: 5,
            lock_idle_threshold: 3,
            lock_timeout_ms: 60_000,
            lock_backoff_min_ms: 10,
            lock_backoff_max_ms: 50,
        }
    }
}

/// Suggest query configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when a request sets no size.
    pub default_size: usize,
    /// Largest accepted request size.
    pub max_size: usize,
    /// Backend query timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 1000,
            timeout_ms: 30_000,
        }
    }
}

/// Popular words configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularWordsConfig {
    /// Number of top entries re-scored randomly.
    pub window_size: usize,
    /// Minimum query frequency of a popular word.
    pub query_freq_threshold: u64,
    /// Results returned when a request sets no size.
    pub default_size: usize,
}

impl Default for PopularWordsConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            query_freq_threshold: 10,
            default_size: 10,
        }
    }
}

/// Main suggest configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SuggestConfig {
    /// Suggestion index configuration.
    pub index: IndexConfig,
    /// Reading conversion configuration.
    pub conversion: ConversionConfig,
    /// Indexer configuration.
    pub indexer: IndexerConfig,
    /// Source reader configuration.
    pub reader: ReaderConfig,
    /// Suggest query configuration.
    pub search: SearchConfig,
    /// Popular words configuration.
    pub popular_words: PopularWordsConfig,
}

impl SuggestConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("suggest.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SUGGEST_").split("__").lowercase(true));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.name.trim().is_empty() {
            return Err(invalid("index.name", "must not be empty".to_string()));
        }

        if !(1..=1000).contains(&self.conversion.max_candidates) {
            return Err(invalid(
                "conversion.max_candidates",
                format!(
                    "value {} is out of range [1, 1000]",
                    self.conversion.max_candidates
                ),
            ));
        }

        // Every stage's output counts toward the cap, so a smaller cap
        // truncates the last stage away.
        if self.conversion.max_candidates < self.conversion.converters.len() {
            return Err(invalid(
                "conversion.max_candidates",
                format!(
                    "value {} is below the number of converter stages ({})",
                    self.conversion.max_candidates,
                    self.conversion.converters.len()
                ),
            ));
        }

        if self.indexer.batch_size == 0 {
            return Err(invalid("indexer.batch_size", "must be >= 1".to_string()));
        }

        if self.indexer.queue_capacity == 0 || self.indexer.queue_drain_max == 0 {
            return Err(invalid(
                "indexer.queue_capacity",
                "queue capacity and drain size must be >= 1".to_string(),
            ));
        }

        if self.reader.page_size == 0 {
            return Err(invalid("reader.page_size", "must be >= 1".to_string()));
        }

        if self.reader.lock_backoff_min_ms > self.reader.lock_backoff_max_ms {
            return Err(invalid(
                "reader.lock_backoff_min_ms",
                format!(
                    "value {} exceeds lock_backoff_max_ms {}",
                    self.reader.lock_backoff_min_ms, self.reader.lock_backoff_max_ms
                ),
            ));
        }

        if self.search.default_size == 0 || self.search.default_size > self.search.max_size {
            return Err(invalid(
                "search.default_size",
                format!(
                    "value {} is out of range [1, {}]",
                    self.search.default_size, self.search.max_size
                ),
            ));
        }

        if self.popular_words.window_size == 0 {
            return Err(invalid("popular_words.window_size", "must be >= 1".to_string()));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}
