//! Turns source material into suggestion entries.
//!
//! Every entry goes through the same steps: each word is normalized,
//! words longer than `max_word_length` characters drop the entry, text
//! containing a bad word drops the entry, and each remaining word is
//! converted into its reading set.

use std::sync::Arc;

use serde_json::Value;

use crate::analysis::Analyzer;
use crate::config::IndexerConfig;
use crate::converter::ReadingConverter;
use crate::error::Result;
use crate::item::{Kind, SuggestItem, TEXT_SEPARATOR};
use crate::normalizer::Normalizer;
use crate::query::QueryStringParser;
use crate::reader::{Document, QueryLog};
use crate::settings::ElevateWord;

/// Labels attached to every entry built from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLabels {
    /// Source fields
    pub fields: Vec<String>,
    /// Classification labels
    pub tags: Vec<String>,
    /// Access-scope labels
    pub roles: Vec<String>,
    /// Language hints
    pub languages: Vec<String>,
}

impl EntryLabels {
    /// Labels with the given fields only.
    #[must_use]
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Builds entries from documents, query logs, search words and elevate
/// words.
pub struct ContentsParser {
    normalizer: Arc<dyn Normalizer>,
    converter: Arc<dyn ReadingConverter>,
    analyzer: Arc<dyn Analyzer>,
    query_parser: QueryStringParser,
    config: IndexerConfig,
}

impl std::fmt::Debug for ContentsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentsParser")
            .field("query_parser", &self.query_parser)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContentsParser {
    /// Creates a parser.
    pub fn new(
        normalizer: Arc<dyn Normalizer>,
        converter: Arc<dyn ReadingConverter>,
        analyzer: Arc<dyn Analyzer>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            normalizer,
            converter,
            analyzer,
            query_parser: QueryStringParser::new(config.default_field.clone()),
            config: config.clone(),
        }
    }

    /// Query-string parser using the configured default field.
    #[must_use]
    pub fn query_parser(&self) -> &QueryStringParser {
        &self.query_parser
    }

    /// Normalizes, filters and converts `words` into one entry.
    ///
    /// Returns `None` if no word survives normalization, a word is too
    /// long, or the text contains one of `bad_words`.
    ///
    /// # Errors
    ///
    /// Returns an error if normalization or conversion fails.
    pub fn build_entry(
        &self,
        words: &[String],
        kind: Kind,
        labels: &EntryLabels,
        freq: u64,
        bad_words: &[String],
    ) -> Result<Option<SuggestItem>> {
        let field = labels.fields.first().map(String::as_str);
        let mut normalized = Vec::with_capacity(words.len());
        for word in words {
            let word = self.normalizer.normalize(word, field, &labels.languages)?;
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            if word.chars().count() > self.config.max_word_length {
                tracing::trace!(word, "word too long, skipping entry");
                return Ok(None);
            }
            normalized.push(word.to_string());
        }
        if normalized.is_empty() {
            return Ok(None);
        }

        let text = normalized.join(TEXT_SEPARATOR);
        if let Some(bad) = bad_words.iter().find(|bad| text.contains(bad.as_str())) {
            tracing::trace!(text = %text, bad = %bad, "bad word, skipping entry");
            return Ok(None);
        }

        let readings = normalized
            .iter()
            .map(|word| self.converter.convert(word, field, &labels.languages))
            .collect::<Result<Vec<_>>>()?;

        self.builder(normalized, readings, kind, labels).freq(freq).build().map(Some)
    }

    fn builder(
        &self,
        words: Vec<String>,
        readings: Vec<Vec<String>>,
        kind: Kind,
        labels: &EntryLabels,
    ) -> crate::item::SuggestItemBuilder {
        SuggestItem::builder(words, readings, kind)
            .fields(labels.fields.iter().cloned())
            .tags(labels.tags.iter().cloned())
            .roles(labels.roles.iter().cloned())
            .languages(labels.languages.iter().cloned())
    }

    /// One `content` entry per analyzed token of every supported field.
    ///
    /// # Errors
    ///
    /// Returns an error if analysis, normalization or conversion fails.
    pub fn parse_document(&self, doc: &Document, bad_words: &[String]) -> Result<Vec<SuggestItem>> {
        let tags = string_values(doc, &self.config.tag_field_names);
        let roles = string_values(doc, &self.config.role_field_names);
        let languages = string_values(doc, std::slice::from_ref(&self.config.lang_field_name));
        let lang = languages.first().map(String::as_str);

        let mut items = Vec::new();
        for field in &self.config.supported_fields {
            let labels = EntryLabels {
                fields: vec![field.clone()],
                tags: tags.clone(),
                roles: roles.clone(),
                languages: languages.clone(),
            };
            for text in string_values(doc, std::slice::from_ref(field)) {
                for token in self.analyzer.analyze(&text, Some(field), lang)? {
                    let words = [token.term];
                    if let Some(item) = self.build_entry(&words, Kind::Content, &labels, 1, bad_words)? {
                        items.push(item);
                    }
                }
            }
        }
        Ok(items)
    }

    /// One `query` entry per supported field found in the query string.
    ///
    /// Tags and roles of `labels` are attached to every entry; fields are
    /// taken from the query.
    ///
    /// # Errors
    ///
    /// Returns an error if normalization or conversion fails.
    pub fn parse_query_string(
        &self,
        query: &str,
        labels: &EntryLabels,
        bad_words: &[String],
    ) -> Result<Vec<SuggestItem>> {
        let mut items = Vec::new();
        for (field, words) in self.query_parser.extract(query) {
            if !self.config.supported_fields.contains(&field) {
                continue;
            }
            let labels = EntryLabels {
                fields: vec![field],
                ..labels.clone()
            };
            if let Some(item) = self.build_entry(&words, Kind::Query, &labels, 1, bad_words)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Entries for one logged query. Tags and roles come from the filter
    /// query's tag and role fields.
    ///
    /// # Errors
    ///
    /// Returns an error if normalization or conversion fails.
    pub fn parse_query_log(&self, log: &QueryLog, bad_words: &[String]) -> Result<Vec<SuggestItem>> {
        let mut labels = EntryLabels::default();
        if let Some(filter) = log.filter_query_string.as_deref() {
            for (field, values) in self.query_parser.extract(filter) {
                if self.config.tag_field_names.contains(&field) {
                    labels.tags.extend(values);
                } else if self.config.role_field_names.contains(&field) {
                    labels.roles.extend(values);
                }
            }
        }
        self.parse_query_string(&log.query_string, &labels, bad_words)
    }

    /// One `query` entry for a raw search word.
    ///
    /// # Errors
    ///
    /// Returns an error if normalization or conversion fails.
    pub fn parse_search_word(
        &self,
        word: &str,
        labels: &EntryLabels,
        bad_words: &[String],
    ) -> Result<Option<SuggestItem>> {
        let words: Vec<String> = word.split_whitespace().map(str::to_string).collect();
        self.build_entry(&words, Kind::Query, labels, 1, bad_words)
    }

    /// The `user` entry for a curated phrase.
    ///
    /// A reading with one whitespace-separated part per word is converted
    /// part by part; otherwise the words themselves are converted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the phrase is blank, or an
    /// error if normalization or conversion fails.
    pub fn parse_elevate_word(&self, elevate: &ElevateWord) -> Result<SuggestItem> {
        let labels = EntryLabels {
            fields: elevate.fields.clone(),
            tags: elevate.tags.clone(),
            roles: elevate.roles.clone(),
            languages: Vec::new(),
        };
        let field = labels.fields.first().map(String::as_str);
        let mut words = Vec::new();
        for word in elevate.word.split_whitespace() {
            let word = self.normalizer.normalize(word, field, &[])?;
            if !word.trim().is_empty() {
                words.push(word.trim().to_string());
            }
        }

        let reading_parts: Vec<&str> = elevate
            .reading
            .as_deref()
            .map(|r| r.split_whitespace().collect())
            .unwrap_or_default();
        let sources: Vec<&str> = if reading_parts.len() == words.len() {
            reading_parts
        } else {
            words.iter().map(String::as_str).collect()
        };
        let readings = sources
            .iter()
            .map(|source| self.converter.convert(source, field, &[]))
            .collect::<Result<Vec<_>>>()?;

        self.builder(words, readings, Kind::User, &labels)
            .user_boost(elevate.boost)
            .build()
    }
}

/// String values of the given document fields; arrays contribute each
/// string element.
fn string_values(doc: &Document, fields: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    for field in fields {
        match doc.get(field) {
            Some(Value::String(s)) => values.push(s.clone()),
            Some(Value::Array(items)) => {
                values.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }
    values
}
