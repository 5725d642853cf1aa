//! Curated word lists kept in the shared settings store.
//!
//! Bad words and elevate words are stored as JSON arrays under
//! `<prefix>.bad_words` and `<prefix>.elevate_words`. Updates are
//! read-modify-write; concurrent writers in one process are serialized.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::SettingsStore;

/// A curated phrase indexed as a `user` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevateWord {
    /// Phrase, words separated by whitespace.
    pub word: String,
    /// Reading of the phrase, whitespace-separated per word. Converted from
    /// the phrase itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    /// Source fields
    #[serde(default)]
    pub fields: Vec<String>,
    /// Classification labels
    #[serde(default)]
    pub tags: Vec<String>,
    /// Access-scope labels
    #[serde(default)]
    pub roles: Vec<String>,
    /// Boost applied to the entry's score.
    pub boost: i64,
}

impl ElevateWord {
    /// Creates an elevate word with the given boost and no labels.
    #[must_use]
    pub fn new(word: impl Into<String>, boost: i64) -> Self {
        Self {
            word: word.into(),
            reading: None,
            fields: Vec::new(),
            tags: Vec::new(),
            roles: Vec::new(),
            boost,
        }
    }

    /// Sets the reading.
    #[must_use]
    pub fn with_reading(mut self, reading: impl Into<String>) -> Self {
        self.reading = Some(reading.into());
        self
    }

    /// Adds tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds roles.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Bad-word and elevate-word lists.
pub struct SuggestSettings {
    store: Arc<dyn SettingsStore>,
    prefix: String,
    write_guard: Mutex<()>,
}

impl std::fmt::Debug for SuggestSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestSettings").field("prefix", &self.prefix).finish()
    }
}

impl SuggestSettings {
    /// Creates the lists under `prefix`.
    pub fn new(store: Arc<dyn SettingsStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            write_guard: Mutex::new(()),
        }
    }

    /// Backing settings store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{name}", self.prefix)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        match self.store.get(&self.key(name))? {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, name: &str, values: &[T]) -> Result<()> {
        self.store.set(&self.key(name), &serde_json::to_string(values)?)
    }

    /// Current bad words.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails or holds invalid JSON.
    pub fn bad_words(&self) -> Result<Vec<String>> {
        self.load("bad_words")
    }

    /// Adds a bad word; returns false if it was already listed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank word, or a store error.
    pub fn add_bad_word(&self, word: &str) -> Result<bool> {
        let word = word.trim();
        if word.is_empty() {
            return Err(Error::Validation("bad word must not be blank".into()));
        }
        let _guard = self.write_guard.lock();
        let mut words: Vec<String> = self.load("bad_words")?;
        if words.iter().any(|w| w == word) {
            return Ok(false);
        }
        words.push(word.to_string());
        self.save("bad_words", &words)?;
        tracing::debug!(word, "bad word added");
        Ok(true)
    }

    /// Removes a bad word; returns false if it was not listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn delete_bad_word(&self, word: &str) -> Result<bool> {
        let _guard = self.write_guard.lock();
        let mut words: Vec<String> = self.load("bad_words")?;
        let before = words.len();
        words.retain(|w| w != word.trim());
        if words.len() == before {
            return Ok(false);
        }
        self.save("bad_words", &words)?;
        Ok(true)
    }

    /// Returns the first bad word contained in `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn find_bad_word(&self, text: &str) -> Result<Option<String>> {
        Ok(self.bad_words()?.into_iter().find(|w| text.contains(w.as_str())))
    }

    /// Current elevate words.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails or holds invalid JSON.
    pub fn elevate_words(&self) -> Result<Vec<ElevateWord>> {
        self.load("elevate_words")
    }

    /// Stores an elevate word, replacing any entry for the same phrase.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank phrase or negative boost,
    /// or a store error.
    pub fn add_elevate_word(&self, elevate: &ElevateWord) -> Result<()> {
        if elevate.word.trim().is_empty() {
            return Err(Error::Validation("elevate word must not be blank".into()));
        }
        if elevate.boost < 0 {
            return Err(Error::Validation(format!("elevate boost must be >= 0, got {}", elevate.boost)));
        }
        let _guard = self.write_guard.lock();
        let mut words: Vec<ElevateWord> = self.load("elevate_words")?;
        words.retain(|w| w.word != elevate.word);
        words.push(elevate.clone());
        self.save("elevate_words", &words)
    }

    /// Removes an elevate word; returns false if it was not listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn delete_elevate_word(&self, word: &str) -> Result<bool> {
        let _guard = self.write_guard.lock();
        let mut words: Vec<ElevateWord> = self.load("elevate_words")?;
        let before = words.len();
        words.retain(|w| w.word != word);
        if words.len() == before {
            return Ok(false);
        }
        self.save("elevate_words", &words)?;
        Ok(true)
    }
}
