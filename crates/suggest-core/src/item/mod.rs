//! Suggestion candidate entries.
//!
//! A [`SuggestItem`] is one completion candidate: the surface text, per-word
//! reading sets, provenance and score fields. Items are immutable once
//! built; updates are new items merged into the stored one (see [`merge`]).
//!
//! ## Usage
//!
//! ```rust
//! use suggest_core::item::{Kind, SuggestItem, DEFAULT_ROLE};
//!
//! let item = SuggestItem::builder(
//!     vec!["rust".to_string()],
//!     vec![vec!["rust".to_string()]],
//!     Kind::Query,
//! )
//! .freq(3)
//! .build()
//! .unwrap();
//!
//! assert_eq!(item.query_freq(), 3);
//! assert!(item.roles().contains(DEFAULT_ROLE));
//! ```

pub mod merge;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub use merge::{apply_update, merge_batch};

/// Role every entry carries, whatever roles the caller supplies.
pub const DEFAULT_ROLE: &str = "_default";

/// Separator joining the words of an entry's text.
pub const TEXT_SEPARATOR: &str = " ";

/// Boost value meaning "not specified, keep the stored boost".
pub const UNSET_BOOST: i64 = -1;

/// Provenance of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Derived from document content; `doc_freq` is active.
    Content,
    /// Derived from the query log; `query_freq` is active.
    Query,
    /// Curated by a user; `user_boost` is active.
    User,
}

impl Kind {
    /// Stored name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Query => "query",
            Self::User => "user",
        }
    }
}

/// Returns the deterministic id of an entry with the given text.
#[must_use]
pub fn item_id(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// One suggestion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestItem {
    id: String,
    text: String,
    readings: Vec<Vec<String>>,
    #[serde(default)]
    fields: BTreeSet<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    languages: BTreeSet<String>,
    #[serde(default)]
    kinds: BTreeSet<Kind>,
    #[serde(default)]
    query_freq: u64,
    #[serde(default)]
    doc_freq: u64,
    #[serde(default = "unset_boost")]
    user_boost: i64,
    #[serde(default)]
    timestamp: u64,
}

fn unset_boost() -> i64 {
    UNSET_BOOST
}

#[derive(Serialize)]
struct StoredDocument<'a> {
    #[serde(flatten)]
    item: &'a SuggestItem,
    score: i64,
}

impl SuggestItem {
    /// Starts building an entry from its words and per-word reading sets.
    #[must_use]
    pub fn builder(words: Vec<String>, readings: Vec<Vec<String>>, kind: Kind) -> SuggestItemBuilder {
        SuggestItemBuilder {
            words,
            readings,
            kind,
            fields: BTreeSet::new(),
            tags: BTreeSet::new(),
            roles: BTreeSet::new(),
            languages: BTreeSet::new(),
            freq: 1,
            user_boost: None,
            timestamp: None,
        }
    }

    /// Deterministic digest of [`text`](Self::text).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical surface form.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Words of the text, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split(TEXT_SEPARATOR)
    }

    /// Reading candidates per word, in word order.
    #[must_use]
    pub fn readings(&self) -> &[Vec<String>] {
        &self.readings
    }

    /// Source fields the entry was observed in.
    #[must_use]
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Classification labels.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Access-scope labels; always contains [`DEFAULT_ROLE`].
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Language hints.
    #[must_use]
    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Every kind observed for this entry.
    #[must_use]
    pub fn kinds(&self) -> &BTreeSet<Kind> {
        &self.kinds
    }

    /// Returns true if `kind` was observed for this entry.
    #[must_use]
    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Accumulated query-log frequency.
    #[must_use]
    pub fn query_freq(&self) -> u64 {
        self.query_freq
    }

    /// Accumulated document frequency.
    #[must_use]
    pub fn doc_freq(&self) -> u64 {
        self.doc_freq
    }

    /// User boost, or [`UNSET_BOOST`].
    #[must_use]
    pub fn user_boost(&self) -> i64 {
        self.user_boost
    }

    /// Epoch milliseconds of the last write.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Composite score: `(query_freq + doc_freq) * user_boost`.
    #[must_use]
    pub fn score(&self) -> i64 {
        let freq = i64::try_from(self.query_freq.saturating_add(self.doc_freq)).unwrap_or(i64::MAX);
        freq.saturating_mul(self.user_boost)
    }

    /// Serializes the entry as a store document, including `score`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if serialization fails.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(StoredDocument {
            item: self,
            score: self.score(),
        })?)
    }

    /// Deserializes an entry from a store document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the document is not an entry.
    pub fn from_document(doc: Value) -> Result<Self> {
        Ok(serde_json::from_value(doc)?)
    }
}

/// Builder for [`SuggestItem`].
#[derive(Debug, Clone)]
pub struct SuggestItemBuilder {
    words: Vec<String>,
    readings: Vec<Vec<String>>,
    kind: Kind,
    fields: BTreeSet<String>,
    tags: BTreeSet<String>,
    roles: BTreeSet<String>,
    languages: BTreeSet<String>,
    freq: u64,
    user_boost: Option<i64>,
    timestamp: Option<u64>,
}

impl SuggestItemBuilder {
    /// Source fields.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Classification labels.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Access-scope labels. [`DEFAULT_ROLE`] is always added on build.
    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Language hints.
    #[must_use]
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages.extend(languages.into_iter().map(Into::into));
        self
    }

    /// Frequency of the active score field (`doc_freq` for content,
    /// `query_freq` for query). Ignored for user entries. Defaults to 1.
    #[must_use]
    pub fn freq(mut self, freq: u64) -> Self {
        self.freq = freq;
        self
    }

    /// User boost. Defaults to 1 for user entries and [`UNSET_BOOST`]
    /// otherwise.
    #[must_use]
    pub fn user_boost(mut self, boost: i64) -> Self {
        self.user_boost = Some(boost);
        self
    }

    /// Overrides the write timestamp (epoch milliseconds).
    #[must_use]
    pub fn timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Builds the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if there are no words, a word is empty,
    /// or the reading sets do not line up with the words.
    pub fn build(self) -> Result<SuggestItem> {
        if self.words.is_empty() {
            return Err(Error::Validation("entry needs at least one word".into()));
        }
        if self.words.iter().any(|w| w.trim().is_empty()) {
            return Err(Error::Validation("entry words must not be blank".into()));
        }
        if self.readings.len() != self.words.len() {
            return Err(Error::Validation(format!(
                "expected {} reading sets, got {}",
                self.words.len(),
                self.readings.len()
            )));
        }

        let text = self.words.join(TEXT_SEPARATOR);
        let (query_freq, doc_freq) = match self.kind {
            Kind::Content => (0, self.freq),
            Kind::Query => (self.freq, 0),
            Kind::User => (0, 0),
        };
        let user_boost = match (self.kind, self.user_boost) {
            (_, Some(boost)) => boost,
            (Kind::User, None) => 1,
            (_, None) => UNSET_BOOST,
        };
        let mut roles = self.roles;
        roles.insert(DEFAULT_ROLE.to_string());

        Ok(SuggestItem {
            id: item_id(&text),
            text,
            readings: self.readings,
            fields: self.fields,
            tags: self.tags,
            roles,
            languages: self.languages,
            kinds: BTreeSet::from([self.kind]),
            query_freq,
            doc_freq,
            user_boost,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
        })
    }
}
