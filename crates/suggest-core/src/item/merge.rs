//! Merge rules for entries sharing an id.
//!
//! The same rules apply client-side, when a batch contains duplicates, and
//! store-side, when an incoming entry is upserted over a stored one:
//!
//! 1. text and readings are taken from the incoming entry
//! 2. `query_freq` and `doc_freq` are summed
//! 3. `user_boost` is replaced only if the incoming value is `>= 0`
//! 4. the stored score is recomputed as `(query_freq + doc_freq) * user_boost`
//! 5. fields, tags, roles, languages and kinds are unioned
//! 6. timestamp is the later of the two
//! 7. a missing stored entry is treated as [`template`]

use indexmap::IndexMap;

use super::{SuggestItem, UNSET_BOOST};

/// Neutral stored entry: zero frequencies, boost 1, empty sets.
#[must_use]
pub fn template(incoming: &SuggestItem) -> SuggestItem {
    SuggestItem {
        id: incoming.id.clone(),
        text: incoming.text.clone(),
        readings: Vec::new(),
        fields: Default::default(),
        tags: Default::default(),
        roles: Default::default(),
        languages: Default::default(),
        kinds: Default::default(),
        query_freq: 0,
        doc_freq: 0,
        user_boost: 1,
        timestamp: 0,
    }
}

impl SuggestItem {
    /// Merges `incoming` into `self`.
    ///
    /// Frequencies and label sets are symmetric; text, readings and a
    /// specified boost follow `incoming`.
    #[must_use]
    pub fn merge(mut self, incoming: &SuggestItem) -> SuggestItem {
        self.merge_from(incoming);
        self
    }

    /// In-place form of [`merge`](Self::merge).
    pub fn merge_from(&mut self, incoming: &SuggestItem) {
        self.text.clone_from(&incoming.text);
        self.id.clone_from(&incoming.id);
        self.readings.clone_from(&incoming.readings);
        self.query_freq = self.query_freq.saturating_add(incoming.query_freq);
        self.doc_freq = self.doc_freq.saturating_add(incoming.doc_freq);
        if incoming.user_boost > UNSET_BOOST {
            self.user_boost = incoming.user_boost;
        }
        self.fields.extend(incoming.fields.iter().cloned());
        self.tags.extend(incoming.tags.iter().cloned());
        self.roles.extend(incoming.roles.iter().cloned());
        self.languages.extend(incoming.languages.iter().cloned());
        self.kinds.extend(incoming.kinds.iter().copied());
        self.timestamp = self.timestamp.max(incoming.timestamp);
    }
}

/// Applies an upsert to the stored entry, if any.
#[must_use]
pub fn apply_update(stored: Option<SuggestItem>, incoming: &SuggestItem) -> SuggestItem {
    stored.unwrap_or_else(|| template(incoming)).merge(incoming)
}

/// Collapses duplicates within a batch, keeping first-seen order.
#[must_use]
pub fn merge_batch(items: Vec<SuggestItem>) -> Vec<SuggestItem> {
    let mut merged: IndexMap<String, SuggestItem> = IndexMap::with_capacity(items.len());
    for item in items {
        match merged.get_mut(&item.id) {
            Some(existing) => existing.merge_from(&item),
            None => {
                merged.insert(item.id.clone(), item);
            }
        }
    }
    merged.into_values().collect()
}
