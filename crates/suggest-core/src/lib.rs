//! # Suggest Core
//!
//! Suggestion (autocomplete) index engine.
//!
//! Words observed in documents and query logs are stored as entries keyed by
//! their text. Each entry carries the phonetic readings of its words, so a
//! partially typed query written in kana, romaji or the original script
//! finds the same entry.
//!
//! ## Features
//!
//! - **Reading conversion**: pluggable normalizer and converter chains
//!   (full-width folding, kana variants, romaji)
//! - **Merge semantics**: repeated observations accumulate frequencies and
//!   union their labels
//! - **Curated lists**: elevate words boost an entry, bad words remove it
//! - **Streaming ingestion**: batched, cancellable indexing from document
//!   and query-log readers, plus a coalescing update queue
//! - **Concurrent readers**: several processes page through one source
//!   index with a shared cursor guarded by a distributed lock
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use suggest_core::parser::EntryLabels;
//! use suggest_core::Suggester;
//!
//! let suggester = Suggester::builder().build()?;
//! let labels = EntryLabels::fields(["content"]);
//! suggester.indexer().index_from_query_string(["content:rust"], &labels)?;
//!
//! let response = suggester.suggest().query("ru").execute()?.wait(Duration::from_secs(5))?;
//! assert_eq!(response.words, vec!["rust"]);
//! # Ok::<(), suggest_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// Frequencies are u64 while page offsets and sizes are usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::single_match_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::uninlined_format_args)]

pub mod analysis;
#[cfg(test)]
mod analysis_tests;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod converter;
pub mod deferred;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod indexer;
pub mod item;
pub mod normalizer;
pub mod parser;
#[cfg(test)]
mod parser_tests;
pub mod query;
pub mod reader;
pub mod registry;
#[cfg(test)]
mod registry_tests;
pub mod request;
pub mod script;
pub mod settings;
pub mod store;
pub mod suggester;

pub use config::{ConfigError, SuggestConfig};
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use indexer::{IndexingStatus, IndexingSummary, IndexingTask, SuggestIndexer, UpdateQueue};
pub use item::{Kind, SuggestItem};
pub use request::{PopularWordsRequest, SuggestRequest, SuggestResponse};
pub use settings::{ElevateWord, SuggestSettings};
pub use store::{InMemorySettings, InMemoryStore, SettingsStore, SuggestStore};
pub use suggester::{Suggester, SuggesterBuilder};
