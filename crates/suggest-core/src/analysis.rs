//! Morphological analyzer contract.
//!
//! The analyzer segments text into tokens and may supply a phonetic reading
//! per token. A missing reading is a valid response; converters fall back
//! to transliterating the surface form.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One token produced by an [`Analyzer`].
///
/// Offsets are byte offsets into the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedToken {
    /// Token surface form (possibly normalized by the analyzer).
    pub term: String,
    /// Phonetic reading, when the analyzer knows one.
    pub reading: Option<String>,
    /// Byte offset of the first character.
    pub start_offset: usize,
    /// Byte offset one past the last character.
    pub end_offset: usize,
    /// Token position in the stream.
    pub position: usize,
}

impl AnalyzedToken {
    /// Creates a token without reading.
    #[must_use]
    pub fn new(term: impl Into<String>, start_offset: usize, end_offset: usize, position: usize) -> Self {
        Self {
            term: term.into(),
            reading: None,
            start_offset,
            end_offset,
            position,
        }
    }

    /// Attaches a reading.
    #[must_use]
    pub fn with_reading(mut self, reading: impl Into<String>) -> Self {
        self.reading = Some(reading.into());
        self
    }
}

/// Segments text into tokens, optionally with readings.
///
/// `field` and `lang` let implementations pick a per-field or per-language
/// analysis chain; both may be ignored.
pub trait Analyzer: Send + Sync {
    /// Analyzes `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the analysis service fails.
    fn analyze(&self, text: &str, field: Option<&str>, lang: Option<&str>) -> Result<Vec<AnalyzedToken>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Separator,
    Han,
    Hiragana,
    Katakana,
    Word,
    Symbol,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        return CharClass::Separator;
    }
    match c as u32 {
        0x3041..=0x309F => CharClass::Hiragana,
        0x30A0..=0x30FF | 0xFF66..=0xFF9F => CharClass::Katakana,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x3005 => CharClass::Han,
        _ if c.is_alphanumeric() || c == '_' => CharClass::Word,
        _ => CharClass::Symbol,
    }
}

/// Rule-based analyzer with a user dictionary of readings.
///
/// Text is split on whitespace and punctuation. Within each run the longest
/// dictionary entry wins; otherwise characters of the same script class
/// form one token without reading.
#[derive(Debug, Clone, Default)]
pub struct DictionaryAnalyzer {
    entries: FxHashMap<String, String>,
    max_entry_chars: usize,
}

impl DictionaryAnalyzer {
    /// Creates an analyzer with an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface form and its reading.
    #[must_use]
    pub fn with_entry(mut self, surface: impl Into<String>, reading: impl Into<String>) -> Self {
        self.add_entry(surface, reading);
        self
    }

    /// Adds a surface form and its reading.
    pub fn add_entry(&mut self, surface: impl Into<String>, reading: impl Into<String>) {
        let surface = surface.into();
        self.max_entry_chars = self.max_entry_chars.max(surface.chars().count());
        self.entries.insert(surface, reading.into());
    }

    /// Number of dictionary entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn longest_match<'a>(&self, chars: &[(usize, char)], text: &'a str, from: usize) -> Option<(&'a str, usize)> {
        let limit = self.max_entry_chars.min(chars.len() - from);
        (1..=limit).rev().find_map(|len| {
            let start = chars[from].0;
            let end = chars.get(from + len).map_or(text.len(), |(offset, _)| *offset);
            let candidate = &text[start..end];
            self.entries.contains_key(candidate).then_some((candidate, len))
        })
    }
}

impl Analyzer for DictionaryAnalyzer {
    fn analyze(&self, text: &str, _field: Option<&str>, _lang: Option<&str>) -> Result<Vec<AnalyzedToken>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let (start, c) = chars[i];
            let class = classify(c);
            if matches!(class, CharClass::Separator | CharClass::Symbol) {
                i += 1;
                continue;
            }

            if let Some((surface, len)) = self.longest_match(&chars, text, i) {
                let end = start + surface.len();
                let reading = self.entries.get(surface).cloned();
                let mut token = AnalyzedToken::new(surface, start, end, tokens.len());
                token.reading = reading;
                tokens.push(token);
                i += len;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && classify(chars[j].1) == class {
                j += 1;
            }
            let end = chars.get(j).map_or(text.len(), |(offset, _)| *offset);
            tokens.push(AnalyzedToken::new(&text[start..end], start, end, tokens.len()));
            i = j;
        }

        Ok(tokens)
    }
}
