//! Script transliteration primitives.
//!
//! Character-level transforms between hiragana, katakana, half-width and
//! full-width forms, plus an id-driven [`Transliterator`] that composes them
//! with case folding and NFKC.

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

const HIRAGANA_START: u32 = 0x3041;
const HIRAGANA_END: u32 = 0x3096;
const KATAKANA_START: u32 = 0x30A1;
const KATAKANA_END: u32 = 0x30F6;
const KANA_OFFSET: u32 = 0x60;

const FULLWIDTH_START: u32 = 0xFF01;
const FULLWIDTH_END: u32 = 0xFF5E;
const FULLWIDTH_OFFSET: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

const HALFWIDTH_KANA_START: u32 = 0xFF61;
/// Full-width forms of U+FF61..=U+FF9F, in code point order.
const HALFWIDTH_KANA: &str = "。「」、・ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン゛゜";

const HALFWIDTH_VOICED_MARK: char = '\u{FF9E}';
const HALFWIDTH_SEMI_VOICED_MARK: char = '\u{FF9F}';
const COMBINING_VOICED_MARK: char = '\u{3099}';
const COMBINING_SEMI_VOICED_MARK: char = '\u{309A}';

/// Converts one hiragana character to katakana, leaving others unchanged.
#[must_use]
pub fn hiragana_char_to_katakana(c: char) -> char {
    let cp = c as u32;
    if (HIRAGANA_START..=HIRAGANA_END).contains(&cp) || cp == 0x309D || cp == 0x309E {
        char::from_u32(cp + KANA_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

/// Converts one katakana character to hiragana, leaving others unchanged.
#[must_use]
pub fn katakana_char_to_hiragana(c: char) -> char {
    let cp = c as u32;
    if (KATAKANA_START..=KATAKANA_END).contains(&cp) || cp == 0x30FD || cp == 0x30FE {
        char::from_u32(cp - KANA_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

/// Converts hiragana in `text` to katakana.
#[must_use]
pub fn hiragana_to_katakana(text: &str) -> String {
    text.chars().map(hiragana_char_to_katakana).collect()
}

/// Converts katakana in `text` to hiragana.
#[must_use]
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars().map(katakana_char_to_hiragana).collect()
}

/// Returns true for full-width katakana letters and the prolonged sound mark.
#[must_use]
pub fn is_katakana(c: char) -> bool {
    let cp = c as u32;
    (KATAKANA_START..=0x30FA).contains(&cp) || c == 'ー'
}

/// Returns true for hiragana letters.
#[must_use]
pub fn is_hiragana(c: char) -> bool {
    (HIRAGANA_START..=HIRAGANA_END).contains(&(c as u32))
}

/// Folds one full-width ASCII variant (or ideographic space) to ASCII.
#[must_use]
pub fn fullwidth_char_to_halfwidth(c: char) -> char {
    let cp = c as u32;
    if (FULLWIDTH_START..=FULLWIDTH_END).contains(&cp) {
        char::from_u32(cp - FULLWIDTH_OFFSET).unwrap_or(c)
    } else if c == IDEOGRAPHIC_SPACE {
        ' '
    } else {
        c
    }
}

/// Widens one printable ASCII character to its full-width variant.
#[must_use]
pub fn halfwidth_char_to_fullwidth(c: char) -> char {
    let cp = c as u32;
    if (0x21..=0x7E).contains(&cp) {
        char::from_u32(cp + FULLWIDTH_OFFSET).unwrap_or(c)
    } else if c == ' ' {
        IDEOGRAPHIC_SPACE
    } else {
        c
    }
}

/// Folds full-width ASCII variants in `text` to ASCII.
#[must_use]
pub fn fullwidth_to_halfwidth(text: &str) -> String {
    text.chars().map(fullwidth_char_to_halfwidth).collect()
}

/// Widens printable ASCII in `text` to full-width variants.
#[must_use]
pub fn halfwidth_to_fullwidth(text: &str) -> String {
    text.chars().map(halfwidth_char_to_fullwidth).collect()
}

/// Folds only full-width letters and digits to ASCII.
#[must_use]
pub fn fold_fullwidth_alphanumeric(c: char) -> char {
    match c {
        '０'..='９' | 'Ａ'..='Ｚ' | 'ａ'..='ｚ' => fullwidth_char_to_halfwidth(c),
        _ => c,
    }
}

/// Maps one half-width katakana form to its full-width form.
#[must_use]
pub fn halfwidth_kana_char(c: char) -> Option<char> {
    let cp = c as u32;
    cp.checked_sub(HALFWIDTH_KANA_START)
        .and_then(|idx| HALFWIDTH_KANA.chars().nth(idx as usize))
}

/// Returns the voiced form of `base` (`カ` + `゛` = `ガ`).
#[must_use]
pub fn voiced(base: char) -> Option<char> {
    match base {
        'カ'..='ト' | 'ハ'..='ホ' => {
            let cp = base as u32;
            // Voiceable rows alternate plain/voiced; ッ (0x30C3) breaks the run.
            let plain = match cp {
                0x30AB..=0x30C2 => (cp - 0x30AB) % 2 == 0,
                0x30C4..=0x30C9 => (cp - 0x30C4) % 2 == 0,
                0x30CF..=0x30DD => (cp - 0x30CF) % 3 == 0,
                _ => false,
            };
            if plain {
                char::from_u32(cp + 1)
            } else {
                None
            }
        }
        'ウ' => Some('ヴ'),
        'ワ' => Some('ヷ'),
        'ヲ' => Some('ヺ'),
        _ => None,
    }
}

/// Returns the semi-voiced form of `base` (`ハ` + `゜` = `パ`).
#[must_use]
pub fn semi_voiced(base: char) -> Option<char> {
    let cp = base as u32;
    if (0x30CF..=0x30DD).contains(&cp) && (cp - 0x30CF) % 3 == 0 {
        char::from_u32(cp + 2)
    } else {
        None
    }
}

/// Widens half-width katakana, merging a base syllable with a following
/// voicing mark into one voiced character.
#[must_use]
pub fn halfwidth_kana_to_fullwidth(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let base = halfwidth_kana_char(c).unwrap_or(c);
        let merged = match chars.peek() {
            Some(&HALFWIDTH_VOICED_MARK | &COMBINING_VOICED_MARK) => voiced(base),
            Some(&HALFWIDTH_SEMI_VOICED_MARK | &COMBINING_SEMI_VOICED_MARK) => semi_voiced(base),
            _ => None,
        };
        match merged {
            Some(m) => {
                out.push(m);
                chars.next();
            }
            None => out.push(base),
        }
    }
    out
}

/// A single transliteration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// `Any-Lower`
    Lower,
    /// `Any-Upper`
    Upper,
    /// `Fullwidth-Halfwidth` (ASCII variants and ideographic space)
    FullwidthHalfwidth,
    /// `Halfwidth-Fullwidth` (ASCII and half-width katakana)
    HalfwidthFullwidth,
    /// `Hiragana-Katakana`
    HiraganaKatakana,
    /// `Katakana-Hiragana`
    KatakanaHiragana,
    /// `NFKC`
    Nfkc,
}

impl Transform {
    /// Parses one transform id such as `Any-Lower` or `Hiragana-Katakana`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown ids.
    pub fn parse(id: &str) -> Result<Self> {
        match id.trim() {
            "Any-Lower" | "Lower" => Ok(Self::Lower),
            "Any-Upper" | "Upper" => Ok(Self::Upper),
            "Fullwidth-Halfwidth" => Ok(Self::FullwidthHalfwidth),
            "Halfwidth-Fullwidth" => Ok(Self::HalfwidthFullwidth),
            "Hiragana-Katakana" => Ok(Self::HiraganaKatakana),
            "Katakana-Hiragana" => Ok(Self::KatakanaHiragana),
            "NFKC" | "Any-NFKC" => Ok(Self::Nfkc),
            other => Err(Error::Config(format!("unknown transliterator id '{other}'"))),
        }
    }

    /// Applies this transform to `text`.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Lower => text.to_lowercase(),
            Self::Upper => text.to_uppercase(),
            Self::FullwidthHalfwidth => fullwidth_to_halfwidth(text),
            Self::HalfwidthFullwidth => halfwidth_to_fullwidth(&halfwidth_kana_to_fullwidth(text)),
            Self::HiraganaKatakana => hiragana_to_katakana(text),
            Self::KatakanaHiragana => katakana_to_hiragana(text),
            Self::Nfkc => text.nfkc().collect(),
        }
    }
}

/// An ordered list of transforms parsed from a `;`-separated id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transliterator {
    transforms: Vec<Transform>,
}

impl Transliterator {
    /// Parses an id such as `"Any-Lower; Fullwidth-Halfwidth"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any component is unknown or the id is empty.
    pub fn from_id(id: &str) -> Result<Self> {
        let transforms = id
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(Transform::parse)
            .collect::<Result<Vec<_>>>()?;
        if transforms.is_empty() {
            return Err(Error::Config("empty transliterator id".into()));
        }
        Ok(Self { transforms })
    }

    /// Creates a transliterator from explicit transforms.
    #[must_use]
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    /// Applies every transform in order.
    #[must_use]
    pub fn transliterate(&self, text: &str) -> String {
        self.transforms
            .iter()
            .fold(text.to_string(), |acc, t| t.apply(&acc))
    }
}
