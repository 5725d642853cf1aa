use crate::error::Result;
use crate::script::{fullwidth_to_halfwidth, hiragana_to_katakana};

use super::{ReadingConverter, DEFAULT_MAX_CANDIDATES};

const SOKUON: char = 'ッ';

/// Expands katakana into every plausible Latin spelling.
///
/// The input is walked one unit at a time, a two-character digraph taking
/// priority over a single character. Units with several spellings (`ツ` is
/// both `tu` and `tsu`) fork every partial reading, but only while fewer
/// than `max_candidates` partial readings exist; past the cap only the first
/// spelling is appended. Hiragana input is read as katakana, and characters
/// outside the table are copied through. Results are width-folded and
/// lower-cased.
#[derive(Debug, Clone, Copy)]
pub struct KatakanaToAlphabetConverter {
    max_candidates: usize,
}

impl Default for KatakanaToAlphabetConverter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }
}

impl KatakanaToAlphabetConverter {
    /// Creates a converter producing at most `max_candidates` readings.
    #[must_use]
    pub fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates: max_candidates.max(1),
        }
    }

    /// Candidate cap.
    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    fn append(&self, builders: &mut Vec<String>, spellings: &[String]) {
        let Some((first, rest)) = spellings.split_first() else {
            return;
        };
        let existing = builders.len();
        let mut forks = Vec::new();
        if existing < self.max_candidates {
            'fork: for alt in rest {
                for base in &builders[..existing] {
                    if existing + forks.len() >= self.max_candidates {
                        break 'fork;
                    }
                    forks.push(format!("{base}{alt}"));
                }
            }
        }
        for builder in builders.iter_mut() {
            builder.push_str(first);
        }
        builders.extend(forks);
    }
}

impl ReadingConverter for KatakanaToAlphabetConverter {
    fn convert(&self, text: &str, _field: Option<&str>, _langs: &[String]) -> Result<Vec<String>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let chars: Vec<char> = hiragana_to_katakana(text).chars().collect();
        let mut builders = vec![String::new()];
        let mut i = 0;

        while i < chars.len() {
            if chars[i] == SOKUON {
                if let Some((spellings, len)) = unit_at(&chars, i + 1) {
                    let doubled: Vec<String> = spellings.iter().map(|s| geminate(s)).collect();
                    self.append(&mut builders, &doubled);
                    i += 1 + len;
                    continue;
                }
            }

            match unit_at(&chars, i) {
                Some((spellings, len)) => {
                    let owned: Vec<String> = spellings.iter().map(|s| (*s).to_string()).collect();
                    self.append(&mut builders, &owned);
                    i += len;
                }
                None => {
                    let c = chars[i].to_string();
                    for builder in &mut builders {
                        builder.push_str(&c);
                    }
                    i += 1;
                }
            }
        }

        let mut results: Vec<String> = Vec::with_capacity(builders.len());
        for builder in builders {
            let reading = fullwidth_to_halfwidth(&builder).to_lowercase();
            if !results.contains(&reading) {
                results.push(reading);
            }
        }
        Ok(results)
    }
}

/// Doubles the leading consonant (`ッカ` reads `kka`); vowel-initial
/// spellings get an explicit small-tsu prefix.
fn geminate(spelling: &str) -> String {
    match spelling.chars().next() {
        Some(c) if c.is_ascii_alphabetic() && !matches!(c, 'a' | 'i' | 'u' | 'e' | 'o' | 'n') => {
            format!("{c}{spelling}")
        }
        _ => format!("xtu{spelling}"),
    }
}

/// Looks up the unit starting at `i`, preferring a digraph.
fn unit_at(chars: &[char], i: usize) -> Option<(&'static [&'static str], usize)> {
    let first = *chars.get(i)?;
    if let Some(&second) = chars.get(i + 1) {
        let mut pair = String::with_capacity(6);
        pair.push(first);
        pair.push(second);
        if let Some(spellings) = digraph(&pair) {
            return Some((spellings, 2));
        }
    }
    single(first).map(|spellings| (spellings, 1))
}

#[allow(clippy::too_many_lines)]
fn digraph(pair: &str) -> Option<&'static [&'static str]> {
    let spellings: &'static [&'static str] = match pair {
        "キャ" => &["kya"],
        "キュ" => &["kyu"],
        "キョ" => &["kyo"],
        "キェ" => &["kye"],
        "シャ" => &["sya", "sha"],
        "シュ" => &["syu", "shu"],
        "ショ" => &["syo", "sho"],
        "シェ" => &["sye", "she"],
        "チャ" => &["tya", "cha", "cya"],
        "チュ" => &["tyu", "chu", "cyu"],
        "チョ" => &["tyo", "cho", "cyo"],
        "チェ" => &["tye", "che", "cye"],
        "ニャ" => &["nya"],
        "ニュ" => &["nyu"],
        "ニョ" => &["nyo"],
        "ニェ" => &["nye"],
        "ヒャ" => &["hya"],
        "ヒュ" => &["hyu"],
        "ヒョ" => &["hyo"],
        "ミャ" => &["mya"],
        "ミュ" => &["myu"],
        "ミョ" => &["myo"],
        "リャ" => &["rya"],
        "リュ" => &["ryu"],
        "リョ" => &["ryo"],
        "ギャ" => &["gya"],
        "ギュ" => &["gyu"],
        "ギョ" => &["gyo"],
        "ジャ" => &["zya", "ja", "jya"],
        "ジュ" => &["zyu", "ju", "jyu"],
        "ジョ" => &["zyo", "jo", "jyo"],
        "ジェ" => &["zye", "je", "jye"],
        "ヂャ" => &["dya"],
        "ヂュ" => &["dyu"],
        "ヂョ" => &["dyo"],
        "ビャ" => &["bya"],
        "ビュ" => &["byu"],
        "ビョ" => &["byo"],
        "ピャ" => &["pya"],
        "ピュ" => &["pyu"],
        "ピョ" => &["pyo"],
        "ファ" => &["fa"],
        "フィ" => &["fi"],
        "フェ" => &["fe"],
        "フォ" => &["fo"],
        "フュ" => &["fyu"],
        "ティ" => &["thi", "ti"],
        "テュ" => &["thu"],
        "ディ" => &["dhi", "di"],
        "デュ" => &["dhu"],
        "トゥ" => &["twu", "tu"],
        "ドゥ" => &["dwu", "du"],
        "ウィ" => &["wi"],
        "ウェ" => &["we"],
        "ウォ" => &["who", "wo"],
        "ヴァ" => &["va"],
        "ヴィ" => &["vi"],
        "ヴェ" => &["ve"],
        "ヴォ" => &["vo"],
        "ツァ" => &["tsa"],
        "ツィ" => &["tsi"],
        "ツェ" => &["tse"],
        "ツォ" => &["tso"],
        "イェ" => &["ye"],
        "クァ" => &["kwa", "qa"],
        "グァ" => &["gwa"],
        _ => return None,
    };
    Some(spellings)
}

#[allow(clippy::too_many_lines)]
fn single(c: char) -> Option<&'static [&'static str]> {
    let spellings: &'static [&'static str] = match c {
        'ア' => &["a"],
        'イ' => &["i"],
        'ウ' => &["u"],
        'エ' => &["e"],
        'オ' => &["o"],
        'カ' => &["ka"],
        'キ' => &["ki"],
        'ク' => &["ku"],
        'ケ' => &["ke"],
        'コ' => &["ko"],
        'サ' => &["sa"],
        'シ' => &["si", "shi"],
        'ス' => &["su"],
        'セ' => &["se"],
        'ソ' => &["so"],
        'タ' => &["ta"],
        'チ' => &["ti", "chi"],
        'ツ' => &["tu", "tsu"],
        'テ' => &["te"],
        'ト' => &["to"],
        'ナ' => &["na"],
        'ニ' => &["ni"],
        'ヌ' => &["nu"],
        'ネ' => &["ne"],
        'ノ' => &["no"],
        'ハ' => &["ha"],
        'ヒ' => &["hi"],
        'フ' => &["hu", "fu"],
        'ヘ' => &["he"],
        'ホ' => &["ho"],
        'マ' => &["ma"],
        'ミ' => &["mi"],
        'ム' => &["mu"],
        'メ' => &["me"],
        'モ' => &["mo"],
        'ヤ' => &["ya"],
        'ユ' => &["yu"],
        'ヨ' => &["yo"],
        'ラ' => &["ra"],
        'リ' => &["ri"],
        'ル' => &["ru"],
        'レ' => &["re"],
        'ロ' => &["ro"],
        'ワ' => &["wa"],
        'ヰ' => &["wi", "i"],
        'ヱ' => &["we", "e"],
        'ヲ' => &["wo", "o"],
        'ン' => &["n", "nn"],
        'ガ' => &["ga"],
        'ギ' => &["gi"],
        'グ' => &["gu"],
        'ゲ' => &["ge"],
        'ゴ' => &["go"],
        'ザ' => &["za"],
        'ジ' => &["zi", "ji"],
        'ズ' => &["zu"],
        'ゼ' => &["ze"],
        'ゾ' => &["zo"],
        'ダ' => &["da"],
        'ヂ' => &["di", "ji"],
        'ヅ' => &["du", "zu"],
        'デ' => &["de"],
        'ド' => &["do"],
        'バ' => &["ba"],
        'ビ' => &["bi"],
        'ブ' => &["bu"],
        'ベ' => &["be"],
        'ボ' => &["bo"],
        'パ' => &["pa"],
        'ピ' => &["pi"],
        'プ' => &["pu"],
        'ペ' => &["pe"],
        'ポ' => &["po"],
        'ヴ' => &["vu"],
        'ァ' => &["la", "xa"],
        'ィ' => &["li", "xi"],
        'ゥ' => &["lu", "xu"],
        'ェ' => &["le", "xe"],
        'ォ' => &["lo", "xo"],
        'ャ' => &["lya", "xya"],
        'ュ' => &["lyu", "xyu"],
        'ョ' => &["lyo", "xyo"],
        'ッ' => &["xtu", "ltu"],
        'ヮ' => &["lwa", "xwa"],
        'ヵ' => &["lka", "xka"],
        'ヶ' => &["lke", "xke"],
        'ー' => &["-"],
        _ => return None,
    };
    Some(spellings)
}
