//! Fuzzy name similarity tolerant of titles, day-names, and handwriting drift.
//!
//! Scores are token-based: each token of the shorter name is matched against
//! the longer name's tokens (each usable once) through a fixed tier ladder,
//! and the matched weights are averaged over the longer token count.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::normalizer;

const W_EXACT: f64 = 1.0;
const W_DAY_NAME: f64 = 0.9;
const W_PHONETIC: f64 = 0.85;
const W_STEM: f64 = 0.7;

/// Levenshtein floor for the stem tier (same as the ratio the legacy
/// spreadsheet tool used for its fuzzy column matcher).
const STEM_LEVENSHTEIN_FLOOR: f64 = 0.8;

/// Akan day-of-birth names, keyed by spelling variant. Spellings of the same
/// day/gender are interchangeable in practice ("Kofi" and "Fiifi" are the
/// same Friday-born male name), so they match at a high weight without being
/// letter-identical.
static DAY_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&'static str, &'static [&'static str])] = &[
        ("monday-m", &["kwadwo", "kwadjo", "kojo", "jojo"]),
        ("monday-f", &["adwoa", "adjoa", "adzo"]),
        ("tuesday-m", &["kwabena", "kobina", "kobby", "ebo"]),
        ("tuesday-f", &["abena", "abenaa", "araba"]),
        ("wednesday-m", &["kwaku", "kweku", "abeiku"]),
        ("wednesday-f", &["akua", "ekua", "akuba"]),
        ("thursday-m", &["yaw", "yao", "ekow"]),
        ("thursday-f", &["yaa", "yawa", "aba"]),
        ("friday-m", &["kofi", "fiifi", "fifi", "yoofi"]),
        ("friday-f", &["afia", "afua", "efua", "afi"]),
        ("saturday-m", &["kwame", "kwamena", "ato"]),
        ("saturday-f", &["ama", "amma", "awo"]),
        ("sunday-m", &["kwasi", "kwesi", "akwasi", "siisi"]),
        ("sunday-f", &["akosua", "akos", "esi"]),
    ];

    let mut map = HashMap::new();
    for (day, spellings) in groups {
        for spelling in *spellings {
            map.insert(*spelling, *day);
        }
    }
    map
});

/// Digraph folding applied before phonetic encoding. Twi/Fante orthography
/// writes labialized and palatalized consonants as two letters that sound
/// like one ("Kwame" ~ "Kame", "Gyasi" ~ "Jasi").
const DIGRAPHS: &[(&str, &str)] = &[
    ("kw", "k"),
    ("dw", "d"),
    ("tw", "t"),
    ("hw", "w"),
    ("gy", "j"),
    ("ky", "c"),
    ("ny", "n"),
];

/// Day-name category for a normalized token, if it is a known day name.
pub(crate) fn day_name_key(token: &str) -> Option<&'static str> {
    DAY_NAMES.get(token).copied()
}

fn soundex_digit(ch: char) -> Option<char> {
    match ch {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

/// Soundex-style code adapted for local digraphs: fold digraphs, collapse
/// doubled letters, then encode first-letter-plus-4-digits.
pub(crate) fn phonetic_code(token: &str) -> String {
    let mut folded = token.to_lowercase();
    for (from, to) in DIGRAPHS {
        folded = folded.replace(from, to);
    }

    // Collapse doubled letters ("Fiifi" → "Fifi", "Mensaah" → "Mensah").
    let mut collapsed = String::with_capacity(folded.len());
    let mut prev: Option<char> = None;
    for ch in folded.chars().filter(|c| c.is_ascii_alphabetic()) {
        if prev != Some(ch) {
            collapsed.push(ch);
        }
        prev = Some(ch);
    }

    let mut chars = collapsed.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return String::new(),
    };

    let mut code = String::with_capacity(5);
    code.push(first);
    let mut prev_digit = soundex_digit(first);
    for ch in chars {
        let digit = soundex_digit(ch);
        if let Some(d) = digit {
            if prev_digit != Some(d) {
                code.push(d);
                if code.len() == 5 {
                    break;
                }
            }
        }
        // Vowels separate consonant runs; h/w do not.
        if digit.is_some() || !matches!(ch, 'h' | 'w') {
            prev_digit = digit;
        }
    }
    while code.len() < 5 {
        code.push('0');
    }
    code
}

/// Find the best unused token in `longer` for `token`, walking the tier
/// ladder in priority order. Returns the index and tier weight.
fn best_token_match(token: &str, longer: &[String], used: &[bool]) -> Option<(usize, f64)> {
    let free = |idx: &usize| !used[*idx];

    // Tier 1: exact
    if let Some(idx) = (0..longer.len())
        .filter(free)
        .find(|&i| longer[i] == token)
    {
        return Some((idx, W_EXACT));
    }

    // Tier 2: day-name variant
    if let Some(day) = day_name_key(token) {
        if let Some(idx) = (0..longer.len())
            .filter(free)
            .find(|&i| day_name_key(&longer[i]) == Some(day))
        {
            return Some((idx, W_DAY_NAME));
        }
    }

    // Tier 3: phonetic
    let code = phonetic_code(token);
    if !code.is_empty() {
        if let Some(idx) = (0..longer.len())
            .filter(free)
            .find(|&i| longer[i].len() > 1 && phonetic_code(&longer[i]) == code)
        {
            return Some((idx, W_PHONETIC));
        }
    }

    // Tier 4: stem — prefix containment or high edit-distance ratio, tokens ≥ 4 chars
    if token.len() >= 4 {
        if let Some(idx) = (0..longer.len()).filter(free).find(|&i| {
            let other = &longer[i];
            other.len() >= 4
                && (other.starts_with(token)
                    || token.starts_with(other.as_str())
                    || strsim::normalized_levenshtein(token, other) >= STEM_LEVENSHTEIN_FLOOR)
        }) {
            return Some((idx, W_STEM));
        }
    }

    None
}

/// Similarity between two name strings, in `[0, 1]`.
///
/// Pure and deterministic. Empty or unmatchable input scores 0, identical
/// normalized names score 1. Bare initials (single-character tokens) are
/// skipped — an initial alone cannot identify a match.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = normalizer::name_tokens(a);
    let tokens_b = normalizer::name_tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    if tokens_a == tokens_b {
        return 1.0;
    }

    let (shorter, longer) = if tokens_a.len() <= tokens_b.len() {
        (&tokens_a, &tokens_b)
    } else {
        (&tokens_b, &tokens_a)
    };

    let mut used = vec![false; longer.len()];
    let mut total = 0.0;
    for token in shorter {
        if token.chars().count() <= 1 {
            continue;
        }
        if let Some((idx, weight)) = best_token_match(token, longer, &used) {
            used[idx] = true;
            total += weight;
        }
    }

    total / longer.len() as f64
}

#[cfg(test)]
#[path = "tests/similarity_tests.rs"]
mod tests;
