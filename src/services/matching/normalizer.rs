//! Text normalization for observed and roster names.
//! Handles transliteration, title stripping, and tokenization.

use deunicode::deunicode;
use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex for stripping non-alphanumeric characters (periods, commas, hyphens).
static RE_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("Invalid regex"));

/// Honorifics and traditional titles dropped before token matching.
/// Handwritten ledgers mix these freely ("Elder Kofi Mensah", "Mad. Adwoa").
const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "madam", "mad", "sir", "hon", "dr", "prof", "rev", "revd",
    "pastor", "apostle", "prophet", "evangelist", "catechist", "elder", "deacon", "deaconess",
    "bro", "brother", "sis", "sister", "osofo", "opanyin", "owula", "maame", "nana", "nii", "naa",
];

/// Normalize a name into matchable tokens.
///
/// Pipeline:
/// 1. Transliterate non-Latin characters via deunicode
/// 2. Strip punctuation/symbols (keep spaces)
/// 3. Lowercase, split on whitespace, drop title words
pub fn name_tokens(text: &str) -> Vec<String> {
    let text_latin = deunicode(text);
    let text_clean = RE_NON_ALNUM.replace_all(&text_latin, " ");
    text_clean
        .to_lowercase()
        .split_whitespace()
        .filter(|token| !TITLES.contains(token))
        .map(str::to_string)
        .collect()
}

/// Normalize raw candidate text into the alias lookup key:
/// transliterated, lowercased, whitespace collapsed. Titles are kept —
/// an alias records exactly what the ledger said.
pub fn normalize_alias_key(text: &str) -> String {
    deunicode(text)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
