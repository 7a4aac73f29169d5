/*!
 * Script detection heuristics for source-language guessing.
 *
 * The web machine-translation backend has to declare a source language for
 * each query, but chapter text arrives untagged. These helpers classify the
 * text by Unicode script presence, checked in priority order:
 * Hangul -> Korean, Kana or Han -> Japanese, Latin -> English, default
 * Japanese. The guess is best-effort and can be wrong for mixed-script
 * input.
 */

use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

static HANGUL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{AC00}-\u{D7AF}]").unwrap());
static KANA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{3040}-\u{30FF}]").unwrap());
static HANZI: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{4E00}-\u{9FFF}]").unwrap());
static LATIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").unwrap());

/// Check if the text contains any Hangul syllable
pub fn has_hangul_chars(text: &str) -> bool {
    HANGUL.is_match(text)
}

/// Check if the text contains any Hiragana or Katakana character
pub fn has_kana_chars(text: &str) -> bool {
    KANA.is_match(text)
}

/// Check if the text contains any Han ideograph
pub fn has_hanzi(text: &str) -> bool {
    HANZI.is_match(text)
}

/// Check if the text contains any Latin letter
pub fn has_english_chars(text: &str) -> bool {
    LATIN.is_match(text)
}

/// Guess the source language of a query string.
///
/// Returns the short code the web-MT service expects (`kor`, `jp`, `en`).
/// Checks are ordered; the first matching script wins and unmatched text
/// falls back to Japanese.
pub fn detect_source_language(text: &str) -> &'static str {
    if has_hangul_chars(text) {
        "kor"
    } else if has_kana_chars(text) || has_hanzi(text) {
        "jp"
    } else if has_english_chars(text) {
        "en"
    } else {
        "jp"
    }
}

/// Human-readable name for the short language codes used in task logs
pub fn language_display_name(code: &str) -> String {
    let language = match code {
        "jp" => Some(Language::Jpn),
        "kor" => Some(Language::Kor),
        "en" => Some(Language::Eng),
        other => Language::from_639_1(other).or_else(|| Language::from_639_3(other)),
    };
    match language {
        Some(lang) => lang.to_name().to_string(),
        None => code.to_string(),
    }
}
