use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Words kept lower-case by [`normalize_title`] when re-casing an all-caps or
/// all-lower title, except in first position.
const SMALL_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "nor", "as", "at", "by", "for", "in", "of", "off", "on",
    "per", "to", "up", "via",
];

/// Canonicalize free text for comparison: lower-case, straighten apostrophe
/// variants, decompose and strip combining diacritical marks, collapse
/// whitespace runs. Idempotent.
pub fn normalize_text(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| match c {
            // Curly/backtick apostrophe variants all become a straight quote.
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '`' | '\u{00B4}' => '\'',
            c => c,
        })
        .collect();
    let stripped: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    collapse_whitespace(stripped.trim())
}

/// Trim a title, drop a trailing run of periods, and fix uniform casing.
pub fn normalize_title(s: &str) -> String {
    let trimmed = s.trim().trim_end_matches('.').trim_end();
    fix_casing(trimmed)
}

/// Trim an author name and fix uniform casing.
pub fn normalize_author(s: &str) -> String {
    fix_casing(s.trim())
}

/// Trim a publisher name and fix uniform casing.
pub fn normalize_publisher(s: &str) -> String {
    fix_casing(s.trim())
}

/// Extract the first 4-digit year found anywhere in the input, circa prefixes
/// included ("c1995" yields "1995"). Inputs without an extractable year pass
/// through unchanged; this is not an error path.
pub fn normalize_published_date(s: &str) -> String {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
    match YEAR_RE.find(s) {
        Some(year) => year.as_str().to_string(),
        None => s.to_string(),
    }
}

/// Lower-case, trim, and collapse internal whitespace. Punctuation and
/// apostrophes are preserved so "children's" keeps its key form.
pub fn normalize_genre_name(s: &str) -> String {
    collapse_whitespace(&s.trim().to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-case only when the input is entirely upper- or entirely lower-case.
/// Mixed-case input is assumed to be properly cased already ("McDonald",
/// "O'Brien") and is returned as given.
fn fix_casing(s: &str) -> String {
    let is_upper = s == s.to_uppercase();
    let is_lower = s == s.to_lowercase();
    if !is_upper && !is_lower {
        return s.to_string();
    }
    s.split(' ')
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
