use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_text;

/// Parsed series membership. `name` may be empty; `position` may be a decimal
/// (novellas are often shelved at "#1.5").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesParseResult {
    pub name: String,
    pub position: Option<f64>,
}

impl SeriesParseResult {
    fn empty() -> Self {
        SeriesParseResult {
            name: String::new(),
            position: None,
        }
    }
}

/// English word numerals accepted by the "Book N" notation. Deliberately an
/// explicit table rather than a general number-word parser: catalogs only use
/// the first few in practice.
const WORD_NUMERALS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
];

// Notations in fixed priority order; the first regex to match wins and its
// suffix (plus adjoining punctuation) is stripped from the name.
static HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.*?)\s*#\s*(?P<pos>\d+(?:\.\d+)?)$").unwrap());
static BOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<name>.*?),?\s+book\s+(?P<pos>\d+|one|two|three|four|five|six|seven|eight|nine|ten)$",
    )
    .unwrap()
});
static VOLUME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<name>.*?),?\s+vol(?:ume|\.)?\s+(?P<pos>\d+(?:\.\d+)?)$").unwrap()
});
static PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<name>.*?),?\s+part\s+(?P<pos>\d+)$").unwrap());
static PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.*?)\s*\(\s*(?P<pos>\d+(?:\.\d+)?)\s*\)$").unwrap());
static TRAILING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.*?)\s*[,:]\s*(?P<pos>\d+(?:\.\d+)?)$").unwrap());

static NOTATIONS: &[&Lazy<Regex>] = &[
    &HASH_RE, &BOOK_RE, &VOLUME_RE, &PART_RE, &PAREN_RE, &TRAILING_RE,
];

/// Extract `{name, position}` from one free-text series string.
///
/// Notations are tried in priority order (`#N`, `Book N`, `Vol N`, `Part N`,
/// `(N)`, trailing `, N`/`: N`); a string matching none of them is all name
/// and no position.
pub fn parse_series_string(raw: &str) -> SeriesParseResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SeriesParseResult::empty();
    }
    for notation in NOTATIONS {
        if let Some(caps) = notation.captures(trimmed) {
            let name = caps["name"].trim().trim_end_matches([',', ':']).trim_end();
            let Some(position) = parse_position(&caps["pos"]) else {
                continue;
            };
            return SeriesParseResult {
                name: name.to_string(),
                position: Some(position),
            };
        }
    }
    SeriesParseResult {
        name: trimmed.to_string(),
        position: None,
    }
}

fn parse_position(s: &str) -> Option<f64> {
    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }
    let lower = s.to_lowercase();
    WORD_NUMERALS
        .iter()
        .find(|(word, _)| *word == lower)
        .map(|(_, n)| *n)
}

/// Parse a catalog's series field, which arrives as a list of candidate
/// strings. Returns `None` for an empty field; otherwise prefers the first
/// candidate that yields a position, falling back to the first non-empty
/// candidate's result.
pub fn parse_series_from_api(candidates: &[String]) -> Option<SeriesParseResult> {
    let mut first: Option<SeriesParseResult> = None;
    for candidate in candidates {
        if candidate.trim().is_empty() {
            continue;
        }
        let parsed = parse_series_string(candidate);
        if parsed.position.is_some() {
            return Some(parsed);
        }
        if first.is_none() {
            first = Some(parsed);
        }
    }
    first
}

/// Series names get the same comparison canonicalization as any other text.
pub fn normalize_series_name(s: &str) -> String {
    normalize_text(s)
}

/// Whether two series names refer to the same series. Containment counts:
/// "Harry Potter" matches both "The Harry Potter" and "Harry Potter Series".
pub fn series_names_match(a: &str, b: &str) -> bool {
    let a = normalize_series_name(a);
    let b = normalize_series_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Canonical display form: `Name #N`. Position 0 is valid and shown; integral
/// positions print without a fractional part.
pub fn format_series_display(name: &str, position: Option<f64>) -> String {
    if name.is_empty() {
        return String::new();
    }
    match position {
        None => name.to_string(),
        Some(pos) if pos.fract() == 0.0 => format!("{} #{}", name, pos as i64),
        Some(pos) => format!("{} #{}", name, pos),
    }
}
