use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::normalize_genre_name;

/// Known genre spelling/abbreviation variants, keyed by their normalized
/// (lower-case, whitespace-collapsed) form. Built once at startup and never
/// mutated. Terms absent from this table pass through as given; subgenres
/// like "urban fantasy" or "cozy mystery" are intentionally left alone.
static GENRE_VARIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Abbreviations and respellings.
        ("sci-fi", "Science Fiction"),
        ("scifi", "Science Fiction"),
        ("sf", "Science Fiction"),
        ("ya", "Young Adult"),
        ("nonfiction", "Non-Fiction"),
        ("non fiction", "Non-Fiction"),
        ("non-fiction", "Non-Fiction"),
        ("humor", "Humour"),
        ("whodunit", "Mystery"),
        ("whodunnit", "Mystery"),
        ("general fiction", "Fiction"),
        // Audience synonyms.
        ("juvenile", "Children"),
        ("juvenile fiction", "Children"),
        ("children's", "Children"),
        ("childrens", "Children"),
        ("children's books", "Children"),
        ("teen", "Young Adult"),
        ("teens", "Young Adult"),
        ("adolescent", "Young Adult"),
        // Canonical casing for the common top-level genres, so catalog terms
        // in any case dedupe to one display form.
        ("fiction", "Fiction"),
        ("science fiction", "Science Fiction"),
        ("fantasy", "Fantasy"),
        ("mystery", "Mystery"),
        ("thriller", "Thriller"),
        ("romance", "Romance"),
        ("horror", "Horror"),
        ("children", "Children"),
        ("young adult", "Young Adult"),
        ("biography", "Biography"),
        ("autobiography", "Autobiography"),
        ("history", "History"),
        ("poetry", "Poetry"),
        ("crime", "Crime"),
        ("adventure", "Adventure"),
        ("classics", "Classics"),
        ("classic", "Classics"),
    ])
});

/// Low-information filler terms that carry no genre signal; canonicalizing one
/// of these yields the empty string, which callers treat as "drop this term".
const DROP_TERMS: &[&str] = &["general", "accessible", "readable"];

/// Map a single genre term to its canonical display form.
///
/// Lookup is case-insensitive and exact (no substring matching). Unknown terms
/// come back trimmed but otherwise untouched, original casing included; the
/// British "humour" is one such term and stays as written.
pub fn normalize_genre_variation(term: &str) -> String {
    let trimmed = term.trim();
    let key = normalize_genre_name(trimmed);
    if DROP_TERMS.contains(&key.as_str()) {
        return String::new();
    }
    match GENRE_VARIATIONS.get(key.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => trimmed.to_string(),
    }
}

/// Split composite catalog category strings into a deduplicated list of
/// canonical genre names. The result has no empty or duplicate entries; order
/// carries no meaning to callers beyond being stable.
pub fn parse_hierarchical_genres<'a, I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    // "/" and ">" and the typographic dashes split wherever they appear; a
    // plain hyphen only splits when spaced on both sides, otherwise "Sci-Fi"
    // and "Non-Fiction" would shatter.
    static DELIMITER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*/\s*|\s*>\s*|\s*\u{2014}\s*|\s*\u{2013}\s*|\s+-\s+").unwrap());

    let mut out: Vec<String> = Vec::new();
    for category in categories {
        if category.trim().is_empty() {
            continue;
        }
        for piece in DELIMITER_RE.split(category) {
            for segment in split_comma_lowercase(piece) {
                let segment = segment.trim();
                if segment.is_empty() {
                    continue;
                }
                let canonical = normalize_genre_variation(segment);
                if canonical.is_empty() {
                    continue;
                }
                if !out.iter().any(|g| *g == canonical) {
                    out.push(canonical);
                }
            }
        }
    }
    out
}

/// Split on a comma only when the next word starts lower-case, the Open
/// Library hierarchy style ("Fiction, humorous"). "Austen, Jane" stays whole.
/// Hand-rolled because the regex crate has no lookahead.
fn split_comma_lowercase(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c != ',' {
            continue;
        }
        let rest = s[i + 1..].trim_start();
        if rest.chars().next().is_some_and(|c| c.is_lowercase()) {
            parts.push(&s[start..i]);
            start = i + 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn canonicalizes_known_variants() {
        assert_eq!(normalize_genre_variation("sci-fi"), "Science Fiction");
        assert_eq!(normalize_genre_variation("SciFi"), "Science Fiction");
        assert_eq!(normalize_genre_variation("SF"), "Science Fiction");
        assert_eq!(normalize_genre_variation("ya"), "Young Adult");
        assert_eq!(normalize_genre_variation("nonfiction"), "Non-Fiction");
        assert_eq!(normalize_genre_variation("non fiction"), "Non-Fiction");
        assert_eq!(normalize_genre_variation("humor"), "Humour");
        assert_eq!(normalize_genre_variation("whodunnit"), "Mystery");
        assert_eq!(normalize_genre_variation("juvenile fiction"), "Children");
        assert_eq!(normalize_genre_variation("general fiction"), "Fiction");
    }

    #[test]
    fn british_humour_left_unchanged() {
        assert_eq!(normalize_genre_variation("humour"), "humour");
        assert_eq!(normalize_genre_variation("Humour"), "Humour");
    }

    #[test]
    fn drop_terms_map_to_empty() {
        assert_eq!(normalize_genre_variation("general"), "");
        assert_eq!(normalize_genre_variation("General"), "");
        assert_eq!(normalize_genre_variation("ACCESSIBLE"), "");
        assert_eq!(normalize_genre_variation("readable"), "");
    }

    #[test]
    fn unknown_terms_pass_through_with_casing() {
        assert_eq!(normalize_genre_variation(" Urban Fantasy "), "Urban Fantasy");
        assert_eq!(normalize_genre_variation("cozy mystery"), "cozy mystery");
    }

    #[test]
    fn lookup_is_exact_not_substring() {
        // "sf" is a variant but "sfx" is not.
        assert_eq!(normalize_genre_variation("sfx"), "sfx");
    }

    #[test]
    fn splits_slash_hierarchy() {
        let genres = parse_hierarchical_genres(["Fiction / Science Fiction / Space Opera"]);
        assert_eq!(
            sorted(genres),
            vec!["Fiction", "Science Fiction", "Space Opera"]
        );
    }

    #[test]
    fn dedupes_after_canonicalization() {
        let genres = parse_hierarchical_genres(["fiction", "Fiction"]);
        assert_eq!(genres, vec!["Fiction"]);
    }

    #[test]
    fn drops_low_information_segments() {
        let genres = parse_hierarchical_genres(["Fiction / General"]);
        assert_eq!(genres, vec!["Fiction"]);
    }

    #[test]
    fn splits_open_library_comma_style() {
        let genres = parse_hierarchical_genres(["Fiction, humorous"]);
        assert_eq!(sorted(genres), vec!["Fiction", "humorous"]);
    }

    #[test]
    fn comma_before_uppercase_does_not_split() {
        let genres = parse_hierarchical_genres(["Detection, Thrillers"]);
        assert_eq!(genres, vec!["Detection, Thrillers"]);
    }

    #[test]
    fn spaced_hyphen_splits_but_inner_hyphen_does_not() {
        let genres = parse_hierarchical_genres(["Fiction - Sci-Fi"]);
        assert_eq!(sorted(genres), vec!["Fiction", "Science Fiction"]);
    }

    #[test]
    fn splits_angle_and_dash_hierarchies() {
        let genres = parse_hierarchical_genres(["Fiction > Thriller", "History \u{2014} Ancient"]);
        assert_eq!(sorted(genres), vec!["Ancient", "Fiction", "History", "Thriller"]);
    }

    #[test]
    fn ignores_empty_entries() {
        let genres = parse_hierarchical_genres(["", "   ", "Fantasy"]);
        assert_eq!(genres, vec!["Fantasy"]);
    }
}
