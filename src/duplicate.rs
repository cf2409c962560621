use serde::{Deserialize, Serialize};

use crate::normalize::normalize_text;

/// The minimal shape of an already-stored record, as supplied by the
/// persistence layer. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingLibraryRecord {
    pub id: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Isbn,
    TitleAuthor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatchResult<'a> {
    pub is_duplicate: bool,
    pub match_type: Option<MatchType>,
    pub existing_book: Option<&'a ExistingLibraryRecord>,
}

impl<'a> DuplicateMatchResult<'a> {
    fn none() -> Self {
        DuplicateMatchResult {
            is_duplicate: false,
            match_type: None,
            existing_book: None,
        }
    }

    fn found(match_type: MatchType, existing_book: &'a ExistingLibraryRecord) -> Self {
        DuplicateMatchResult {
            is_duplicate: true,
            match_type: Some(match_type),
            existing_book: Some(existing_book),
        }
    }
}

/// Decide whether a candidate `(isbn, title, author)` duplicates a stored
/// record.
///
/// An exact ISBN match wins outright, even when title and author disagree
/// completely. Failing that, both title and author must be non-blank, and the
/// first record whose normalized title *and* author both equal the candidate's
/// (case- and diacritic-insensitive) is the match.
pub fn check_for_duplicate<'a>(
    existing: &'a [ExistingLibraryRecord],
    isbn: &str,
    title: &str,
    author: &str,
) -> DuplicateMatchResult<'a> {
    let isbn = isbn.trim();
    if !isbn.is_empty()
        && let Some(record) = existing.iter().find(|r| r.isbn == isbn)
    {
        return DuplicateMatchResult::found(MatchType::Isbn, record);
    }

    if title.trim().is_empty() || author.trim().is_empty() {
        return DuplicateMatchResult::none();
    }

    let query_title = normalize_text(title);
    let query_author = normalize_text(author);
    match existing.iter().find(|r| {
        normalize_text(&r.title) == query_title && normalize_text(&r.author) == query_author
    }) {
        Some(record) => DuplicateMatchResult::found(MatchType::TitleAuthor, record),
        None => DuplicateMatchResult::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, isbn: &str, title: &str, author: &str) -> ExistingLibraryRecord {
        ExistingLibraryRecord {
            id: id.to_string(),
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    fn library() -> Vec<ExistingLibraryRecord> {
        vec![
            record("1", "9780552124751", "The Colour of Magic", "Terry Pratchett"),
            record("2", "", "Cien Años de Soledad", "Gabriel García Márquez"),
            record("3", "9780261103252", "The Fellowship of the Ring", "J. R. R. Tolkien"),
        ]
    }

    #[test]
    fn isbn_match_wins_even_when_title_and_author_differ() {
        let library = library();
        let result =
            check_for_duplicate(&library, "9780552124751", "Totally Different", "Nobody");
        assert!(result.is_duplicate);
        assert_eq!(result.match_type, Some(MatchType::Isbn));
        assert_eq!(result.existing_book.unwrap().id, "1");
    }

    #[test]
    fn title_author_match_is_case_and_diacritic_insensitive() {
        let library = library();
        let result = check_for_duplicate(
            &library,
            "",
            "cien anos de soledad",
            "GABRIEL GARCIA MARQUEZ",
        );
        assert!(result.is_duplicate);
        assert_eq!(result.match_type, Some(MatchType::TitleAuthor));
        assert_eq!(result.existing_book.unwrap().id, "2");
    }

    #[test]
    fn no_isbn_match_falls_through_to_text_matching() {
        let library = library();
        let result = check_for_duplicate(
            &library,
            "9999999999999",
            "The Fellowship of the Ring",
            "J. R. R. Tolkien",
        );
        assert!(result.is_duplicate);
        assert_eq!(result.match_type, Some(MatchType::TitleAuthor));
    }

    #[test]
    fn blank_title_or_author_never_matches() {
        let library = library();
        let result = check_for_duplicate(&library, "", "   ", "Terry Pratchett");
        assert!(!result.is_duplicate);
        let result = check_for_duplicate(&library, "", "The Colour of Magic", "");
        assert!(!result.is_duplicate);
        assert_eq!(result.match_type, None);
        assert_eq!(result.existing_book, None);
    }

    #[test]
    fn both_must_match_not_just_title() {
        let library = library();
        let result =
            check_for_duplicate(&library, "", "The Colour of Magic", "Someone Else");
        assert!(!result.is_duplicate);
    }

    #[test]
    fn first_match_in_input_order_is_returned() {
        let mut library = library();
        library.push(record("4", "", "The Colour of Magic", "Terry Pratchett"));
        library.push(record("5", "", "the colour of magic", "terry pratchett"));
        let result =
            check_for_duplicate(&library, "", "The Colour of Magic", "Terry Pratchett");
        assert_eq!(result.existing_book.unwrap().id, "1");
    }

    #[test]
    fn empty_library_never_matches() {
        let result = check_for_duplicate(&[], "9780552124751", "Mort", "Terry Pratchett");
        assert!(!result.is_duplicate);
    }
}
