use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::merge::{GenreSuggestions, MergedBookDraft, Resolver};

/// A stored library record as read for remediation. Empty strings mean the
/// field was never filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryBook {
    pub id: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub physical_format: String,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub cover_image_url: String,
}

/// Injected persistence collaborator: receives one partial update per fixed
/// record.
pub trait RecordStore {
    fn update_record(&mut self, id: &str, patch: &FieldPatch) -> anyhow::Result<()>;
}

/// The missing fields a lookup was able to fill for one record. Only fields
/// that were empty on the record and non-empty in the draft appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub physical_format: Option<String>,
    pub page_count: Option<u32>,
    pub cover_image_url: Option<String>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.author.is_some() {
            names.push("author");
        }
        if self.publisher.is_some() {
            names.push("publisher");
        }
        if self.published_date.is_some() {
            names.push("published_date");
        }
        if self.physical_format.is_some() {
            names.push("physical_format");
        }
        if self.page_count.is_some() {
            names.push("page_count");
        }
        if self.cover_image_url.is_some() {
            names.push("cover_image_url");
        }
        names
    }

    pub fn apply(&self, book: &mut LibraryBook) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(publisher) = &self.publisher {
            book.publisher = publisher.clone();
        }
        if let Some(date) = &self.published_date {
            book.published_date = date.clone();
        }
        if let Some(format) = &self.physical_format {
            book.physical_format = format.clone();
        }
        if let Some(pages) = self.page_count {
            book.page_count = Some(pages);
        }
        if let Some(cover) = &self.cover_image_url {
            book.cover_image_url = cover.clone();
        }
    }
}

/// One successfully backfilled record and the fields it gained.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedRecord {
    pub id: String,
    pub title: String,
    pub fields: Vec<&'static str>,
}

/// A record that was skipped or failed, with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIssue {
    pub id: String,
    pub title: String,
    pub reason: String,
}

/// Aggregate outcome of one remediation batch. All three buckets are reported
/// together; one record's failure never aborts the rest.
#[derive(Debug, Default)]
pub struct FixOutcome {
    pub fixed: Vec<FixedRecord>,
    pub skipped: Vec<RecordIssue>,
    pub errors: Vec<RecordIssue>,
    pub fields_fixed_count: usize,
}

/// Backfill missing fields across `records` from the catalogs, sequentially.
///
/// `delay` is a politeness throttle between records, toward the external
/// catalogs; processing is deliberately not parallel. `on_progress` fires once
/// per record regardless of outcome. Patches that apply are also pushed to
/// `store` via [`RecordStore::update_record`]; a store failure lands in the
/// `errors` bucket like any other per-record failure.
pub fn fix_books_from_api(
    resolver: &Resolver,
    records: &mut [LibraryBook],
    store: &mut dyn RecordStore,
    mut on_progress: impl FnMut(usize, usize, &LibraryBook),
    delay: Option<Duration>,
) -> FixOutcome {
    let mut outcome = FixOutcome::default();
    let total = records.len();

    for (index, book) in records.iter_mut().enumerate() {
        on_progress(index + 1, total, book);
        if index > 0 && let Some(delay) = delay {
            thread::sleep(delay);
        }

        if book.isbn.trim().is_empty() {
            outcome.skipped.push(issue(book, "No ISBN"));
            continue;
        }

        // Each record gets its own throwaway session; remediation never feeds
        // the interactive genre accumulator.
        let mut session = GenreSuggestions::new();
        match resolver.lookup_isbn(&book.isbn, &mut session) {
            Ok(Some(draft)) => {
                let patch = missing_fields(book, &draft);
                if patch.is_empty() {
                    outcome.errors.push(issue(book, "No new data available"));
                    continue;
                }
                match store.update_record(&book.id, &patch) {
                    Ok(()) => {
                        patch.apply(book);
                        let fields = patch.field_names();
                        outcome.fields_fixed_count += fields.len();
                        outcome.fixed.push(FixedRecord {
                            id: book.id.clone(),
                            title: book.title.clone(),
                            fields,
                        });
                    }
                    Err(e) => {
                        outcome.errors.push(issue(book, &format!("store update failed: {e:#}")));
                    }
                }
            }
            Ok(None) => outcome.errors.push(issue(book, "No data available from APIs")),
            Err(e) => outcome.errors.push(issue(book, &format!("{e:#}"))),
        }
    }

    outcome
}

/// Fields empty on the record and non-empty in the merged draft.
fn missing_fields(book: &LibraryBook, draft: &MergedBookDraft) -> FieldPatch {
    FieldPatch {
        title: fillable(&book.title, &draft.title),
        author: fillable(&book.author, &draft.author),
        publisher: fillable(&book.publisher, &draft.publisher),
        published_date: fillable(&book.published_date, &draft.published_date),
        physical_format: fillable(&book.physical_format, &draft.physical_format),
        page_count: (book.page_count.unwrap_or(0) == 0)
            .then_some(draft.page_count)
            .flatten()
            .filter(|n| *n > 0),
        cover_image_url: fillable(&book.cover_image_url, &draft.cover_image_url),
    }
}

fn fillable(current: &str, candidate: &str) -> Option<String> {
    (current.trim().is_empty() && !candidate.is_empty()).then(|| candidate.to_string())
}

fn issue(book: &LibraryBook, reason: &str) -> RecordIssue {
    RecordIssue {
        id: book.id.clone(),
        title: book.title.clone(),
        reason: reason.to_string(),
    }
}
