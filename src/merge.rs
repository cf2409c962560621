use std::collections::BTreeMap;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::catalog::{
    Catalog, GoogleBooks, OpenLibrary, RawCatalogRecord, SearchPage, SourceId, clean_isbn,
};
use crate::genre::parse_hierarchical_genres;
use crate::normalize::{
    normalize_author, normalize_published_date, normalize_publisher, normalize_title,
};
use crate::series::{SeriesParseResult, parse_series_from_api};

/// Canonical in-memory candidate record assembled from both catalogs. String
/// fields use `""` for "absent"; `cover_image_url` is always derived from
/// `covers` in source-priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedBookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub published_date: String,
    pub physical_format: String,
    pub page_count: Option<u32>,
    pub covers: BTreeMap<SourceId, String>,
    pub cover_image_url: String,
    pub genre_suggestions: Vec<String>,
    pub series_suggestion: Option<SeriesParseResult>,
    /// The catalog that primarily satisfied this draft.
    pub source: Option<SourceId>,
}

/// Ordered, deduplicating genre accumulator owned by one editing session.
/// Lookups only ever append; entries leave only through [`remove`], driven by
/// an explicit user accept/reject in the UI.
///
/// [`remove`]: GenreSuggestions::remove
#[derive(Debug, Clone, Default)]
pub struct GenreSuggestions {
    items: Vec<String>,
}

impl GenreSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, genre: &str) {
        if genre.is_empty() {
            return;
        }
        if !self.items.iter().any(|g| g == genre) {
            self.items.push(genre.to_string());
        }
    }

    pub fn remove(&mut self, genre: &str) {
        self.items.retain(|g| g != genre);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pagination cursor for [`Resolver::search_books`].
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub start_index: usize,
    pub page_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            start_index: 0,
            page_size: 20,
        }
    }
}

/// The multi-source metadata merge engine: one primary and one secondary
/// catalog queried independently, combined by a fixed-priority,
/// supplement-only merge.
pub struct Resolver {
    primary: Box<dyn Catalog>,
    secondary: Box<dyn Catalog>,
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::with_catalogs(Box::new(GoogleBooks), Box::new(OpenLibrary))
    }

    pub fn with_catalogs(primary: Box<dyn Catalog>, secondary: Box<dyn Catalog>) -> Self {
        Resolver { primary, secondary }
    }

    /// Look one ISBN up in both catalogs and merge the answers.
    ///
    /// A failure in either catalog is logged and treated as that catalog
    /// returning nothing; it never suppresses the other source. `Ok(None)`
    /// means neither catalog knew the ISBN, a normal outcome rather than an
    /// error.
    /// Genre hints accumulate into `suggestions` across repeated lookups in
    /// the same session.
    pub fn lookup_isbn(
        &self,
        isbn: &str,
        suggestions: &mut GenreSuggestions,
    ) -> anyhow::Result<Option<MergedBookDraft>> {
        let isbn = clean_isbn(isbn)?;

        // Gather both answers into priority-ordered slots first, then run one
        // deterministic reducer over them. Scheduling of the two fetches can
        // never change the merge result.
        let slots: Vec<(SourceId, RawCatalogRecord)> = [&self.primary, &self.secondary]
            .into_iter()
            .filter_map(|catalog| match catalog.lookup_isbn(&isbn) {
                Ok(Some(record)) => Some((catalog.id(), record)),
                Ok(None) => {
                    log::debug!("{}: no record for ISBN {isbn}", catalog.id());
                    None
                }
                Err(e) => {
                    log::warn!("{}: lookup failed for ISBN {isbn}: {e:#}", catalog.id());
                    None
                }
            })
            .collect();

        Ok(merge_records(&isbn, &slots, suggestions))
    }

    /// Paginated full-text search: primary catalog first, and on error or an
    /// empty page the same query is retried against the secondary (plain
    /// fallback, not a merge).
    pub fn search_books(&self, query: &str, options: SearchOptions) -> anyhow::Result<SearchPage> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Err(anyhow!("search query too short: need at least 2 characters"));
        }

        match self
            .primary
            .search(query, options.start_index, options.page_size)
        {
            Ok(page) if !page.books.is_empty() => return Ok(page),
            Ok(_) => log::debug!("{}: no hits for {query:?}", self.primary.id()),
            Err(e) => log::warn!("{}: search failed for {query:?}: {e:#}", self.primary.id()),
        }

        self.secondary
            .search(query, options.start_index, options.page_size)
    }
}

/// The supplement-only reducer. `slots` must already be in source-priority
/// order; a field populated by an earlier slot is never overwritten by a later
/// one. Cover URLs are the exception: every slot's cover is retained in the
/// `covers` map, and the flat URL is re-derived from priority order.
pub fn merge_records(
    isbn: &str,
    slots: &[(SourceId, RawCatalogRecord)],
    suggestions: &mut GenreSuggestions,
) -> Option<MergedBookDraft> {
    let (first_source, _) = slots.first()?;

    let mut draft = MergedBookDraft {
        isbn: isbn.to_string(),
        source: Some(*first_source),
        ..MergedBookDraft::default()
    };

    let mut series_candidates: Vec<String> = Vec::new();
    for (source, record) in slots {
        fill(&mut draft.title, record.title.as_deref(), normalize_title);
        fill(&mut draft.author, record.author.as_deref(), normalize_author);
        fill(&mut draft.publisher, record.publisher.as_deref(), normalize_publisher);
        fill(
            &mut draft.published_date,
            record.published_date.as_deref(),
            normalize_published_date,
        );
        fill(&mut draft.physical_format, record.physical_format.as_deref(), |s| {
            s.trim().to_string()
        });
        if draft.page_count.is_none() {
            draft.page_count = record.page_count.filter(|n| *n > 0);
        }
        if let Some(url) = record.cover_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            draft.covers.entry(*source).or_insert_with(|| url.to_string());
        }
        for genre in parse_hierarchical_genres(record.category_hints.iter().map(String::as_str)) {
            suggestions.add(&genre);
        }
        series_candidates.extend(record.series_hints.iter().cloned());
    }

    draft.cover_image_url = first_cover(&draft.covers);
    draft.genre_suggestions = suggestions.as_slice().to_vec();
    draft.series_suggestion = parse_series_from_api(&series_candidates);
    Some(draft)
}

/// First non-empty cover URL scanned in fixed source-priority order.
pub fn first_cover(covers: &BTreeMap<SourceId, String>) -> String {
    SourceId::PRIORITY
        .iter()
        .find_map(|source| covers.get(source))
        .cloned()
        .unwrap_or_default()
}

fn fill(slot: &mut String, value: Option<&str>, normalize: impl Fn(&str) -> String) {
    if !slot.is_empty() {
        return;
    }
    if let Some(value) = value {
        let normalized = normalize(value);
        if !normalized.is_empty() {
            *slot = normalized;
        }
    }
}
