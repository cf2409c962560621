use std::fmt;
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub mod google_books;
pub mod open_library;

pub use google_books::GoogleBooks;
pub use open_library::OpenLibrary;

/// Identifies one of the two external catalogs.
///
/// NOTE: Ordering is important here, as it signifies merge priority. The
/// derived `Ord` and [`SourceId::PRIORITY`] both put the primary catalog
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceId {
    GoogleBooks,
    OpenLibrary,
}

impl SourceId {
    /// Fixed source-priority order used by the merge reducer and cover scan.
    pub const PRIORITY: [SourceId; 2] = [SourceId::GoogleBooks, SourceId::OpenLibrary];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::GoogleBooks => "google-books",
            SourceId::OpenLibrary => "open-library",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog's answer for one ISBN, as returned. Ephemeral; nothing here is
/// normalized or persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCatalogRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub physical_format: Option<String>,
    pub page_count: Option<u32>,
    /// Composite category strings, still in the catalog's hierarchy notation.
    pub category_hints: Vec<String>,
    /// Candidate series strings, still in free-text notation.
    pub series_hints: Vec<String>,
}

/// One row of a full-text search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub cover_url: String,
    pub publisher: String,
    pub published_date: String,
}

/// One page of search results with an offset-style continuation signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub books: Vec<SearchHit>,
    pub has_more: bool,
    pub total_items: u64,
}

/// The seam between the merge engine and an external bibliographic source.
pub trait Catalog {
    fn id(&self) -> SourceId;

    /// Look one ISBN up. `Ok(None)` means the catalog has no record for it;
    /// transport and parse failures are `Err` and are isolated by the caller.
    fn lookup_isbn(&self, isbn: &str) -> anyhow::Result<Option<RawCatalogRecord>>;

    /// Paginated full-text search.
    fn search(&self, query: &str, start_index: usize, page_size: usize)
    -> anyhow::Result<SearchPage>;
}

/// Strip hyphens/spaces from a raw ISBN and validate its shape: 13 digits, or
/// 10 characters of digits with an optional trailing check `X`. No checksum
/// verification; the catalogs are the authority on existence.
pub fn clean_isbn(raw: &str) -> anyhow::Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_uppercase();
    let valid = cleaned.is_ascii()
        && match cleaned.len() {
            13 => cleaned.chars().all(|c| c.is_ascii_digit()),
            10 => {
                cleaned[..9].chars().all(|c| c.is_ascii_digit())
                    && cleaned[9..].chars().all(|c| c.is_ascii_digit() || c == 'X')
            }
            _ => false,
        };
    if !valid {
        return Err(anyhow!("invalid ISBN: {raw:?}"));
    }
    Ok(cleaned)
}

/// Characters percent-encoded inside a query parameter value.
pub(crate) const QUERY_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'&')
    .add(b'+')
    .add(b'=');

const USER_AGENT: &str = "shelf/0.1 (personal book-library manager)";

fn agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(5)))
        .timeout_global(Some(Duration::from_secs(15)))
        .build();
    ureq::Agent::new_with_config(config)
}

/// GET a JSON document. `Ok(None)` on HTTP 404, which both catalogs use for
/// "no such record".
pub(crate) fn get_json(url: &Url) -> anyhow::Result<Option<Value>> {
    let mut response = match agent()
        .get(url.as_str())
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT)
        .call()
    {
        Ok(response) => response,
        Err(ureq::Error::StatusCode(404)) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("request to {url} failed")),
    };
    let body = response.body_mut().read_to_string()?;
    let json = serde_json::from_str(&body).with_context(|| format!("invalid JSON from {url}"))?;
    Ok(Some(json))
}

/// Non-empty string field helper for `serde_json::Value` extraction.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Collect non-empty strings out of a JSON array field.
pub(crate) fn str_array(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
