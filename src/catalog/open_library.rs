use anyhow::Context;
use percent_encoding::utf8_percent_encode;
use serde_json::Value;
use url::Url;

use crate::catalog::{
    Catalog, QUERY_ENCODE_SET, RawCatalogRecord, SearchHit, SearchPage, SourceId, get_json,
    str_array, str_field,
};

const EDITION_ENDPOINT: &str = "https://openlibrary.org/isbn";
const SEARCH_ENDPOINT: &str = "https://openlibrary.org/search.json";
const COVER_ENDPOINT: &str = "https://covers.openlibrary.org/b/id";

/// Secondary catalog: the Open Library edition and search APIs.
pub struct OpenLibrary;

impl Catalog for OpenLibrary {
    fn id(&self) -> SourceId {
        SourceId::OpenLibrary
    }

    fn lookup_isbn(&self, isbn: &str) -> anyhow::Result<Option<RawCatalogRecord>> {
        let url = Url::parse(&format!("{EDITION_ENDPOINT}/{isbn}.json"))
            .context("building Open Library edition URL")?;
        let Some(json) = get_json(&url)? else {
            return Ok(None);
        };
        Ok(Some(edition_record(&json)))
    }

    fn search(
        &self,
        query: &str,
        start_index: usize,
        page_size: usize,
    ) -> anyhow::Result<SearchPage> {
        let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET);
        let url = Url::parse(&format!(
            "{SEARCH_ENDPOINT}?q={encoded}&offset={start_index}&limit={page_size}"
        ))
        .context("building Open Library search URL")?;
        let Some(json) = get_json(&url)? else {
            return Ok(SearchPage::default());
        };
        let total_items = json["numFound"].as_u64().unwrap_or(0);
        let books: Vec<SearchHit> = json["docs"]
            .as_array()
            .map(|docs| docs.iter().map(search_hit).collect())
            .unwrap_or_default();
        let has_more = (start_index as u64 + books.len() as u64) < total_items;
        Ok(SearchPage {
            books,
            has_more,
            total_items,
        })
    }
}

fn edition_record(edition: &Value) -> RawCatalogRecord {
    // Edition subjects may be plain strings or {name} objects depending on the
    // record's age.
    let mut category_hints = str_array(edition, "genres");
    category_hints.extend(name_or_str_array(edition, "subjects"));

    RawCatalogRecord {
        title: str_field(edition, "title"),
        author: by_statement_author(edition),
        cover_url: first_cover_id(edition).map(|id| format!("{COVER_ENDPOINT}/{id}-M.jpg")),
        publisher: str_array(edition, "publishers").into_iter().next(),
        published_date: str_field(edition, "publish_date"),
        physical_format: str_field(edition, "physical_format"),
        page_count: edition["number_of_pages"].as_u64().map(|n| n as u32),
        category_hints,
        series_hints: str_array(edition, "series"),
    }
}

/// The edition endpoint only carries author keys, not names; the
/// `by_statement` field is the one human-readable attribution it has.
fn by_statement_author(edition: &Value) -> Option<String> {
    let statement = str_field(edition, "by_statement")?;
    let trimmed = statement
        .strip_prefix("by ")
        .or_else(|| statement.strip_prefix("By "))
        .unwrap_or(&statement)
        .trim_end_matches(['.', ','])
        .trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn first_cover_id(edition: &Value) -> Option<i64> {
    edition["covers"]
        .as_array()?
        .iter()
        .filter_map(|id| id.as_i64())
        .find(|id| *id > 0)
}

fn name_or_str_array(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().or_else(|| item["name"].as_str()))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn search_hit(doc: &Value) -> SearchHit {
    SearchHit {
        title: str_field(doc, "title").unwrap_or_default(),
        author: str_array(doc, "author_name").into_iter().next().unwrap_or_default(),
        isbn: str_array(doc, "isbn").into_iter().next().unwrap_or_default(),
        cover_url: doc["cover_i"]
            .as_i64()
            .filter(|id| *id > 0)
            .map(|id| format!("{COVER_ENDPOINT}/{id}-M.jpg"))
            .unwrap_or_default(),
        publisher: str_array(doc, "publisher").into_iter().next().unwrap_or_default(),
        published_date: doc["first_publish_year"]
            .as_i64()
            .map(|year| year.to_string())
            .unwrap_or_default(),
    }
}
