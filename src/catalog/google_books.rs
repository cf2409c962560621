use anyhow::Context;
use percent_encoding::utf8_percent_encode;
use serde_json::Value;
use url::Url;

use crate::catalog::{
    Catalog, QUERY_ENCODE_SET, RawCatalogRecord, SearchHit, SearchPage, SourceId, get_json,
    str_array, str_field,
};

const VOLUMES_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";

/// Primary catalog: the Google Books volumes API.
pub struct GoogleBooks;

impl Catalog for GoogleBooks {
    fn id(&self) -> SourceId {
        SourceId::GoogleBooks
    }

    fn lookup_isbn(&self, isbn: &str) -> anyhow::Result<Option<RawCatalogRecord>> {
        let url = Url::parse(&format!("{VOLUMES_ENDPOINT}?q=isbn:{isbn}&maxResults=1"))
            .context("building Google Books lookup URL")?;
        let Some(json) = get_json(&url)? else {
            return Ok(None);
        };
        let Some(info) = json["items"].get(0).map(|item| &item["volumeInfo"]) else {
            return Ok(None);
        };
        Ok(Some(volume_record(info)))
    }

    fn search(
        &self,
        query: &str,
        start_index: usize,
        page_size: usize,
    ) -> anyhow::Result<SearchPage> {
        let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET);
        let url = Url::parse(&format!(
            "{VOLUMES_ENDPOINT}?q={encoded}&startIndex={start_index}&maxResults={page_size}"
        ))
        .context("building Google Books search URL")?;
        let Some(json) = get_json(&url)? else {
            return Ok(SearchPage::default());
        };
        let total_items = json["totalItems"].as_u64().unwrap_or(0);
        let books: Vec<SearchHit> = json["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| search_hit(&item["volumeInfo"]))
                    .collect()
            })
            .unwrap_or_default();
        let has_more = (start_index as u64 + books.len() as u64) < total_items;
        Ok(SearchPage {
            books,
            has_more,
            total_items,
        })
    }
}

fn volume_record(info: &Value) -> RawCatalogRecord {
    RawCatalogRecord {
        title: str_field(info, "title"),
        author: authors(info),
        cover_url: cover_url(info),
        publisher: str_field(info, "publisher"),
        published_date: str_field(info, "publishedDate"),
        // The volumes API does not expose a binding/format field.
        physical_format: None,
        page_count: info["pageCount"].as_u64().map(|n| n as u32),
        category_hints: str_array(info, "categories"),
        series_hints: Vec::new(),
    }
}

fn search_hit(info: &Value) -> SearchHit {
    SearchHit {
        title: str_field(info, "title").unwrap_or_default(),
        author: authors(info).unwrap_or_default(),
        isbn: isbn_13_or_10(info).unwrap_or_default(),
        cover_url: cover_url(info).unwrap_or_default(),
        publisher: str_field(info, "publisher").unwrap_or_default(),
        published_date: str_field(info, "publishedDate").unwrap_or_default(),
    }
}

fn authors(info: &Value) -> Option<String> {
    let joined = str_array(info, "authors").join(", ");
    (!joined.is_empty()).then_some(joined)
}

fn cover_url(info: &Value) -> Option<String> {
    let links = &info["imageLinks"];
    str_field(links, "thumbnail").or_else(|| str_field(links, "smallThumbnail"))
}

/// Prefer ISBN-13 over ISBN-10 from the industry identifier list.
fn isbn_13_or_10(info: &Value) -> Option<String> {
    let identifiers = info["industryIdentifiers"].as_array()?;
    for wanted in ["ISBN_13", "ISBN_10"] {
        for identifier in identifiers {
            if identifier["type"].as_str() == Some(wanted)
                && let Some(value) = str_field(identifier, "identifier")
            {
                return Some(value);
            }
        }
    }
    None
}
