use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use shelf::duplicate::{self, ExistingLibraryRecord, MatchType};
use shelf::merge::{GenreSuggestions, MergedBookDraft, Resolver, SearchOptions};
use shelf::remediate::{self, FieldPatch, LibraryBook, RecordStore};
use shelf::series::format_series_display;

mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    match args.command {
        cli::Command::Lookup { isbn, json } => lookup(&isbn, json),
        cli::Command::Search {
            query,
            start,
            limit,
        } => search(&query, start, limit),
        cli::Command::Check {
            library,
            isbn,
            title,
            author,
        } => check(&library, &isbn, &title, &author),
        cli::Command::Fix { library, delay_ms } => fix(&library, delay_ms),
    }
}

fn lookup(isbn: &str, json: bool) -> anyhow::Result<()> {
    let resolver = Resolver::new();
    let mut session = GenreSuggestions::new();
    match resolver.lookup_isbn(isbn, &mut session)? {
        Some(draft) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&draft)?);
            } else {
                print_draft(&draft);
            }
            summary(1, 0);
        }
        None => {
            eprintln!("{isbn}: not found in either catalog; enter the record manually");
            summary(0, 1);
        }
    }
    Ok(())
}

fn print_draft(draft: &MergedBookDraft) {
    print_field("Title", &draft.title);
    print_field("Author", &draft.author);
    print_field("ISBN", &draft.isbn);
    print_field("Publisher", &draft.publisher);
    print_field("Published", &draft.published_date);
    print_field("Format", &draft.physical_format);
    if let Some(pages) = draft.page_count {
        print_field("Pages", &pages.to_string());
    }
    print_field("Cover", &draft.cover_image_url);
    print_field("Genres", &draft.genre_suggestions.join(", "));
    if let Some(series) = &draft.series_suggestion {
        print_field("Series", &format_series_display(&series.name, series.position));
    }
    if let Some(source) = draft.source {
        print_field("Source", source.as_str());
    }
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{:<10} {}", format!("{label}:"), value);
    }
}

fn search(query: &str, start: usize, limit: usize) -> anyhow::Result<()> {
    let resolver = Resolver::new();
    let page = resolver.search_books(
        query,
        SearchOptions {
            start_index: start,
            page_size: limit,
        },
    )?;
    for (index, hit) in page.books.iter().enumerate() {
        let mut line = format!("{:>3}. {}", start + index + 1, hit.title);
        if !hit.author.is_empty() {
            line.push_str(&format!(" — {}", hit.author));
        }
        if !hit.published_date.is_empty() {
            line.push_str(&format!(" ({})", hit.published_date));
        }
        if !hit.isbn.is_empty() {
            line.push_str(&format!(" [{}]", hit.isbn));
        }
        println!("{line}");
    }
    if page.books.is_empty() {
        eprintln!("no results for {query:?}");
    } else if page.has_more {
        eprintln!(
            "{} of {} results; continue with --start {}",
            page.books.len(),
            page.total_items,
            start + page.books.len()
        );
    }
    Ok(())
}

fn check(library: &Path, isbn: &str, title: &str, author: &str) -> anyhow::Result<()> {
    let existing: Vec<ExistingLibraryRecord> = read_library(library)?;
    let result = duplicate::check_for_duplicate(&existing, isbn, title, author);
    match (result.match_type, result.existing_book) {
        (Some(match_type), Some(book)) => {
            let kind = match match_type {
                MatchType::Isbn => "isbn",
                MatchType::TitleAuthor => "title-author",
            };
            println!(
                "duplicate ({kind} match): {} by {} [id {}]",
                book.title, book.author, book.id
            );
        }
        _ => println!("no duplicate found"),
    }
    Ok(())
}

/// Records patches as they are accepted; the library file itself is rewritten
/// once at the end of the batch.
#[derive(Default)]
struct PatchLog {
    updates: Vec<(String, FieldPatch)>,
}

impl RecordStore for PatchLog {
    fn update_record(&mut self, id: &str, patch: &FieldPatch) -> anyhow::Result<()> {
        self.updates.push((id.to_string(), patch.clone()));
        Ok(())
    }
}

fn fix(library: &Path, delay_ms: u64) -> anyhow::Result<()> {
    let mut records: Vec<LibraryBook> = read_library(library)?;
    let resolver = Resolver::new();
    let mut store = PatchLog::default();
    let delay = (delay_ms > 0).then(|| Duration::from_millis(delay_ms));

    let bar = ProgressBar::new(records.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let outcome = remediate::fix_books_from_api(
        &resolver,
        &mut records,
        &mut store,
        |current, _total, record| {
            bar.set_position(current as u64);
            bar.set_message(record.title.clone());
        },
        delay,
    );
    bar.finish_and_clear();

    let serialized = serde_json::to_string_pretty(&records)?;
    fs::write(library, serialized)
        .with_context(|| format!("writing library file {}", library.display()))?;

    for fixed in &outcome.fixed {
        eprintln!("fixed {} ({})", fixed.title, fixed.fields.join(", "));
    }
    for issue in outcome.skipped.iter().chain(&outcome.errors) {
        eprintln!("{}: {}", issue.title, issue.reason);
    }
    eprintln!(
        "{} fields filled across {} records; {} skipped",
        outcome.fields_fixed_count,
        outcome.fixed.len(),
        outcome.skipped.len()
    );
    summary(outcome.fixed.len(), outcome.skipped.len() + outcome.errors.len());
    Ok(())
}

fn read_library<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading library file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing library file {}", path.display()))
}

fn summary(ok: usize, failed: usize) {
    eprintln!("{} {}  {} {}", "✓".green(), ok, "✗".red(), failed);
}
