use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look one ISBN up across both catalogs and print the merged record
    Lookup {
        #[arg(value_name = "ISBN")]
        isbn: String,
        /// Print the merged draft as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Full-text search, primary catalog with secondary fallback
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
        /// Zero-based result offset for continuation
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Results per page
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Check a candidate book against a JSON library file for duplicates
    Check {
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,
        #[arg(long, default_value = "")]
        isbn: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        author: String,
    },
    /// Backfill missing fields in a JSON library file from the catalogs
    Fix {
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,
        /// Politeness delay between records, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
}
