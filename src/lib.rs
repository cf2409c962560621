//! Metadata resolution pipeline for a personal book library: canonicalizes
//! free text from external bibliographic catalogs, merges two sources into one
//! draft record, detects duplicates, and backfills incomplete records.

pub mod catalog;
pub mod duplicate;
pub mod genre;
pub mod merge;
pub mod normalize;
pub mod remediate;
pub mod series;
