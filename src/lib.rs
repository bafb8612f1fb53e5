//! # pathfinder - fuzzy file-path search
//!
//! pathfinder indexes every file path under a set of root directories and
//! answers short fuzzy queries like `budget_rep` or `report/finance` with a
//! ranked list of paths.
//!
//! ## Architecture
//!
//! - [`store`] - append-only path log that gives every path a stable id
//! - [`index`] - trigram index over basenames, its merge and persistence
//! - [`query`] - candidate selection, weighted edit distance and ranking
//! - [`engine`] - root set, rebuilds and the published snapshot
//! - [`server`] - daemon that keeps the engine warm behind a Unix socket
//! - [`output`] - terminal formatting of results
//! - [`utils`] - trigrams, encodings, data directory and config
//!
//! ## Quick Start
//!
//! ```no_run
//! use pathfinder::engine::SearchEngine;
//! use pathfinder::utils::AppConfig;
//! use std::path::Path;
//!
//! let engine = SearchEngine::open(Path::new("/tmp/pathfinder"), AppConfig::default()).unwrap();
//! engine.add_root(Path::new("/home/user/documents")).unwrap();
//!
//! for path in engine.query("budget_rep") {
//!     println!("{}", path);
//! }
//! ```
//!
//! ## Ranking
//!
//! A query is split on `/` and read file first. Paths whose basename shares
//! at least three trigram positions with the file fragment become
//! candidates. They are ranked by an edit distance that makes inserting
//! characters cheap and deleting them expensive, so `bdgt_report` still
//! finds `budget_report.csv`. Directory segments then re-rank the best hundred
//! against full paths.

pub mod engine;
pub mod index;
pub mod output;
pub mod query;
pub mod server;
pub mod store;
pub mod utils;
