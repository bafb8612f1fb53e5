//! Utility functions shared by the indexer, the engine and the binary.
//!
//! ## Modules
//!
//! - [`app_data`] - Data directory and `config.json` handling
//! - [`encoding`] - Variable-length integer and delta encoding
//! - [`trigram`] - Basename and query trigram extraction
//! - [`progress`] - Spinner that compiles away without the `progress` feature
//!
//! ```no_run
//! use pathfinder::utils::{basename, basename_trigrams};
//!
//! assert_eq!(basename("/srv/finance/budget.csv"), "budget.csv");
//! let trigrams = basename_trigrams("/srv/finance/Budget.csv");
//! // "bud", "udg", "dge", "get", "et.", "t.c", ".cs", "csv"
//! ```

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod trigram;

pub use app_data::*;
pub use encoding::*;
pub use trigram::*;
