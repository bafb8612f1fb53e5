//! Fuzzy path matching.
//!
//! A query word goes through three steps:
//!
//! 1. [`candidates`] - ids whose basename shares enough trigrams with the
//!    file fragment of the query
//! 2. [`distance`] - asymmetric weighted edit distance used as the score
//! 3. [`ranker`] - basename ranking, then full-path re-ranking for queries
//!    with directory segments

pub mod candidates;
pub mod distance;
pub mod ranker;

pub use candidates::find_candidates;
pub use distance::weighted_distance;
pub use ranker::{match_paths, ParsedQuery, ScoredPath};

use serde::{Deserialize, Serialize};

/// Search tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Matching trigram positions needed to become a candidate
    pub min_trigram_matches: usize,
    /// Paths kept after basename ranking
    pub shortlist_size: usize,
    /// Paths returned to the caller
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_trigram_matches: 3,
            shortlist_size: 100,
            result_limit: 10,
        }
    }
}
