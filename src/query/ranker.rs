use crate::index::types::PathId;
use crate::query::distance::score;
use crate::query::SearchConfig;
use crate::utils::basename;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A query split on `/`, written file first: `file/parent/grandparent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    segments: Vec<String>,
}

impl ParsedQuery {
    /// Split `word` on `/`, dropping empty segments.
    pub fn parse(word: &str) -> Self {
        Self {
            segments: word
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The fragment matched against basenames.
    pub fn file_fragment(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_dirs(&self) -> bool {
        self.segments.len() > 1
    }

    /// Segments put back in path order, `grandparent/parent/file`.
    pub fn path_query(&self) -> String {
        let mut parts: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        parts.reverse();
        parts.join("/")
    }
}

/// A ranked path. Lower scores are better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredPath {
    pub path: String,
    pub score: u32,
}

/// Score every candidate against `fragment` and sort ascending.
/// Equal scores keep their input order.
pub fn rank_by<F>(candidates: Vec<String>, fragment: &str, extract: F) -> Vec<ScoredPath>
where
    F: Fn(&str) -> &str + Sync,
{
    let mut scored: Vec<ScoredPath> = candidates
        .into_par_iter()
        .map(|path| {
            let score = score(fragment, extract(&path));
            ScoredPath { path, score }
        })
        .collect();
    scored.sort_by_key(|s| s.score);
    scored
}

/// Two-stage ranking of resolved candidates.
///
/// The file fragment is scored against basenames and the best
/// `shortlist_size` kept. A query with directory segments then re-scores that
/// shortlist against full paths. At most `result_limit` paths are returned.
pub fn match_paths(
    query: &ParsedQuery,
    candidates: Vec<(PathId, String)>,
    config: &SearchConfig,
) -> Vec<ScoredPath> {
    if query.is_empty() {
        return Vec::new();
    }

    let paths = candidates.into_iter().map(|(_, path)| path).collect();
    let mut top = rank_by(paths, query.file_fragment(), basename);
    top.truncate(config.shortlist_size);

    if query.has_dirs() {
        let shortlist = top.into_iter().map(|s| s.path).collect();
        top = rank_by(shortlist, &query.path_query(), |p| p);
    }

    top.truncate(config.result_limit);
    top
}
