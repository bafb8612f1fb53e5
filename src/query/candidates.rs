use crate::index::types::{PathId, TrigramMap};
use crate::utils::query_trigrams;
use ahash::AHashMap;

/// Ids whose basename shares at least `min_matches` trigram positions with
/// `fragment`, ascending.
///
/// Every query position counts separately, so a repeated trigram in the
/// query counts once per occurrence. With the default of 3, fragments
/// shorter than 5 bytes cannot produce candidates.
pub fn find_candidates(fragment: &str, mapping: &TrigramMap, min_matches: usize) -> Vec<PathId> {
    let trigrams = query_trigrams(fragment);
    let min_matches = min_matches.max(1);
    if trigrams.len() < min_matches {
        return Vec::new();
    }

    let mut counts: AHashMap<PathId, usize> = AHashMap::new();
    for trigram in &trigrams {
        if let Some(ids) = mapping.get(trigram) {
            for &id in ids {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
    }

    let mut candidates: Vec<PathId> = counts
        .into_iter()
        .filter(|&(_, count)| count >= min_matches)
        .map(|(id, _)| id)
        .collect();
    candidates.sort_unstable();
    candidates
}
