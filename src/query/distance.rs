//! Asymmetric weighted edit distance.
//!
//! Skipping bytes of the candidate is cheap, while leaving query bytes
//! unmatched or substituting them is expensive. A query that is a scattered
//! fragment of a longer name therefore scores close to zero, and the
//! remaining score mostly reflects how much longer the candidate is.

/// Cost of a query byte with no counterpart in the candidate.
pub const DELETION_COST: u32 = 20;
/// Cost of a candidate byte skipped over.
pub const INSERTION_COST: u32 = 1;
/// Cost of pairing two different bytes.
pub const SUBSTITUTION_COST: u32 = 21;

/// Distance from `query` to `candidate`, byte by byte. Lower is closer.
///
/// Callers lowercase both sides; the comparison itself is exact.
pub fn weighted_distance(query: &[u8], candidate: &[u8]) -> u32 {
    if query == candidate {
        return 0;
    }
    if query.is_empty() {
        return candidate.len() as u32 * INSERTION_COST;
    }
    if candidate.is_empty() {
        return query.len() as u32 * DELETION_COST;
    }

    // prev[j]: cost of the first j query bytes against the candidate so far
    let mut prev: Vec<u32> = (0..=query.len() as u32).map(|j| j * DELETION_COST).collect();
    let mut cur = vec![0u32; query.len() + 1];

    for (i, &c) in candidate.iter().enumerate() {
        cur[0] = (i as u32 + 1) * DELETION_COST;
        for (j, &q) in query.iter().enumerate() {
            let pair = if q == c { 0 } else { SUBSTITUTION_COST };
            cur[j + 1] = (cur[j] + DELETION_COST)
                .min(prev[j + 1] + INSERTION_COST)
                .min(prev[j] + pair);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[query.len()]
}

/// [`weighted_distance`] over lowercased strings.
pub fn score(query: &str, candidate: &str) -> u32 {
    weighted_distance(query.to_lowercase().as_bytes(), candidate.to_lowercase().as_bytes())
}
