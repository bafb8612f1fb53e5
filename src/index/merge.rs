//! Sorted-set merging of trigram mappings.
//!
//! Posting lists are ascending and duplicate-free, so combining the mappings
//! of several roots is a per-key linear merge. The result does not depend on
//! the order the mappings are merged in.

use crate::index::types::{PathId, TrigramMap};

/// Merge two ascending id lists into one ascending list without duplicates.
pub fn merge_sorted_ids(a: &[PathId], b: &[PathId]) -> Vec<PathId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        let next = if x < y {
            i += 1;
            x
        } else if y < x {
            j += 1;
            y
        } else {
            i += 1;
            j += 1;
            x
        };
        push_unique(&mut out, next);
    }
    for &x in &a[i..] {
        push_unique(&mut out, x);
    }
    for &y in &b[j..] {
        push_unique(&mut out, y);
    }

    out
}

/// Inputs are expected to be duplicate-free; this keeps the output so even
/// when one is not.
#[inline]
fn push_unique(out: &mut Vec<PathId>, id: PathId) {
    if out.last() != Some(&id) {
        out.push(id);
    }
}

/// Union of two mappings. Every list of the result is ascending and
/// duplicate-free even if the inputs were not.
pub fn merge_mappings(m1: TrigramMap, m2: TrigramMap) -> TrigramMap {
    let mut acc = TrigramMap::new();
    for mapping in [m1, m2] {
        for (trigram, mut ids) in mapping {
            ids.sort_unstable();
            ids.dedup();
            let slot = acc.entry(trigram).or_default();
            *slot = if slot.is_empty() {
                ids
            } else {
                merge_sorted_ids(slot, &ids)
            };
        }
    }
    acc
}

/// Fold any number of mappings into one.
pub fn merge_all<I>(mappings: I) -> TrigramMap
where
    I: IntoIterator<Item = TrigramMap>,
{
    mappings.into_iter().fold(TrigramMap::new(), merge_mappings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(u32, &[PathId])]) -> TrigramMap {
        entries.iter().map(|(t, ids)| (*t, ids.to_vec())).collect()
    }

    #[test]
    fn test_merge_disjoint() {
        assert_eq!(merge_sorted_ids(&[1], &[2]), vec![1, 2]);
    }

    #[test]
    fn test_merge_overlapping() {
        assert_eq!(merge_sorted_ids(&[1, 2], &[2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_with_empty() {
        assert_eq!(merge_sorted_ids(&[1, 2], &[]), vec![1, 2]);
        assert_eq!(merge_sorted_ids(&[], &[4]), vec![4]);
        assert!(merge_sorted_ids(&[], &[]).is_empty());
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = [0, 7, 9, 30, 31, 100];
        let b = [1, 7, 30, 99, 100, 250];
        let ab = merge_sorted_ids(&a, &b);
        assert_eq!(ab, merge_sorted_ids(&b, &a));
        assert_eq!(ab, vec![0, 1, 7, 9, 30, 31, 99, 100, 250]);
    }

    #[test]
    fn test_merge_mappings_unions_keys() {
        let m1 = map(&[(1, &[10, 20]), (2, &[5])]);
        let m2 = map(&[(2, &[5, 6]), (3, &[1])]);

        let merged = merge_mappings(m1, m2);
        assert_eq!(merged, map(&[(1, &[10, 20]), (2, &[5, 6]), (3, &[1])]));
    }

    #[test]
    fn test_merge_mappings_normalizes_unsorted_input() {
        let m1 = map(&[(7, &[9, 3, 3])]);
        let merged = merge_mappings(m1, TrigramMap::new());
        assert_eq!(merged[&7], vec![3, 9]);
    }

    #[test]
    fn test_merge_all_is_order_independent() {
        let a = map(&[(1, &[1, 4]), (2, &[2])]);
        let b = map(&[(1, &[3]), (3, &[8])]);
        let c = map(&[(1, &[4, 5]), (2, &[1, 2])]);

        let abc = merge_all([a.clone(), b.clone(), c.clone()]);
        let cab = merge_all([c.clone(), a.clone(), b.clone()]);
        let nested = merge_mappings(a, merge_mappings(b, c));

        assert_eq!(abc, cab);
        assert_eq!(abc, nested);
        assert_eq!(abc[&1], vec![1, 3, 4, 5]);
    }
}
