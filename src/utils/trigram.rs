use crate::index::types::{bytes_to_trigram, Trigram};
use memchr::memrchr2;

/// Final component of a path, split on either separator.
#[inline]
pub fn basename(path: &str) -> &str {
    match memrchr2(b'/', b'\\', path.as_bytes()) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Trigrams of every 3-byte window, in position order.
///
/// Duplicates are kept: `"aaaa"` yields the same trigram twice.
pub fn window_trigrams(bytes: &[u8]) -> Vec<Trigram> {
    if bytes.len() < 3 {
        return Vec::new();
    }
    bytes
        .windows(3)
        .map(|w| bytes_to_trigram(w[0], w[1], w[2]))
        .collect()
}

/// Unique trigrams of a path's lowercased basename, ascending.
pub fn basename_trigrams(path: &str) -> Vec<Trigram> {
    let lowered = basename(path).to_lowercase();
    let mut trigrams = window_trigrams(lowered.as_bytes());
    trigrams.sort_unstable();
    trigrams.dedup();
    trigrams
}

/// Trigrams of a lowercased query fragment, one per position.
pub fn query_trigrams(query: &str) -> Vec<Trigram> {
    window_trigrams(query.to_lowercase().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(s: &str) -> Trigram {
        let b = s.as_bytes();
        bytes_to_trigram(b[0], b[1], b[2])
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/home/user/budget.csv"), "budget.csv");
        assert_eq!(basename("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(basename("plain"), "plain");
        assert_eq!(basename("/trailing/"), "");
    }

    #[test]
    fn test_window_trigrams() {
        assert!(window_trigrams(b"").is_empty());
        assert!(window_trigrams(b"ab").is_empty());
        assert_eq!(window_trigrams(b"abc"), vec![tri("abc")]);
        assert_eq!(window_trigrams(b"hello").len(), 3);
    }

    #[test]
    fn test_basename_trigrams_lowercase_and_unique() {
        let trigrams = basename_trigrams("/Docs/AAAA.md");
        assert_eq!(trigrams.len(), 4); // "aaa", "aa.", "a.m", ".md"
        assert!(trigrams.contains(&tri("aaa")));
        assert!(trigrams.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_basename_trigrams_ignore_parent_dirs() {
        let trigrams = basename_trigrams("/finance/ab");
        assert!(trigrams.is_empty());
    }

    #[test]
    fn test_query_trigrams_keep_positions() {
        let trigrams = query_trigrams("AAAA");
        assert_eq!(trigrams, vec![tri("aaa"), tri("aaa")]);
    }
}
