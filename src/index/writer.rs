use crate::index::types::*;
use crate::store::{StoreError, StoreResult, StringStore};
use crate::utils::basename_trigrams;
use log::warn;

/// Trigram mapping built for a single root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootIndex {
    pub mapping: TrigramMap,
    /// Paths interned for this root
    pub paths: usize,
    /// Paths dropped because they could not be stored
    pub skipped: usize,
}

/// Accumulates basename trigrams for the paths of one root.
pub struct TrigramIndexer<'a> {
    store: &'a StringStore,
    postings: TrigramMap,
    paths: usize,
    skipped: usize,
}

impl<'a> TrigramIndexer<'a> {
    pub fn new(store: &'a StringStore) -> Self {
        Self {
            store,
            postings: TrigramMap::new(),
            paths: 0,
            skipped: 0,
        }
    }

    /// Intern `path` and post its id under every trigram of its basename.
    ///
    /// Basenames shorter than three bytes are interned but post nothing.
    pub fn add_path(&mut self, path: &str) -> StoreResult<PathId> {
        let id = self.store.intern(path)?;
        for trigram in basename_trigrams(path) {
            self.postings.entry(trigram).or_default().push(id);
        }
        self.paths += 1;
        Ok(id)
    }

    /// Like [`add_path`](Self::add_path), but a path the store rejects is
    /// logged and counted instead of failing the build. I/O errors still fail.
    pub fn add_path_lossy(&mut self, path: &str) -> StoreResult<()> {
        match self.add_path(path) {
            Ok(_) => Ok(()),
            Err(StoreError::OversizeString { len }) => {
                warn!("skipping path of {} bytes: too long to store", len);
                self.skipped += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Sort and deduplicate every posting list.
    pub fn finish(self) -> RootIndex {
        let mut mapping = self.postings;
        for ids in mapping.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        RootIndex {
            mapping,
            paths: self.paths,
            skipped: self.skipped,
        }
    }
}

/// Build the trigram mapping for a sequence of path strings.
pub fn index_paths<I, S>(store: &StringStore, paths: I) -> StoreResult<RootIndex>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut indexer = TrigramIndexer::new(store);
    for path in paths {
        indexer.add_path_lossy(path.as_ref())?;
    }
    Ok(indexer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MAX_RECORD_LEN;
    use tempfile::TempDir;

    fn tri(s: &str) -> Trigram {
        let b = s.as_bytes();
        bytes_to_trigram(b[0], b[1], b[2])
    }

    #[test]
    fn test_posts_basename_trigrams_only() {
        let dir = TempDir::new().unwrap();
        let store = StringStore::open(&dir.path().join("paths.log")).unwrap();

        let index = index_paths(&store, ["/docs/Readme.md"]).unwrap();
        let id = store.lookup("/docs/Readme.md").unwrap();

        assert_eq!(index.paths, 1);
        assert_eq!(index.mapping.get(&tri("rea")), Some(&vec![id]));
        assert!(index.mapping.get(&tri("doc")).is_none());
        // "readme.md" has 7 windows, all distinct
        assert_eq!(index.mapping.len(), 7);
    }

    #[test]
    fn test_lists_sorted_and_unique() {
        let dir = TempDir::new().unwrap();
        let store = StringStore::open(&dir.path().join("paths.log")).unwrap();

        // Interned out of offset order on the second pass
        store.intern("/z/aaaa").unwrap();
        let index = index_paths(&store, ["/b/aaa", "/z/aaaa", "/b/aaa"]).unwrap();

        let ids = &index.mapping[&tri("aaa")];
        assert_eq!(ids.len(), 2);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_short_basename_is_interned_but_unreachable() {
        let dir = TempDir::new().unwrap();
        let store = StringStore::open(&dir.path().join("paths.log")).unwrap();

        let index = index_paths(&store, ["/very/long/dir/ab"]).unwrap();
        assert!(index.mapping.is_empty());
        assert_eq!(index.paths, 1);
        assert!(store.lookup("/very/long/dir/ab").is_ok());
    }

    #[test]
    fn test_oversize_path_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = StringStore::open(&dir.path().join("paths.log")).unwrap();
        let huge = format!("/{}", "x".repeat(MAX_RECORD_LEN));

        let index = index_paths(&store, [huge.as_str(), "/ok/notes.txt"]).unwrap();
        assert_eq!(index.skipped, 1);
        assert_eq!(index.paths, 1);
        assert_eq!(store.len(), 1);
    }
}
