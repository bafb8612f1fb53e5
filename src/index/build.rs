use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{Walk, WalkBuilder};
use log::{debug, warn};
use std::collections::HashSet;
use std::path::Path;

/// Filesystem walker producing the file paths of a root.
///
/// Directories, excluded directory names, excluded extensions and paths
/// matching an excluded glob are filtered out before anything is yielded.
pub struct RootWalker {
    config: IndexConfig,
    excluded_globs: GlobSet,
    excluded_extensions: HashSet<String>,
}

impl RootWalker {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.excluded_globs {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude glob {:?}", pattern))?;
            builder.add(glob);
        }
        let excluded_globs = builder.build().context("Failed to build exclude globs")?;

        let excluded_extensions = config
            .excluded_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        Ok(Self {
            config: config.clone(),
            excluded_globs,
            excluded_extensions,
        })
    }

    /// Lazily walk `root`, yielding absolute file paths as strings.
    pub fn walk(&self, root: &Path) -> RootWalk<'_> {
        let excluded_dirs: HashSet<String> = self.config.excluded_dirs.iter().cloned().collect();

        let inner = WalkBuilder::new(root)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.follow_gitignore)
            .git_global(self.config.follow_gitignore)
            .git_exclude(self.config.follow_gitignore)
            .ignore(self.config.follow_gitignore)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && excluded_dirs.contains(entry.file_name().to_string_lossy().as_ref()))
            })
            .build();

        RootWalk {
            walker: self,
            inner,
            errors: 0,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let excluded_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.excluded_extensions.contains(&e.to_lowercase()));
        excluded_ext || self.excluded_globs.is_match(path)
    }
}

/// Iterator over the files of one root.
pub struct RootWalk<'a> {
    walker: &'a RootWalker,
    inner: Walk,
    errors: usize,
}

impl RootWalk<'_> {
    /// Entries that could not be read or were not valid UTF-8 so far.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl Iterator for RootWalk<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    self.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if self.walker.is_excluded(path) {
                debug!("excluded {}", path.display());
                continue;
            }

            match path.to_str() {
                Some(s) => return Some(s.to_string()),
                None => {
                    warn!("skipping non UTF-8 path {}", path.display());
                    self.errors += 1;
                }
            }
        }
    }
}

/// Every file under `root`, plus the number of entries that were skipped.
pub fn collect_root(walker: &RootWalker, root: &Path) -> (Vec<String>, usize) {
    let mut walk = walker.walk(root);
    let paths: Vec<String> = walk.by_ref().collect();
    debug!("walked {}: {} files", root.display(), paths.len());
    (paths, walk.errors())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn names(paths: &[String]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| crate::utils::basename(p).to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_yields_files_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/one.txt");
        touch(dir.path(), "a/b/two.txt");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let walker = RootWalker::new(&IndexConfig::default()).unwrap();
        let (paths, errors) = collect_root(&walker, dir.path());

        assert_eq!(errors, 0);
        assert_eq!(names(&paths), vec!["one.txt", "two.txt"]);
        assert!(paths.iter().all(|p| Path::new(p).is_absolute()));
    }

    #[test]
    fn test_walk_excludes_class_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/Main.java");
        touch(dir.path(), "build/Main.class");
        touch(dir.path(), "build/Other.CLASS");
        touch(dir.path(), "node_modules/pkg/index.js");

        let walker = RootWalker::new(&IndexConfig::default()).unwrap();
        let (paths, _) = collect_root(&walker, dir.path());

        assert_eq!(names(&paths), vec!["Main.java"]);
    }

    #[test]
    fn test_walk_excluded_globs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep.md");
        touch(dir.path(), "scratch/drop.md");
        touch(dir.path(), "cache.log");

        let config = IndexConfig {
            excluded_globs: vec!["**/scratch/**".to_string(), "*.log".to_string()],
            ..IndexConfig::default()
        };
        let walker = RootWalker::new(&config).unwrap();
        let (paths, _) = collect_root(&walker, dir.path());

        assert_eq!(names(&paths), vec!["keep.md"]);
    }

    #[test]
    fn test_walk_hidden_toggle() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".secret/key.pem");
        touch(dir.path(), "visible.txt");

        let walker = RootWalker::new(&IndexConfig::default()).unwrap();
        assert_eq!(names(&collect_root(&walker, dir.path()).0), vec!["visible.txt"]);

        let config = IndexConfig {
            include_hidden: true,
            ..IndexConfig::default()
        };
        let walker = RootWalker::new(&config).unwrap();
        assert_eq!(
            names(&collect_root(&walker, dir.path()).0),
            vec!["key.pem", "visible.txt"]
        );
    }

    #[test]
    fn test_missing_root_counts_error() {
        let dir = TempDir::new().unwrap();
        let walker = RootWalker::new(&IndexConfig::default()).unwrap();
        let (paths, errors) = collect_root(&walker, &dir.path().join("gone"));
        assert!(paths.is_empty());
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let config = IndexConfig {
            excluded_globs: vec!["a[".to_string()],
            ..IndexConfig::default()
        };
        assert!(RootWalker::new(&config).is_err());
    }
}
