//! The search engine: path store, root set and published snapshot.
//!
//! Queries clone the current `Arc<IndexSnapshot>` and never block on a
//! rebuild. A rebuild walks every root, interns the paths, merges the
//! per-root mappings and swaps the result in. Rebuilds never overlap.
//!
//! Clearing is the one operation that invalidates ids, so it excludes
//! searches for the moment it takes to swap the snapshot and empty the log.

use crate::index::build::{collect_root, RootWalker};
use crate::index::snapshot::{read_snapshot, remove_snapshot, write_snapshot, IndexSnapshot};
use crate::index::stats::{top_trigrams, IndexStats};
use crate::index::types::{unix_now, IndexMeta, TrigramMap, INDEX_VERSION};
use crate::index::{index_paths, merge_all};
use crate::query::{find_candidates, match_paths, ParsedQuery, ScoredPath};
use crate::store::StringStore;
use crate::utils::{normalize_root, resolve_data_dir, AppConfig, LOG_FILE};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Result of one rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexSummary {
    pub roots: usize,
    pub paths: u64,
    /// Entries skipped during the walk or rejected by the store
    pub skipped: u64,
    pub trigrams: u64,
    pub duration_ms: u64,
}

/// Outcome of [`SearchEngine::reindex_now`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexOutcome {
    Completed(ReindexSummary),
    /// Another rebuild held the guard
    AlreadyRunning,
}

pub struct SearchEngine {
    data_dir: PathBuf,
    config: AppConfig,
    walker: RootWalker,
    store: StringStore,
    roots: RwLock<Vec<PathBuf>>,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    generation: AtomicU64,
    reindex_guard: Mutex<()>,
    /// Held shared from snapshot fetch to id resolution, exclusively by `clear`
    store_gate: RwLock<()>,
}

impl SearchEngine {
    /// Open the engine stored in `data_dir`.
    ///
    /// The path log is replayed; a snapshot that refers past the end of the
    /// log is discarded.
    pub fn open(data_dir: &Path, config: AppConfig) -> Result<Self> {
        let store = StringStore::open(&data_dir.join(LOG_FILE))
            .with_context(|| format!("Failed to open path log in {}", data_dir.display()))?;
        let walker = RootWalker::new(&config.index)?;

        let snapshot = match read_snapshot(data_dir) {
            Ok(Some(snapshot)) if snapshot.is_stale(store.log_len()) => {
                warn!("discarding snapshot that refers past the end of the path log");
                remove_snapshot(data_dir)?;
                IndexSnapshot::default()
            }
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => IndexSnapshot::default(),
            Err(e) => {
                warn!("discarding unreadable snapshot: {:#}", e);
                IndexSnapshot::default()
            }
        };

        let mut roots: Vec<PathBuf> = Vec::new();
        let seed = if snapshot.meta.roots.is_empty() {
            config.roots.iter().map(|r| normalize_root(r)).collect()
        } else {
            snapshot.meta.roots.clone()
        };
        for root in seed {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            walker,
            store,
            roots: RwLock::new(roots),
            snapshot: RwLock::new(Arc::new(snapshot)),
            generation: AtomicU64::new(0),
            reindex_guard: Mutex::new(()),
            store_gate: RwLock::new(()),
        })
    }

    /// Resolve the data directory, load its config and open the engine.
    pub fn open_default(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = AppConfig::load(&data_dir)?;
        Self::open(&data_dir, config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &StringStore {
        &self.store
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Bumped on every publish.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().clone()
    }

    /// True when there are roots but nothing has been indexed yet.
    pub fn needs_index(&self) -> bool {
        let snapshot = self.snapshot();
        snapshot.meta.updated_at == 0 && !self.roots.read().is_empty()
    }

    /// Rebuild from every root, waiting for a running rebuild to finish.
    pub fn index_all_roots(&self) -> Result<ReindexSummary> {
        let _guard = self.reindex_guard.lock();
        self.rebuild()
    }

    /// Rebuild unless one is already running.
    pub fn reindex_now(&self) -> Result<ReindexOutcome> {
        match self.reindex_guard.try_lock() {
            Some(_guard) => Ok(ReindexOutcome::Completed(self.rebuild()?)),
            None => Ok(ReindexOutcome::AlreadyRunning),
        }
    }

    /// Add `root` to the root set and rebuild. A root that is already present
    /// is not added twice, but the rebuild still runs.
    pub fn add_root(&self, root: &Path) -> Result<ReindexSummary> {
        let root = normalize_root(root);
        let _guard = self.reindex_guard.lock();
        {
            let mut roots = self.roots.write();
            if roots.contains(&root) {
                debug!("root {} already present", root.display());
            } else {
                info!("adding root {}", root.display());
                roots.push(root);
            }
        }
        self.rebuild()
    }

    /// Run when nothing has been indexed yet.
    pub fn ensure_indexed(&self) -> Result<Option<ReindexSummary>> {
        if self.needs_index() {
            return self.index_all_roots().map(Some);
        }
        Ok(None)
    }

    /// Caller holds `reindex_guard`.
    fn rebuild(&self) -> Result<ReindexSummary> {
        let start = Instant::now();
        let roots = self.roots();
        info!("reindexing {} roots", roots.len());

        // Walk in parallel, intern serially
        let walked: Vec<(Vec<String>, usize)> = roots
            .par_iter()
            .map(|root| collect_root(&self.walker, root))
            .collect();

        let mut mappings: Vec<TrigramMap> = Vec::with_capacity(walked.len());
        let mut paths = 0u64;
        let mut skipped = 0u64;
        for (root, (root_paths, walk_errors)) in roots.iter().zip(walked) {
            let index = index_paths(&self.store, &root_paths)
                .with_context(|| format!("Failed to index {}", root.display()))?;
            debug!(
                "{}: {} paths, {} trigrams",
                root.display(),
                index.paths,
                index.mapping.len()
            );
            paths += index.paths as u64;
            skipped += (index.skipped + walk_errors) as u64;
            mappings.push(index.mapping);
        }
        self.store.sync().context("Failed to sync path log")?;

        let mapping = merge_all(mappings);
        let now = unix_now();
        let created_at = match self.snapshot().meta.created_at {
            0 => now,
            t => t,
        };
        let meta = IndexMeta {
            version: INDEX_VERSION,
            roots: roots.clone(),
            path_count: paths,
            trigram_count: mapping.len() as u64,
            log_len: self.store.log_len(),
            created_at,
            updated_at: now,
        };
        let snapshot = Arc::new(IndexSnapshot::new(mapping, meta));
        self.publish(Arc::clone(&snapshot));
        write_snapshot(&self.data_dir, &snapshot).context("Failed to persist snapshot")?;

        let summary = ReindexSummary {
            roots: roots.len(),
            paths,
            skipped,
            trigrams: snapshot.trigram_count() as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "reindexed {} paths from {} roots in {}ms ({} skipped)",
            summary.paths, summary.roots, summary.duration_ms, summary.skipped
        );
        Ok(summary)
    }

    fn publish(&self, snapshot: Arc<IndexSnapshot>) {
        *self.snapshot.write() = snapshot;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Ranked matches for `word`, best first.
    pub fn search(&self, word: &str) -> Vec<ScoredPath> {
        let query = ParsedQuery::parse(word);
        if query.is_empty() {
            return Vec::new();
        }

        let candidates = {
            let _gate = self.store_gate.read();
            let snapshot = self.snapshot();
            let ids = find_candidates(
                query.file_fragment(),
                &snapshot.mapping,
                self.config.search.min_trigram_matches,
            );
            self.store.resolve_many(&ids)
        };
        match_paths(&query, candidates, &self.config.search)
    }

    /// Matching paths for `word`, best first.
    pub fn query(&self, word: &str) -> Vec<String> {
        self.search(word).into_iter().map(|s| s.path).collect()
    }

    /// Drop every interned path and publish an empty mapping. The root set is
    /// kept and persisted with the empty snapshot.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.reindex_guard.lock();
        let now = unix_now();
        let meta = IndexMeta {
            roots: self.roots(),
            created_at: now,
            updated_at: 0,
            ..IndexMeta::default()
        };
        let snapshot = Arc::new(IndexSnapshot::new(TrigramMap::new(), meta));

        {
            let _gate = self.store_gate.write();
            self.publish(Arc::clone(&snapshot));
            self.store.clear().context("Failed to clear path log")?;
        }
        remove_snapshot(&self.data_dir)?;
        write_snapshot(&self.data_dir, &snapshot).context("Failed to persist empty snapshot")?;
        info!("cleared index in {}", self.data_dir.display());
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot();
        IndexStats {
            data_dir: self.data_dir.clone(),
            roots: self.roots(),
            interned_paths: self.store.len() as u64,
            indexed_paths: snapshot.meta.path_count,
            log_bytes: self.store.log_len(),
            table_capacity: self.store.capacity() as u64,
            trigram_count: snapshot.trigram_count() as u64,
            posting_count: snapshot.posting_count() as u64,
            generation: self.generation(),
            created_at: snapshot.meta.created_at,
            updated_at: snapshot.meta.updated_at,
            top_trigrams: top_trigrams(&snapshot, 5),
        }
    }
}
