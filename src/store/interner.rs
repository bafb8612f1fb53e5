//! Interner mapping path strings to stable ids, backed by the path log and
//! an in-memory offset table.

use std::hash::Hasher;
use std::path::Path;

use log::{debug, info, warn};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rustc_hash::FxHasher;

use super::table::{OffsetTable, INITIAL_CAPACITY};
use super::wal::PathLog;
use super::{MAX_RECORD_LEN, PathId, StoreError, StoreResult};

/// 32-bit content hash used to pick a bucket.
#[inline]
pub fn content_hash(bytes: &[u8]) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

struct StoreInner {
    log: PathLog,
    table: OffsetTable,
}

impl StoreInner {
    /// Walk the chain for `hash` comparing stored content.
    ///
    /// Entries whose record no longer reads back are skipped; only I/O errors
    /// end the walk.
    fn find(&self, hash: u32, bytes: &[u8]) -> StoreResult<Option<PathId>> {
        for offset in self.table.chain(hash) {
            match self.log.read_record(offset) {
                Ok(stored) if stored == bytes => return Ok(Some(offset)),
                Ok(_) => {}
                Err(e @ (StoreError::NotFound | StoreError::Corrupt { .. })) => {
                    debug!("skipping dangling table entry {}: {}", offset, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Double the bucket array, re-reading every record to recompute its hash.
    fn grow(&mut self) -> StoreResult<()> {
        let capacity = self.table.capacity() * 2;
        debug!(
            "rehashing {} paths: {} -> {} buckets",
            self.table.len(),
            self.table.capacity(),
            capacity
        );

        let mut grown = OffsetTable::with_capacity(capacity);
        for offset in self.table.offsets() {
            match self.log.read_record(offset) {
                Ok(bytes) => grown.insert(content_hash(&bytes), offset),
                Err(e @ (StoreError::NotFound | StoreError::Corrupt { .. })) => {
                    warn!("dropping dangling table entry {}: {}", offset, e);
                }
                Err(e) => return Err(e),
            }
        }
        self.table = grown;
        Ok(())
    }
}

/// Interner mapping path strings to stable [`PathId`]s.
///
/// Writers (`intern`, `clear`) are serialized; `resolve` and `lookup` share a
/// read lock and run concurrently, but never while a rehash is in progress.
pub struct StringStore {
    inner: RwLock<StoreInner>,
}

impl StringStore {
    /// Open the log at `path`, creating it if needed, and rebuild the table by
    /// replaying it. A torn trailing record is cut off.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut log = PathLog::open(path)?;

        let mut records = Vec::new();
        let end = log.replay(|offset, bytes| records.push((offset, content_hash(bytes))))?;

        if end < log.len() {
            warn!(
                "path log {} has {} torn trailing bytes, truncating",
                path.display(),
                log.len() - end
            );
            log.truncate(end)?;
        }

        // Sized once for the replayed count instead of doubling step by step
        let mut table = OffsetTable::with_capacity(OffsetTable::capacity_for(records.len()));
        for (offset, hash) in records {
            table.insert(hash, offset);
        }

        info!(
            "loaded {} paths ({} bytes) from {}",
            table.len(),
            log.len(),
            path.display()
        );

        Ok(Self {
            inner: RwLock::new(StoreInner { log, table }),
        })
    }

    /// Return the id of `s`, appending it to the log if it is new.
    pub fn intern(&self, s: &str) -> StoreResult<PathId> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_RECORD_LEN {
            return Err(StoreError::OversizeString { len: bytes.len() });
        }
        let hash = content_hash(bytes);

        // Only one upgradable guard exists at a time, so interning is
        // serialized while readers keep going until the upgrade.
        let inner = self.inner.upgradable_read();
        if let Some(id) = inner.find(hash, bytes)? {
            return Ok(id);
        }

        let mut inner = RwLockUpgradableReadGuard::upgrade(inner);
        let id = inner.log.append(bytes)?;
        inner.table.insert(hash, id);
        // The id is valid from here on; a failed rehash only leaves the table fuller
        if inner.table.needs_grow() {
            if let Err(e) = inner.grow() {
                warn!("rehash after interning {} failed: {}", id, e);
            }
        }
        Ok(id)
    }

    /// The string stored at `id`.
    pub fn resolve(&self, id: PathId) -> StoreResult<String> {
        let inner = self.inner.read();
        let bytes = inner.log.read_record(id)?;
        String::from_utf8(bytes).map_err(|_| StoreError::Corrupt { offset: id })
    }

    /// Resolve a batch of ids under one read lock, skipping ids that no
    /// longer resolve.
    pub fn resolve_many(&self, ids: &[PathId]) -> Vec<(PathId, String)> {
        let inner = self.inner.read();
        ids.iter()
            .filter_map(|&id| match inner.log.read_record(id) {
                Ok(bytes) => String::from_utf8(bytes).ok().map(|s| (id, s)),
                Err(e) => {
                    debug!("skipping unresolvable path id {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// The id of `s` if it has been interned.
    pub fn lookup(&self, s: &str) -> StoreResult<PathId> {
        let bytes = s.as_bytes();
        let inner = self.inner.read();
        inner
            .find(content_hash(bytes), bytes)?
            .ok_or(StoreError::NotFound)
    }

    /// Discard the whole log. Every previously issued id becomes invalid.
    pub fn clear(&self) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.log.truncate(0)?;
        inner.table = OffsetTable::with_capacity(INITIAL_CAPACITY);
        info!("cleared path log {}", inner.log.path().display());
        Ok(())
    }

    /// Flush the log to disk.
    pub fn sync(&self) -> StoreResult<()> {
        self.inner.write().log.sync()?;
        Ok(())
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the log in bytes.
    pub fn log_len(&self) -> u64 {
        self.inner.read().log.len()
    }

    /// Current bucket count of the hash table.
    pub fn capacity(&self) -> usize {
        self.inner.read().table.capacity()
    }

    #[cfg(test)]
    fn force_rehash(&self) -> StoreResult<()> {
        self.inner.write().grow()
    }
}
