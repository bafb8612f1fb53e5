//! Chained hash table of log offsets.
//!
//! Buckets hold the index of the first entry of their chain; entries live in
//! a flat arena and link to the next entry by index. Only offsets are stored,
//! so comparing content means reading the record back from the log.

use super::PathId;

/// Bucket count of a fresh table.
pub const INITIAL_CAPACITY: usize = 1024;

/// The table doubles once `len / capacity` goes above this.
pub const LOAD_FACTOR: f64 = 0.9;

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Entry {
    offset: PathId,
    next: u32,
}

#[derive(Debug, Clone)]
pub struct OffsetTable {
    buckets: Vec<u32>,
    entries: Vec<Entry>,
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }
}

impl OffsetTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![NIL; capacity.max(1)],
            entries: Vec::new(),
        }
    }

    /// Smallest doubling of [`INITIAL_CAPACITY`] that holds `count` entries
    /// without crossing the load factor.
    pub fn capacity_for(count: usize) -> usize {
        let mut capacity = INITIAL_CAPACITY;
        while count as f64 > LOAD_FACTOR * capacity as f64 {
            capacity *= 2;
        }
        capacity
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn needs_grow(&self) -> bool {
        self.len() as f64 > LOAD_FACTOR * self.capacity() as f64
    }

    #[inline]
    fn slot(&self, hash: u32) -> usize {
        hash as usize % self.buckets.len()
    }

    /// Prepend `offset` to the chain for `hash`.
    pub fn insert(&mut self, hash: u32, offset: PathId) {
        let slot = self.slot(hash);
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            offset,
            next: self.buckets[slot],
        });
        self.buckets[slot] = index;
    }

    /// Offsets chained under the bucket for `hash`, most recent first.
    pub fn chain(&self, hash: u32) -> Chain<'_> {
        Chain {
            table: self,
            cursor: self.buckets[self.slot(hash)],
        }
    }

    /// Every stored offset, bucket by bucket.
    pub fn offsets(&self) -> impl Iterator<Item = PathId> + '_ {
        self.buckets.iter().flat_map(move |&head| Chain {
            table: self,
            cursor: head,
        })
    }
}

pub struct Chain<'a> {
    table: &'a OffsetTable,
    cursor: u32,
}

impl Iterator for Chain<'_> {
    type Item = PathId;

    fn next(&mut self) -> Option<PathId> {
        if self.cursor == NIL {
            return None;
        }
        let entry = self.table.entries[self.cursor as usize];
        self.cursor = entry.next;
        Some(entry.offset)
    }
}
