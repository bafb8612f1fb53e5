//! Persistent string store for indexed paths.
//!
//! Every indexed path is interned exactly once and identified by a [`PathId`],
//! the byte offset of its record in an append-only log:
//!
//! ```text
//! [len:u16 LE][len bytes]  [len:u16 LE][len bytes]  ...
//! ```
//!
//! The log is the only durable state. Lookups go through an in-memory hash
//! table that stores log offsets (never string copies), so the table is a
//! cache that is rebuilt by replaying the log when the store is opened.
//!
//! ## Modules
//!
//! - [`wal`] - record I/O over the log file and replay/recovery
//! - [`table`] - chained offset table keyed by content hash
//! - [`interner`] - the [`StringStore`] tying both together

pub mod interner;
pub mod table;
pub mod wal;

pub use interner::StringStore;

use thiserror::Error;

/// Stable identifier of an interned path: the byte offset of its log record.
pub type PathId = u32;

/// Largest string a record can hold (16-bit length prefix).
pub const MAX_RECORD_LEN: usize = u16::MAX as usize;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The string or offset is not present in the store.
    #[error("not found")]
    NotFound,
    #[error("record at offset {offset} is not valid UTF-8")]
    Corrupt { offset: PathId },
    #[error("string of {len} bytes exceeds the {MAX_RECORD_LEN} byte record limit")]
    OversizeString { len: usize },
    #[error("path log is full ({len} bytes)")]
    LogFull { len: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
