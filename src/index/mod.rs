//! Trigram index over path basenames.
//!
//! - [`build`] - filesystem walk producing the paths of a root
//! - [`writer`] - per-root trigram mapping built while interning paths
//! - [`merge`] - sorted-set union of mappings across roots
//! - [`snapshot`] - `trigrams.bin` / `meta.json` persistence
//! - [`stats`] - statistics shown by `pathfinder stats`

pub mod build;
pub mod merge;
pub mod snapshot;
pub mod stats;
pub mod types;
pub mod writer;

pub use merge::{merge_all, merge_mappings, merge_sorted_ids};
pub use snapshot::IndexSnapshot;
pub use types::*;
pub use writer::{index_paths, RootIndex, TrigramIndexer};
