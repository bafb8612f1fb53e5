use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use crate::store::PathId;

/// A trigram is a 3-byte sequence stored as u32 (only lower 24 bits used)
pub type Trigram = u32;

/// Trigram to the ascending, duplicate-free ids whose basename contains it.
pub type TrigramMap = BTreeMap<Trigram, Vec<PathId>>;

/// Snapshot format version, shared by `trigrams.bin` and `meta.json`.
pub const INDEX_VERSION: u32 = 1;

/// Index metadata stored in meta.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub roots: Vec<PathBuf>,
    pub path_count: u64,
    pub trigram_count: u64,
    /// Length of the path log when the snapshot was written
    pub log_len: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            roots: Vec::new(),
            path_count: 0,
            trigram_count: 0,
            log_len: 0,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Walker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Extensions (without the dot, case-insensitive) that are never indexed
    pub excluded_extensions: Vec<String>,
    /// Glob patterns matched against the full path
    pub excluded_globs: Vec<String>,
    /// Directory names that are never descended into
    pub excluded_dirs: Vec<String>,
    pub follow_gitignore: bool,
    pub include_hidden: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            excluded_extensions: vec!["class".to_string()],
            excluded_globs: Vec::new(),
            excluded_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
            ],
            follow_gitignore: true,
            include_hidden: false,
        }
    }
}

/// Convert 3 bytes to a trigram
#[inline]
pub fn bytes_to_trigram(b0: u8, b1: u8, b2: u8) -> Trigram {
    ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32)
}

/// Convert trigram back to bytes
#[inline]
pub fn trigram_to_bytes(t: Trigram) -> [u8; 3] {
    [
        ((t >> 16) & 0xFF) as u8,
        ((t >> 8) & 0xFF) as u8,
        (t & 0xFF) as u8,
    ]
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigram_packing() {
        let t = bytes_to_trigram(b'a', b'b', b'c');
        assert_eq!(t, 0x616263);
        assert_eq!(trigram_to_bytes(t), *b"abc");
        assert!(t < 1 << 24);
    }

    #[test]
    fn test_index_config_partial_json() {
        let config: IndexConfig = serde_json::from_str(r#"{"include_hidden": true}"#).unwrap();
        assert!(config.include_hidden);
        assert_eq!(config.excluded_extensions, vec!["class".to_string()]);
        assert!(config.follow_gitignore);
    }
}
