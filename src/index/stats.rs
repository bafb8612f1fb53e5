use crate::index::snapshot::IndexSnapshot;
use crate::index::types::trigram_to_bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Point-in-time view of the engine, shared by the CLI and the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub data_dir: PathBuf,
    pub roots: Vec<PathBuf>,
    /// Strings in the path log
    pub interned_paths: u64,
    /// Paths indexed by the last rebuild
    pub indexed_paths: u64,
    pub log_bytes: u64,
    pub table_capacity: u64,
    pub trigram_count: u64,
    pub posting_count: u64,
    pub generation: u64,
    pub created_at: u64,
    pub updated_at: u64,
    /// Trigrams with the longest posting lists
    pub top_trigrams: Vec<(String, u64)>,
}

/// The `n` trigrams with the most postings, longest first.
pub fn top_trigrams(snapshot: &IndexSnapshot, n: usize) -> Vec<(String, u64)> {
    let mut freq: Vec<_> = snapshot
        .mapping
        .iter()
        .map(|(&t, ids)| (t, ids.len() as u64))
        .collect();
    freq.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    freq.into_iter()
        .take(n)
        .map(|(t, count)| (String::from_utf8_lossy(&trigram_to_bytes(t)).into_owned(), count))
        .collect()
}

/// Display index statistics
pub fn print_stats(stats: &IndexStats) {
    println!("Index Statistics");
    println!("================");
    println!();
    println!("Data directory:   {}", stats.data_dir.display());
    println!("Generation:       {}", stats.generation);
    println!("Interned paths:   {}", stats.interned_paths);
    println!("Indexed paths:    {}", stats.indexed_paths);
    println!("Path log size:    {}", format_size(stats.log_bytes));
    println!("Hash buckets:     {}", stats.table_capacity);
    println!("Trigrams:         {}", stats.trigram_count);
    println!("Postings:         {}", stats.posting_count);

    println!();
    if stats.roots.is_empty() {
        println!("No roots configured.");
    } else {
        println!("Roots:");
        for root in &stats.roots {
            let status = if root.exists() { "" } else { " [missing]" };
            println!("  {}{}", root.display(), status);
        }
    }

    if !stats.top_trigrams.is_empty() {
        println!();
        println!("Most common trigrams:");
        for (trigram, count) in &stats.top_trigrams {
            println!("  {:?} {}", trigram, count);
        }
    }

    // Timestamps
    println!();
    println!("Created:          {}", format_timestamp(stats.created_at));
    println!("Updated:          {}", format_timestamp(stats.updated_at));
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format unix timestamp
fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    if ts == 0 {
        return "never".to_string();
    }
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{bytes_to_trigram, IndexMeta, TrigramMap};

    #[test]
    fn test_top_trigrams() {
        let mut mapping = TrigramMap::new();
        mapping.insert(bytes_to_trigram(b'a', b'b', b'c'), vec![1]);
        mapping.insert(bytes_to_trigram(b'x', b'y', b'z'), vec![1, 2, 3]);
        mapping.insert(bytes_to_trigram(b'd', b'e', b'f'), vec![1, 2]);
        let snapshot = IndexSnapshot::new(mapping, IndexMeta::default());

        let top = top_trigrams(&snapshot, 2);
        assert_eq!(top, vec![("xyz".to_string(), 3), ("def".to_string(), 2)]);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
