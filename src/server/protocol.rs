//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::engine::ReindexSummary;
use crate::index::stats::IndexStats;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Largest message either side accepts
pub const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Fuzzy-match a query word
    Query { word: String },

    /// Rebuild from every root
    Index,

    /// Add a root and rebuild
    AddRoot { root: PathBuf },

    /// List the root set
    Roots,

    /// Check server health and get stats
    Status,

    /// Drop the path log and the index
    Clear,

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Query results
    Matches(MatchesResponse),

    /// A rebuild finished, or was skipped because one was running
    Indexed { summary: Option<ReindexSummary> },

    Roots { roots: Vec<PathBuf> },

    /// Server status
    Status(StatusResponse),

    Cleared,

    /// Shutdown acknowledged
    ShuttingDown,

    /// Pong response
    Pong,

    /// Error response
    Error { message: String },
}

/// Query results response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchesResponse {
    /// Matching paths, best first
    pub paths: Vec<String>,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether results came from cache
    pub cached: bool,
}

/// Server status response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Total queries served
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    /// Seconds between scheduled reindexes, 0 if disabled
    pub reindex_interval_secs: u64,
    pub stats: IndexStats,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    if json.len() > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })
}
