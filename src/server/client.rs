//! Client for connecting to the index server daemon

use crate::engine::ReindexSummary;
use crate::server::get_socket_path;
use crate::server::protocol::{
    read_message, write_message, MatchesResponse, Request, Response, StatusResponse,
};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Read/write timeout. Index and add-root requests wait for a full rebuild.
const IO_TIMEOUT: Duration = Duration::from_secs(600);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Index server is not running")]
    NotRunning,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Invalid response from server")]
    InvalidResponse,
}

/// Client for the index server
pub struct IndexClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl IndexClient {
    /// Try to connect to the running daemon
    /// Returns None if daemon is not running (allowing fallback to direct mode)
    pub fn connect() -> Option<Self> {
        Self::connect_to(&get_socket_path())
    }

    /// Connect to the daemon listening on `socket_path`
    pub fn connect_to(socket_path: &Path) -> Option<Self> {
        // Quick check if socket exists
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Connect or return an error (for when daemon is required)
    pub fn connect_required() -> ClientResult<Self> {
        Self::connect().ok_or(ClientError::NotRunning)
    }

    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::Server(message)),
            response => Ok(response),
        }
    }

    /// Fuzzy-match `word`
    pub fn query(&mut self, word: &str) -> ClientResult<MatchesResponse> {
        match self.call(&Request::Query { word: word.to_string() })? {
            Response::Matches(matches) => Ok(matches),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Rebuild the index. `None` means a rebuild was already running.
    pub fn index(&mut self) -> ClientResult<Option<ReindexSummary>> {
        match self.call(&Request::Index)? {
            Response::Indexed { summary } => Ok(summary),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn add_root(&mut self, root: &Path) -> ClientResult<ReindexSummary> {
        let request = Request::AddRoot {
            root: root.to_path_buf(),
        };
        match self.call(&request)? {
            Response::Indexed { summary: Some(summary) } => Ok(summary),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn roots(&mut self) -> ClientResult<Vec<PathBuf>> {
        match self.call(&Request::Roots)? {
            Response::Roots { roots } => Ok(roots),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn clear(&mut self) -> ClientResult<()> {
        match self.call(&Request::Clear)? {
            Response::Cleared => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}
