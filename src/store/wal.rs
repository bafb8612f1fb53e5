//! Record I/O for the path log.
//!
//! Each record is written in one positional write at the logical end of the
//! log, so a crash can only leave a partial record at the tail. A write that
//! fails is rolled back before the error is returned. [`PathLog::replay`]
//! walks complete records and reports where the last one ends; anything past
//! that point is torn.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use log::warn;

use super::{MAX_RECORD_LEN, PathId, StoreError, StoreResult};

/// Size of the little-endian length prefix.
pub const LEN_PREFIX: u64 = 2;

/// Append-only log of length-prefixed records.
#[derive(Debug)]
pub struct PathLog {
    path: PathBuf,
    file: File,
    /// Bytes considered part of the log. Reads never go past this point.
    len: u64,
    /// Keep only this many bytes of the next record, then fail
    #[cfg(test)]
    short_write: Option<usize>,
}

impl PathLog {
    /// Open (or create) the log file.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            #[cfg(test)]
            short_write: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a record and return its starting offset.
    pub fn append(&mut self, bytes: &[u8]) -> StoreResult<PathId> {
        if bytes.len() > MAX_RECORD_LEN {
            return Err(StoreError::OversizeString { len: bytes.len() });
        }
        let offset =
            PathId::try_from(self.len).map_err(|_| StoreError::LogFull { len: self.len })?;

        let mut record = Vec::with_capacity(LEN_PREFIX as usize + bytes.len());
        record.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        record.extend_from_slice(bytes);

        if let Err(e) = self.write_record(&record) {
            // Drop whatever part of the record reached the file
            if let Err(rollback) = self.file.set_len(self.len) {
                warn!(
                    "failed to roll back partial record at offset {}: {}",
                    self.len, rollback
                );
            }
            return Err(e.into());
        }

        self.len += record.len() as u64;
        Ok(offset)
    }

    #[cfg(not(test))]
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        write_all_at(&self.file, record, self.len)
    }

    #[cfg(test)]
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        match self.short_write.take() {
            Some(keep) => {
                write_all_at(&self.file, &record[..keep.min(record.len())], self.len)?;
                Err(io::Error::other("short write"))
            }
            None => write_all_at(&self.file, record, self.len),
        }
    }

    /// Make the next append write `keep` bytes and then fail.
    #[cfg(test)]
    pub(crate) fn fail_next_write(&mut self, keep: usize) {
        self.short_write = Some(keep);
    }

    /// Read the record starting at `offset`.
    pub fn read_record(&self, offset: PathId) -> StoreResult<Vec<u8>> {
        let start = offset as u64;
        if start + LEN_PREFIX > self.len {
            return Err(StoreError::NotFound);
        }

        let mut len_buf = [0u8; 2];
        read_exact_at(&self.file, &mut len_buf, start)?;
        let record_len = u16::from_le_bytes(len_buf) as u64;

        if start + LEN_PREFIX + record_len > self.len {
            return Err(StoreError::NotFound);
        }

        let mut buf = vec![0u8; record_len as usize];
        read_exact_at(&self.file, &mut buf, start + LEN_PREFIX)?;
        Ok(buf)
    }

    /// Walk every complete record from offset 0, calling `visit` for each.
    ///
    /// Stops at the first short read and returns the offset just past the
    /// last complete record.
    pub fn replay<F>(&self, mut visit: F) -> io::Result<u64>
    where
        F: FnMut(PathId, &[u8]),
    {
        // Separate handle so the scan has its own cursor.
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut offset = 0u64;
        let mut len_buf = [0u8; 2];
        let mut buf = Vec::new();

        while offset <= PathId::MAX as u64 {
            if !read_or_eof(&mut reader, &mut len_buf)? {
                break;
            }
            buf.resize(u16::from_le_bytes(len_buf) as usize, 0);
            if !read_or_eof(&mut reader, &mut buf)? {
                break;
            }

            visit(offset as PathId, &buf);
            offset += LEN_PREFIX + buf.len() as u64;
        }

        Ok(offset)
    }

    /// Cut the log back to `len` bytes, dropping a torn tail.
    pub fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.len = len;
        Ok(())
    }

    /// Flush and fsync.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}

/// `read_exact` that reports a clean or torn EOF as `false`.
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
