use crate::index::types::*;
use crate::utils::{delta_decode, delta_encode, read_u32_at, write_u32_le, META_FILE, SNAPSHOT_FILE};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"PFTG";
const HEADER_LEN: usize = 12;

/// The published trigram mapping and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    pub mapping: TrigramMap,
    pub meta: IndexMeta,
}

impl IndexSnapshot {
    pub fn new(mapping: TrigramMap, meta: IndexMeta) -> Self {
        Self { mapping, meta }
    }

    /// Ids posted under `trigram`, ascending.
    pub fn get(&self, trigram: Trigram) -> &[PathId] {
        self.mapping.get(&trigram).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn trigram_count(&self) -> usize {
        self.mapping.len()
    }

    /// Total number of (trigram, id) postings.
    pub fn posting_count(&self) -> usize {
        self.mapping.values().map(Vec::len).sum()
    }

    pub fn max_id(&self) -> Option<PathId> {
        self.mapping.values().filter_map(|ids| ids.last().copied()).max()
    }

    /// True if some id points past the end of a log of `log_len` bytes.
    pub fn is_stale(&self, log_len: u64) -> bool {
        self.max_id().is_some_and(|id| id as u64 >= log_len)
    }
}

/// Serialize a mapping to the `trigrams.bin` layout.
pub fn encode_mapping(mapping: &TrigramMap) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + mapping.len() * 16);
    buf.extend_from_slice(MAGIC);
    write_u32_le(&mut buf, INDEX_VERSION)?;
    write_u32_le(&mut buf, u32::try_from(mapping.len()).context("Too many trigrams")?)?;

    let mut encoded = Vec::new();
    for (&trigram, ids) in mapping {
        encoded.clear();
        delta_encode(ids, &mut encoded);

        write_u32_le(&mut buf, trigram)?;
        write_u32_le(&mut buf, u32::try_from(ids.len()).context("Posting list too long")?)?;
        write_u32_le(&mut buf, u32::try_from(encoded.len()).context("Posting list too long")?)?;
        buf.extend_from_slice(&encoded);
    }

    Ok(buf)
}

/// Parse the `trigrams.bin` layout, validating every length.
pub fn decode_mapping(data: &[u8]) -> Result<TrigramMap> {
    if data.len() < HEADER_LEN || &data[..4] != MAGIC {
        bail!("Not a trigram snapshot");
    }
    let version = read_u32_at(data, 4).context("Truncated header")?;
    if version != INDEX_VERSION {
        bail!("Unsupported snapshot version {}", version);
    }
    let count = read_u32_at(data, 8).context("Truncated header")? as usize;

    let mut mapping = TrigramMap::new();
    let mut pos = HEADER_LEN;
    let mut prev: Option<Trigram> = None;

    for i in 0..count {
        let field = |at: usize| {
            read_u32_at(data, at).with_context(|| format!("Truncated entry {}", i))
        };
        let trigram = field(pos)?;
        let id_count = field(pos + 4)? as usize;
        let len = field(pos + 8)? as usize;
        pos += 12;

        if prev.is_some_and(|p| p >= trigram) {
            bail!("Trigrams out of order at entry {}", i);
        }
        let body = data
            .get(pos..pos + len)
            .with_context(|| format!("Truncated postings for entry {}", i))?;
        let ids = delta_decode(body, id_count)
            .with_context(|| format!("Corrupt postings for entry {}", i))?;
        if ids.windows(2).any(|w| w[0] >= w[1]) {
            bail!("Posting list of entry {} is not strictly ascending", i);
        }

        mapping.insert(trigram, ids);
        prev = Some(trigram);
        pos += len;
    }

    if pos != data.len() {
        bail!("{} trailing bytes after last entry", data.len() - pos);
    }
    Ok(mapping)
}

/// Write `bytes` next to `path` and rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = BufWriter::new(
            File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?,
        );
        file.write_all(bytes)?;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;
    Ok(())
}

/// Persist `snapshot` into `data_dir`, replacing any previous one.
pub fn write_snapshot(data_dir: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    let bytes = encode_mapping(&snapshot.mapping)?;
    write_atomic(&data_dir.join(SNAPSHOT_FILE), &bytes)?;

    let meta = serde_json::to_vec_pretty(&snapshot.meta).context("Failed to serialize meta")?;
    write_atomic(&data_dir.join(META_FILE), &meta)?;

    debug!(
        "wrote snapshot: {} trigrams, {} bytes",
        snapshot.mapping.len(),
        bytes.len()
    );
    Ok(())
}

/// Read the snapshot in `data_dir`, or `None` if there is none.
pub fn read_snapshot(data_dir: &Path) -> Result<Option<IndexSnapshot>> {
    let bin_path = data_dir.join(SNAPSHOT_FILE);
    let meta_path = data_dir.join(META_FILE);
    if !bin_path.exists() || !meta_path.exists() {
        return Ok(None);
    }

    let meta_file = File::open(&meta_path).context("Failed to open meta.json")?;
    let meta: IndexMeta = serde_json::from_reader(meta_file).context("Failed to parse meta.json")?;

    let file = File::open(&bin_path).context("Failed to open trigrams.bin")?;
    if file.metadata()?.len() == 0 {
        bail!("Empty snapshot {}", bin_path.display());
    }
    let mmap = unsafe { Mmap::map(&file)? };
    let mapping = decode_mapping(&mmap)
        .with_context(|| format!("Failed to decode {}", bin_path.display()))?;

    info!(
        "loaded snapshot: {} trigrams over {} roots",
        mapping.len(),
        meta.roots.len()
    );
    Ok(Some(IndexSnapshot { mapping, meta }))
}

/// Delete the snapshot files, if present.
pub fn remove_snapshot(data_dir: &Path) -> Result<()> {
    for name in [SNAPSHOT_FILE, META_FILE] {
        let path = data_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
        }
    }
    Ok(())
}
