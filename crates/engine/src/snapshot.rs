//! Snapshot persistence.
//!
//! A snapshot is the full keyspace as framed `(key, record)` pairs:
//!
//! ```text
//! magic "TDBSNAP1" | version u32 | count u64 | frames... | crc32 u32
//! ```
//!
//! Each frame is a u32 length prefix plus a bincode [`SnapshotRecord`].
//! The trailing crc32 covers every frame; a mismatch on load is reported
//! as corruption rather than silently yielding partial state. Stats are
//! operational state and are not part of a snapshot.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tensordb_core::{Backend, DType, Device, Error, Result};
use tracing::info;

const MAGIC: &[u8; 8] = b"TDBSNAP1";
const VERSION: u32 = 1;

/// One persisted keyspace entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// The keyspace key.
    pub key: String,
    /// The persisted value.
    pub value: RecordValue,
}

/// Persisted form of a keyspace value: `(type_tag, metadata, raw_bytes)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    /// A tensor: dtype/shape metadata plus the raw buffer.
    Tensor {
        /// Element type.
        dtype: DType,
        /// Ordered dimensions.
        shape: Vec<usize>,
        /// Raw little-endian buffer.
        data: Vec<u8>,
    },
    /// A model: metadata plus the original blob.
    Model {
        /// Backend tag.
        backend: Backend,
        /// Execution target.
        device: Device,
        /// Opaque user tag.
        tag: String,
        /// Declared input names (graphs only).
        inputs: Vec<String>,
        /// Declared output names (graphs only).
        outputs: Vec<String>,
        /// The original blob.
        blob: Vec<u8>,
    },
    /// A script: device plus the original source.
    Script {
        /// Execution target.
        device: Device,
        /// Opaque user tag.
        tag: String,
        /// The original source text.
        source: String,
    },
    /// A foreign host-native value, persisted verbatim.
    Foreign {
        /// Raw host bytes.
        data: Vec<u8>,
    },
}

/// Write a snapshot to `path`, replacing any existing file.
pub fn write(path: &Path, records: &[SnapshotRecord]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    out.write_all(MAGIC)?;
    out.write_u32::<LittleEndian>(VERSION)?;
    out.write_u64::<LittleEndian>(records.len() as u64)?;

    let mut hasher = crc32fast::Hasher::new();
    for record in records {
        let frame = bincode::serialize(record)?;
        let mut prefixed = Vec::with_capacity(frame.len() + 4);
        prefixed.write_u32::<LittleEndian>(frame.len() as u32)?;
        prefixed.extend_from_slice(&frame);
        hasher.update(&prefixed);
        out.write_all(&prefixed)?;
    }
    out.write_u32::<LittleEndian>(hasher.finalize())?;
    out.flush()?;
    info!(path = %path.display(), records = records.len(), "snapshot written");
    Ok(())
}

/// Read a snapshot from `path`, verifying the header and checksum.
pub fn read(path: &Path) -> Result<Vec<SnapshotRecord>> {
    let file = File::open(path)?;
    let mut input = BufReader::new(file);

    let mut magic = [0u8; 8];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::Corruption("bad snapshot magic".into()));
    }
    let version = input.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(Error::Corruption(format!(
            "unsupported snapshot version {}",
            version
        )));
    }
    let count = input.read_u64::<LittleEndian>()?;

    let mut hasher = crc32fast::Hasher::new();
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = input.read_u32::<LittleEndian>()?;
        let mut frame = vec![0u8; len as usize];
        input.read_exact(&mut frame)?;

        let mut prefixed = Vec::with_capacity(frame.len() + 4);
        prefixed.write_u32::<LittleEndian>(len)?;
        prefixed.extend_from_slice(&frame);
        hasher.update(&prefixed);

        records.push(bincode::deserialize(&frame)?);
    }
    let stored = input.read_u32::<LittleEndian>()?;
    if stored != hasher.finalize() {
        return Err(Error::Corruption("snapshot checksum mismatch".into()));
    }
    Ok(records)
}
