//! Stream index files sit next to an archive (`foo.bin` → `foo.idx`) and
//! list the virtual paths packed into it. Archives only store fingerprints,
//! so this is the only way back to readable names.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic:u32 = 0x10203040
//! entry_count:i32
//! entry_count × { path_len:i32, path:[u8; path_len], checksum:[u8; 16], offset:u64, size:u64 }
//! ```
//!
//! The offset and size fields describe the entry but are never used to
//! read data; reads always go through the archive's record table.

use std::collections::HashMap;

use binrw::BinReaderExt;
use binrw::io::{Cursor, Read};

use crate::error::{FormatError, FormatResult};
use crate::path::{fingerprint_bytes, unwrap_path};

/// Magic value at offset 0 of every stream index
pub const STREAM_INDEX_MAGIC: u32 = 0x1020_3040;

/// Length of the per-entry checksum
pub const CHECKSUM_SIZE: usize = 16;

/// One path entry from a stream index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIndexEntry {
    /// Virtual path, including its type prefix
    pub path: String,
    /// Checksum as stored
    pub checksum: [u8; CHECKSUM_SIZE],
    /// Fingerprint recomputed from `path`
    pub fingerprint: u64,
    /// Descriptive offset
    pub offset: u64,
    /// Descriptive size
    pub size: u64,
}

impl StreamIndexEntry {
    /// Path with the type prefix removed
    pub fn unwrapped_path(&self) -> &str {
        unwrap_path(&self.path)
    }

    /// Checksum as lowercase hex
    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }
}

/// Parsed stream index with fingerprint lookup
#[derive(Debug, Clone, Default)]
pub struct StreamIndex {
    entries: Vec<StreamIndexEntry>,
    table: HashMap<u64, usize>,
}

impl StreamIndex {
    /// Parse a complete stream index file
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        let mut cursor = Cursor::new(data);

        let magic: u32 = cursor.read_le()?;
        if magic != STREAM_INDEX_MAGIC {
            return Err(FormatError::BadMagic {
                format: "stream index",
                expected: STREAM_INDEX_MAGIC,
                actual: magic,
            });
        }

        let count: i32 = cursor.read_le()?;
        let count = usize::try_from(count).map_err(|_| FormatError::InvalidStreamEntry {
            index: 0,
            reason: format!("negative entry count {count}"),
        })?;

        // Every entry needs at least 36 bytes, so a huge count cannot reserve
        // more than the data could describe
        let mut index = Self {
            entries: Vec::with_capacity(count.min(data.len() / 36)),
            table: HashMap::with_capacity(count.min(data.len() / 36)),
        };

        for position in 0..count {
            let entry = read_entry(&mut cursor, position)?;
            index.table.insert(entry.fingerprint, position);
            index.entries.push(entry);
        }

        Ok(index)
    }

    /// Entry for a fingerprint; on duplicate paths the later entry wins
    pub fn get(&self, fingerprint: u64) -> Option<&StreamIndexEntry> {
        self.table.get(&fingerprint).map(|&i| &self.entries[i])
    }

    /// Whether the index names this fingerprint
    pub fn contains(&self, fingerprint: u64) -> bool {
        self.table.contains_key(&fingerprint)
    }

    /// All entries in file order
    pub fn entries(&self) -> &[StreamIndexEntry] {
        &self.entries
    }

    /// Number of entries in file order (duplicates included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entry(cursor: &mut Cursor<&[u8]>, index: usize) -> FormatResult<StreamIndexEntry> {
    let path_len: i32 = cursor.read_le()?;
    let path_len = usize::try_from(path_len).map_err(|_| FormatError::InvalidStreamEntry {
        index,
        reason: format!("negative path length {path_len}"),
    })?;

    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if path_len as u64 > remaining {
        return Err(FormatError::InvalidStreamEntry {
            index,
            reason: format!("path length {path_len} exceeds remaining {remaining} bytes"),
        });
    }

    let mut raw_path = vec![0u8; path_len];
    cursor.read_exact(&mut raw_path)?;

    let mut checksum = [0u8; CHECKSUM_SIZE];
    cursor.read_exact(&mut checksum)?;

    let offset: u64 = cursor.read_le()?;
    let size: u64 = cursor.read_le()?;

    Ok(StreamIndexEntry {
        fingerprint: fingerprint_bytes(&raw_path),
        path: String::from_utf8_lossy(&raw_path).into_owned(),
        checksum,
        offset,
        size,
    })
}
