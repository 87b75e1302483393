//! One open archive: tables, optional stream index and a file handle
//!
//! Construction reads the prefix and both tables once and keeps the file
//! open for block reads. An archive whose prefix or tables cannot be decoded
//! is not fatal: it is logged and becomes a permanently empty index, so one
//! foreign or damaged file does not take down the whole directory.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use decima_formats::path::format_fingerprint;
use decima_formats::{
    ArchiveHeader, ArchiveTables, Block, BlockDecompressor, BlockWindow, CodecError, Record,
    StreamIndex,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{Result, StorageConfig, UNKNOWN_DIR};

/// File-backed index over a single archive
pub struct ArchiveIndex {
    path: PathBuf,
    /// `None` when the archive could not be decoded
    header: Option<ArchiveHeader>,
    records: BTreeMap<u64, Record>,
    blocks: Vec<Block>,
    stream_index: Option<StreamIndex>,
    file: Mutex<File>,
    decompressor: Arc<dyn BlockDecompressor>,
}

/// Serializable overview of an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Archive path
    pub path: PathBuf,
    /// Whether the header and tables decoded
    pub usable: bool,
    /// Load priority, absent for unusable archives
    pub load_priority: Option<i32>,
    /// Distinct fingerprints
    pub record_count: usize,
    /// Block table length
    pub block_count: usize,
    /// Block stride
    pub max_block_size: usize,
    /// Decompressed address space size
    pub decompressed_size: u64,
    /// Compressed payload size
    pub compressed_size: u64,
    /// Stream index entries, absent when no sidecar was loaded
    pub stream_index_entries: Option<usize>,
    /// Name of the block decompressor
    pub codec: String,
}

impl ArchiveIndex {
    /// Open an archive with the codec selected in `config`
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Io`] if the archive or its sidecar
    /// cannot be opened or read. Undecodable or truncated archive contents
    /// are logged and yield an empty index instead.
    pub fn open<P: AsRef<Path>>(path: P, config: &StorageConfig) -> Result<Self> {
        Self::open_with_decompressor(path, config, Arc::new(config.codec))
    }

    /// Open an archive with a caller-supplied block decompressor
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveIndex::open`]
    pub fn open_with_decompressor<P: AsRef<Path>>(
        path: P,
        config: &StorageConfig,
        decompressor: Arc<dyn BlockDecompressor>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let tables = match ArchiveTables::read(&mut BufReader::new(&mut file)) {
            Ok(tables) => Some(tables),
            Err(e) if e.is_bad_magic() => {
                error!("{} is not an archive: {}", path.display(), e);
                None
            }
            Err(e) => match e.into_io_error() {
                Ok(io) => return Err(io.into()),
                Err(e) => {
                    error!("Unusable archive {}: {}", path.display(), e);
                    None
                }
            },
        };

        let mut index = Self {
            path,
            header: None,
            records: BTreeMap::new(),
            blocks: Vec::new(),
            stream_index: None,
            file: Mutex::new(file),
            decompressor,
        };

        if let Some(tables) = tables {
            index.load_tables(tables);
            if config.load_stream_indices {
                index.load_stream_index(&config.index_extension)?;
            }
        }

        Ok(index)
    }

    fn load_tables(&mut self, tables: ArchiveTables) {
        let ArchiveTables {
            header,
            records,
            blocks,
        } = tables;

        for record in records {
            if let Some(previous) = self.records.insert(record.fingerprint, record) {
                warn!(
                    "Duplicate fingerprint {} in {} (file ids {} and {}), keeping the later record",
                    format_fingerprint(record.fingerprint),
                    self.path.display(),
                    previous.file_id,
                    record.file_id
                );
            }
        }

        info!(
            "Opened archive {} (priority {}, {} records, {} blocks)",
            self.path.display(),
            header.load_priority,
            self.records.len(),
            blocks.len()
        );

        self.header = Some(header);
        self.blocks = blocks;
    }

    fn load_stream_index(&mut self, extension: &str) -> Result<()> {
        let sidecar = self.path.with_extension(extension);
        if !sidecar.is_file() {
            debug!("No stream index for {}", self.path.display());
            return Ok(());
        }

        let data = std::fs::read(&sidecar)?;
        let stream_index = match StreamIndex::parse(&data) {
            Ok(parsed) => {
                info!(
                    "Loaded stream index {} ({} entries)",
                    sidecar.display(),
                    parsed.len()
                );
                parsed
            }
            Err(e) => {
                error!("Ignoring stream index {}: {}", sidecar.display(), e);
                StreamIndex::default()
            }
        };
        self.stream_index = Some(stream_index);
        Ok(())
    }

    /// Read the full contents of the record with this fingerprint
    ///
    /// Returns an empty vector when the archive has no such record.
    ///
    /// # Errors
    ///
    /// - [`crate::StorageError::Format`] if the record or one of its blocks
    ///   describes an impossible range
    /// - [`crate::StorageError::Codec`] if a block fails to decompress to its
    ///   declared size
    /// - [`crate::StorageError::Io`] if seeking or reading the archive fails
    pub fn read(&self, fingerprint: u64) -> Result<Vec<u8>> {
        let (Some(record), Some(header)) = (self.records.get(&fingerprint), &self.header) else {
            return Ok(Vec::new());
        };

        let stride = header.max_block_size();
        let window = BlockWindow::for_record(record, stride)?;
        if window.size == 0 {
            return Ok(Vec::new());
        }
        let blocks = window.blocks_to_read(self.blocks.len())?;

        let mut buffer = vec![0u8; window.buffer_len()];
        let mut compressed = Vec::new();
        {
            let mut file = self.file.lock();
            for block_index in blocks {
                let block = &self.blocks[block_index];
                block.validate(block_index, self.blocks.len(), stride)?;

                let (offset, length) = block.compressed_range();
                compressed.resize(length, 0);
                file.seek(SeekFrom::Start(offset))?;
                file.read_exact(&mut compressed)?;

                let start = window.buffer_offset(block_index);
                let expected = block.decompressed_len();
                let written = self
                    .decompressor
                    .decompress(&compressed, &mut buffer[start..start + expected])?;
                if written != expected {
                    return Err(CodecError::SizeMismatch {
                        codec: self.decompressor.name(),
                        expected,
                        actual: written,
                    }
                    .into());
                }
            }
        }

        Ok(buffer[window.slice_range()].to_vec())
    }

    /// Whether the archive holds a record with this fingerprint
    pub fn file_exists(&self, fingerprint: u64) -> bool {
        self.records.contains_key(&fingerprint)
    }

    /// Record for a fingerprint
    pub fn record(&self, fingerprint: u64) -> Option<&Record> {
        self.records.get(&fingerprint)
    }

    /// Records in ascending fingerprint order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Number of distinct fingerprints
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Block table in file order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Decoded header, `None` for an unusable archive
    pub fn header(&self) -> Option<&ArchiveHeader> {
        self.header.as_ref()
    }

    /// Whether the header and tables decoded
    pub fn is_usable(&self) -> bool {
        self.header.is_some()
    }

    /// Load priority; an unusable archive sorts after everything
    pub fn load_priority(&self) -> i32 {
        self.header.map_or(i32::MAX, |h| h.load_priority)
    }

    /// Sidecar stream index, if one was found
    pub fn stream_index(&self) -> Option<&StreamIndex> {
        self.stream_index.as_ref()
    }

    /// Archive path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive file name for display
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy(), |n| n.to_string_lossy())
    }

    /// Relative path a record is presented under
    ///
    /// Uses the stream index path without its type prefix, or
    /// `__unknown/<fingerprint>.bin` when the path is not known.
    pub fn display_path(&self, fingerprint: u64) -> String {
        self.stream_index
            .as_ref()
            .and_then(|s| s.get(fingerprint))
            .map_or_else(
                || format!("{UNKNOWN_DIR}/{}.bin", format_fingerprint(fingerprint)),
                |entry| entry.unwrapped_path().to_string(),
            )
    }

    /// Overview for reporting
    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            path: self.path.clone(),
            usable: self.is_usable(),
            load_priority: self.header.map(|h| h.load_priority),
            record_count: self.records.len(),
            block_count: self.blocks.len(),
            max_block_size: self.header.map_or(0, |h| h.max_block_size()),
            decompressed_size: self.header.map_or(0, |h| h.decompressed_size.max(0) as u64),
            compressed_size: self.header.map_or(0, |h| h.compressed_size.max(0) as u64),
            stream_index_entries: self.stream_index.as_ref().map(StreamIndex::len),
            codec: self.decompressor.name().to_string(),
        }
    }
}

impl fmt::Debug for ArchiveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveIndex")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("records", &self.records.len())
            .field("blocks", &self.blocks.len())
            .field(
                "stream_index",
                &self.stream_index.as_ref().map(StreamIndex::len),
            )
            .field("decompressor", &self.decompressor.name())
            .finish_non_exhaustive()
    }
}
