//! Archive header, record and block table entries

use binrw::io::{Cursor, Read, Seek};
use binrw::{BinRead, BinReaderExt, BinWrite};

use super::constants::{ARCHIVE_MAGIC, PREFIX_SIZE};
use crate::error::{FormatError, FormatResult};

/// Upper bound on table entries reserved up front, so a corrupt count fails
/// on the read instead of on the allocation
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 16;

/// Fixed archive header, following the magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ArchiveHeader {
    /// Override precedence; smaller values win
    pub load_priority: i32,
    /// Total compressed payload size
    pub compressed_size: i64,
    /// Size of the decompressed address space
    pub decompressed_size: i64,
    /// Number of record table entries
    pub record_count: i64,
    /// Number of block table entries
    pub block_count: i32,
    /// Stride of the decompressed block windows
    pub max_block_size: i32,
}

impl ArchiveHeader {
    /// Parse the 40-byte prefix (magic plus header) from a byte slice
    pub fn parse_prefix(prefix: &[u8]) -> FormatResult<Self> {
        let mut cursor = Cursor::new(prefix);
        Self::read_prefix(&mut cursor)
    }

    /// Read the magic and header from the current reader position
    pub fn read_prefix<R: Read + Seek>(reader: &mut R) -> FormatResult<Self> {
        let magic: u32 = reader.read_le()?;
        if magic != ARCHIVE_MAGIC {
            return Err(FormatError::BadMagic {
                format: "archive",
                expected: ARCHIVE_MAGIC,
                actual: magic,
            });
        }

        let header: Self = reader.read_le()?;
        header.validate()?;
        Ok(header)
    }

    /// Check that counts and sizes are usable
    pub fn validate(&self) -> FormatResult<()> {
        if self.record_count < 0 {
            return Err(FormatError::InvalidHeader(format!(
                "negative record count {}",
                self.record_count
            )));
        }
        if self.block_count < 0 {
            return Err(FormatError::InvalidHeader(format!(
                "negative block count {}",
                self.block_count
            )));
        }
        if self.max_block_size <= 0 {
            return Err(FormatError::InvalidHeader(format!(
                "max block size must be positive, got {}",
                self.max_block_size
            )));
        }
        if self.decompressed_size < 0 || self.compressed_size < 0 {
            return Err(FormatError::InvalidHeader(format!(
                "negative stream size (compressed {}, decompressed {})",
                self.compressed_size, self.decompressed_size
            )));
        }
        Ok(())
    }

    /// Record count as a table length
    pub fn record_count(&self) -> usize {
        usize::try_from(self.record_count).unwrap_or(0)
    }

    /// Block count as a table length
    pub fn block_count(&self) -> usize {
        usize::try_from(self.block_count).unwrap_or(0)
    }

    /// Block stride in bytes
    pub fn max_block_size(&self) -> usize {
        usize::try_from(self.max_block_size).unwrap_or(0)
    }

    /// Number of blocks needed to cover the decompressed address space
    pub fn expected_block_count(&self) -> u64 {
        let stride = self.max_block_size.max(1) as u64;
        (self.decompressed_size.max(0) as u64).div_ceil(stride)
    }

    /// File offset just past the block table
    pub fn tables_end(&self) -> u64 {
        PREFIX_SIZE as u64
            + self.record_count.max(0) as u64 * super::constants::RECORD_SIZE as u64
            + self.block_count.max(0) as u64 * super::constants::BLOCK_SIZE as u64
    }
}

/// Record table entry describing one logical file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Record {
    /// Sequential file id assigned by the packer
    pub file_id: i32,
    /// Unused
    pub reserved1: i32,
    /// Path fingerprint
    pub fingerprint: u64,
    /// Offset into the decompressed address space
    pub logical_offset: i64,
    /// Length in the decompressed address space
    pub logical_size: i32,
    /// Unused
    pub reserved2: i32,
}

impl Record {
    /// One past the last decompressed byte of this record
    pub fn end(&self) -> i64 {
        self.logical_offset.saturating_add(i64::from(self.logical_size))
    }

    /// Whether the record lies inside a decompressed stream of the given size
    pub fn fits_within(&self, decompressed_size: i64) -> bool {
        self.logical_offset >= 0 && self.logical_size >= 0 && self.end() <= decompressed_size
    }
}

/// Block table entry describing one compressed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Block {
    /// Start of the window in the decompressed address space
    pub decompressed_offset: i64,
    /// Decompressed length; equals `max_block_size` except for the last block
    pub decompressed_size: i32,
    /// Unused
    pub reserved1: i32,
    /// File offset of the compressed bytes
    pub compressed_offset: i64,
    /// Compressed length
    pub compressed_size: i32,
    /// Unused
    pub reserved2: i32,
}

impl Block {
    /// Check the block against the archive's stride
    ///
    /// Every block except the last in a table of `block_count` must fill the
    /// whole stride; only the last may be shorter.
    pub fn validate(
        &self,
        index: usize,
        block_count: usize,
        max_block_size: usize,
    ) -> FormatResult<()> {
        if self.compressed_offset < 0 || self.compressed_size < 0 {
            return Err(FormatError::InvalidBlock {
                index,
                reason: format!(
                    "negative compressed range {}+{}",
                    self.compressed_offset, self.compressed_size
                ),
            });
        }
        let size = match usize::try_from(self.decompressed_size) {
            Ok(size) if size <= max_block_size => size,
            _ => {
                return Err(FormatError::InvalidBlock {
                    index,
                    reason: format!(
                        "decompressed size {} outside 0..={}",
                        self.decompressed_size, max_block_size
                    ),
                });
            }
        };
        if index + 1 < block_count && size != max_block_size {
            return Err(FormatError::InvalidBlock {
                index,
                reason: format!("non-final block holds {size} bytes, stride is {max_block_size}"),
            });
        }
        Ok(())
    }

    /// Compressed byte range as `(file_offset, length)`
    pub fn compressed_range(&self) -> (u64, usize) {
        (
            self.compressed_offset.max(0) as u64,
            usize::try_from(self.compressed_size).unwrap_or(0),
        )
    }

    /// Decompressed length as a buffer length
    pub fn decompressed_len(&self) -> usize {
        usize::try_from(self.decompressed_size).unwrap_or(0)
    }
}

/// Header plus both tables of one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTables {
    /// Archive header
    pub header: ArchiveHeader,
    /// Record table in file order
    pub records: Vec<Record>,
    /// Block table in file order
    pub blocks: Vec<Block>,
}

impl ArchiveTables {
    /// Read the prefix and both tables from the start of an archive
    pub fn read<R: Read + Seek>(reader: &mut R) -> FormatResult<Self> {
        let header = ArchiveHeader::read_prefix(reader)?;
        let records = read_table(reader, header.record_count())?;
        let blocks = read_table(reader, header.block_count())?;

        Ok(Self {
            header,
            records,
            blocks,
        })
    }

    /// Parse an archive prefix and tables held in memory
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        Self::read(&mut Cursor::new(data))
    }
}

fn read_table<T, R>(reader: &mut R, count: usize) -> FormatResult<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()>,
    R: Read + Seek,
{
    let mut entries = Vec::with_capacity(count.min(MAX_PREALLOCATED_ENTRIES));
    for _ in 0..count {
        entries.push(reader.read_le()?);
    }
    Ok(entries)
}
