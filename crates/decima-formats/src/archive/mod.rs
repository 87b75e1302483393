//! Archive (`.bin`) layout
//!
//! An archive starts with a 40-byte prefix (magic plus [`ArchiveHeader`]),
//! followed by `record_count` [`Record`]s and `block_count` [`Block`]s. All
//! fields are little-endian and packed without padding.
//!
//! ```text
//! +--------+---------------+------------------+-----------------+---------
//! | magic  | ArchiveHeader | Record × count   | Block × count   | payload
//! | 4 B    | 36 B          | 32 B each        | 32 B each       | compressed blocks
//! +--------+---------------+------------------+-----------------+---------
//! ```
//!
//! Records address the archive's decompressed stream. The stream is cut
//! into windows of `max_block_size` bytes; block `n` holds bytes
//! `n * max_block_size ..` and is compressed on its own, so a record is read
//! by decompressing the whole blocks covering it and slicing the result (see
//! [`BlockWindow`]).

mod header;
mod window;

pub use header::{ArchiveHeader, ArchiveTables, Block, Record};
pub use window::BlockWindow;

/// Archive layout constants
pub mod constants {
    /// Magic value at offset 0 of every archive
    pub const ARCHIVE_MAGIC: u32 = 0x2030_4050;

    /// Size of the header fields following the magic
    pub const HEADER_SIZE: usize = 36;

    /// Magic plus header, the fixed prefix read before anything else
    pub const PREFIX_SIZE: usize = 4 + HEADER_SIZE;

    /// Size of one record table entry
    pub const RECORD_SIZE: usize = 32;

    /// Size of one block table entry
    pub const BLOCK_SIZE: usize = 32;

    /// `load_priority` of patch archives, which override everything else
    pub const PATCH_LOAD_PRIORITY: i32 = 0;

    /// `load_priority` observed on bulk base-game archives
    pub const BASE_LOAD_PRIORITY: i32 = 32758;
}
