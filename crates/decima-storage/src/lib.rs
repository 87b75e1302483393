//! File-backed access to directories of Decima cache archives.
//!
//! A game install ships a directory of `.bin` archives. Each archive maps
//! path fingerprints to byte ranges of its block-compressed payload; patch
//! archives override base archives through a signed load priority where the
//! smaller value wins.
//!
//! - [`ArchiveIndex`] owns one open archive: its tables, its optional `.idx`
//!   stream index and a file handle for block reads.
//! - [`ArchiveSet`] scans a directory, opens every archive and resolves each
//!   fingerprint to exactly one owning archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use decima_storage::{ArchiveSet, StorageConfig};
//!
//! # fn example() -> decima_storage::Result<()> {
//! let set = ArchiveSet::open("/path/to/LocalCacheWinGame/package", &StorageConfig::default())?;
//! let bytes = set.read("cache:models/characters/humans/aloy.core")?;
//! println!("{} archives, {} bytes", set.len(), bytes.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

use thiserror::Error;

// Single archive access
pub mod archive_index;

// Directory-level ownership resolution
pub mod archive_set;

// Configuration
pub mod config;

pub use archive_index::{ArchiveIndex, ArchiveSummary};
pub use archive_set::{ArchiveSet, FileKey};
pub use config::{DiscoveryOrder, StorageConfig};

use decima_formats::{CodecError, FormatError};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive or stream index structure is invalid.
    #[error("Invalid format: {0}")]
    Format(#[from] FormatError),

    /// Block decompression failed.
    #[error("Decompression error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Default archive file extension.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "bin";

/// Default stream index file extension.
///
/// The stream index shares the archive's stem: `foo.bin` pairs with `foo.idx`.
pub const DEFAULT_INDEX_EXTENSION: &str = "idx";

/// Presentation directory for records that have no stream index entry.
pub const UNKNOWN_DIR: &str = "__unknown";
