//! Binary format parsers for Decima layered cache archives
//!
#![allow(clippy::cast_possible_wrap)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
//! This crate holds the I/O-free half of the archive reader: every on-disk
//! structure is decoded field by field in little-endian order, and nothing
//! here touches the filesystem or logs. The `decima-storage` crate owns file
//! handles and decides which of the errors returned here are fatal.
//!
//! # Supported Formats
//!
//! - **Archive (`.bin`)**: header, record table and block table of a
//!   block-compressed archive
//! - **Stream index (`.idx`)**: optional sidecar mapping fingerprints back to
//!   virtual paths and checksums
//!
//! # Addressing
//!
//! Every logical file is addressed by a 64-bit fingerprint of its virtual
//! path (see [`path::fingerprint`]). A record places the file inside the
//! archive's *decompressed* address space, which is cut into fixed-stride
//! blocks that are compressed independently:
//!
//! ```text
//! fingerprint → Record(offset, size) → BlockWindow → Blocks → decompress → slice
//! ```

#![warn(missing_docs)]

/// Archive header, record and block layouts plus block-window arithmetic
pub mod archive;
/// Block decompression codecs
pub mod codec;
mod error;
/// MurmurHash3 x64/128
pub mod murmur3;
/// Virtual path helpers and fingerprinting
pub mod path;
/// Sidecar stream index (`.idx`) parsing
pub mod stream_index;

pub use archive::{ArchiveHeader, ArchiveTables, Block, BlockWindow, Record};
pub use codec::{BlockDecompressor, Codec, CodecError, CodecResult};
pub use error::{FormatError, FormatResult};
pub use path::{fingerprint, fingerprint_bytes, path_type, unwrap_path};
pub use stream_index::{StreamIndex, StreamIndexEntry};
