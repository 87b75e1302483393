//! Error types for format parsing

use std::io::ErrorKind;

use thiserror::Error;

/// Format parsing result type
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while decoding archive and stream index structures
#[derive(Debug, Error)]
pub enum FormatError {
    /// Leading magic constant does not match the expected format
    #[error("invalid {format} magic: expected {expected:#010x}, got {actual:#010x}")]
    BadMagic {
        /// Which structure was being parsed
        format: &'static str,
        /// Expected magic value
        expected: u32,
        /// Magic value found in the data
        actual: u32,
    },

    /// Header field outside its valid range
    #[error("invalid archive header: {0}")]
    InvalidHeader(String),

    /// Record describes an impossible byte range
    #[error("invalid record {fingerprint:016x}: {reason}")]
    InvalidRecord {
        /// Fingerprint of the offending record
        fingerprint: u64,
        /// What is wrong with it
        reason: String,
    },

    /// Block table entry outside its valid range
    #[error("invalid block {index}: {reason}")]
    InvalidBlock {
        /// Position of the block in the block table
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Record needs blocks past the end of the block table
    #[error("block window {first}..{end} exceeds block count {block_count}")]
    BlockWindowOutOfRange {
        /// First block of the window
        first: usize,
        /// One past the last block the record needs
        end: usize,
        /// Blocks declared by the archive header
        block_count: usize,
    },

    /// Stream index entry could not be decoded
    #[error("invalid stream index entry {index}: {reason}")]
    InvalidStreamEntry {
        /// Position of the entry in the stream index
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Binary read error
    #[error("binary format error: {0}")]
    BinRead(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Check whether the error was caused by a magic mismatch
    pub fn is_bad_magic(&self) -> bool {
        matches!(self, Self::BadMagic { .. })
    }

    /// Check whether the data simply ended too early
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == ErrorKind::UnexpectedEof,
            Self::BinRead(e) => e.is_eof(),
            _ => false,
        }
    }

    /// Split off an underlying I/O failure that is not an early end of data
    ///
    /// Truncation and decoding errors describe the bytes and are returned
    /// unchanged in `Err`.
    pub fn into_io_error(self) -> Result<std::io::Error, Self> {
        match self {
            Self::Io(e) if e.kind() != ErrorKind::UnexpectedEof => Ok(e),
            Self::BinRead(binrw::Error::Io(e)) if e.kind() != ErrorKind::UnexpectedEof => Ok(e),
            other => Err(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Error;

    #[test]
    fn test_into_io_error_keeps_read_failures() {
        let err = FormatError::BinRead(binrw::Error::Io(Error::from(ErrorKind::PermissionDenied)));
        assert_eq!(err.into_io_error().unwrap().kind(), ErrorKind::PermissionDenied);

        let err = FormatError::Io(Error::from(ErrorKind::Other));
        assert!(err.into_io_error().is_ok());
    }

    #[test]
    fn test_into_io_error_leaves_truncation() {
        let err = FormatError::BinRead(binrw::Error::Io(Error::from(ErrorKind::UnexpectedEof)));
        assert!(err.into_io_error().unwrap_err().is_truncated());

        let err = FormatError::InvalidHeader("negative block count -1".to_string());
        assert!(err.into_io_error().is_err());
    }
}
