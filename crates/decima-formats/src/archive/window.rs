//! Mapping a record's logical byte range onto fixed-stride blocks

use std::ops::Range;

use super::header::Record;
use crate::error::{FormatError, FormatResult};

/// Blocks covering one record, and where the record sits inside them
///
/// The window follows the packer's arithmetic: `first_block = offset /
/// stride`, `last_block = (offset + size) / stride`. When a record ends
/// exactly on a block boundary this includes one trailing block that holds
/// none of its bytes; [`BlockWindow::blocks_to_read`] drops that block if the
/// archive does not have it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    /// Index of the first block
    pub first_block: usize,
    /// `last_block - first_block + 1`
    pub window_len: usize,
    /// Offset of the record inside the first block
    pub skip: usize,
    /// Record length
    pub size: usize,
    /// Block stride (`max_block_size`)
    pub stride: usize,
}

impl BlockWindow {
    /// Compute the window for a record in an archive with the given stride
    pub fn for_record(record: &Record, max_block_size: usize) -> FormatResult<Self> {
        let invalid = |reason: String| FormatError::InvalidRecord {
            fingerprint: record.fingerprint,
            reason,
        };

        if max_block_size == 0 {
            return Err(invalid("archive has zero block size".to_string()));
        }
        let offset = usize::try_from(record.logical_offset)
            .map_err(|_| invalid(format!("negative offset {}", record.logical_offset)))?;
        let size = usize::try_from(record.logical_size)
            .map_err(|_| invalid(format!("negative size {}", record.logical_size)))?;
        let end = offset
            .checked_add(size)
            .ok_or_else(|| invalid("range overflows".to_string()))?;

        let first_block = offset / max_block_size;
        let last_block = end / max_block_size;

        Ok(Self {
            first_block,
            window_len: last_block - first_block + 1,
            skip: offset % max_block_size,
            size,
            stride: max_block_size,
        })
    }

    /// Size of the assembly buffer: the window plus one block of slack
    pub fn buffer_len(&self) -> usize {
        (self.window_len + 1) * self.stride
    }

    /// Number of blocks holding at least one byte of the record
    pub fn required_len(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            (self.skip + self.size).div_ceil(self.stride)
        }
    }

    /// Block indices to decompress, given the archive's declared block count
    pub fn blocks_to_read(&self, block_count: usize) -> FormatResult<Range<usize>> {
        let required_end = self.first_block + self.required_len();
        if required_end > block_count {
            return Err(FormatError::BlockWindowOutOfRange {
                first: self.first_block,
                end: required_end,
                block_count,
            });
        }

        let start = self.first_block.min(block_count);
        let end = (self.first_block + self.window_len).min(block_count);
        Ok(start..end.max(start))
    }

    /// Where block `block_index` lands in the assembly buffer
    pub fn buffer_offset(&self, block_index: usize) -> usize {
        (block_index - self.first_block) * self.stride
    }

    /// Range of the assembly buffer holding the record
    pub fn slice_range(&self) -> Range<usize> {
        self.skip..self.skip + self.size
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(offset: i64, size: i32) -> Record {
        Record {
            file_id: 0,
            reserved1: 0,
            fingerprint: 0xabc,
            logical_offset: offset,
            logical_size: size,
            reserved2: 0,
        }
    }

    #[test]
    fn test_single_block_window() {
        let window = BlockWindow::for_record(&record(10, 20), 64).unwrap();
        assert_eq!(window.first_block, 0);
        assert_eq!(window.window_len, 1);
        assert_eq!(window.skip, 10);
        assert_eq!(window.buffer_len(), 128);
        assert_eq!(window.required_len(), 1);
        assert_eq!(window.slice_range(), 10..30);
        assert_eq!(window.blocks_to_read(1).unwrap(), 0..1);
    }

    #[test]
    fn test_straddling_window() {
        let window = BlockWindow::for_record(&record(100, 40), 64).unwrap();
        assert_eq!(window.first_block, 1);
        assert_eq!(window.window_len, 2);
        assert_eq!(window.skip, 36);
        assert_eq!(window.required_len(), 2);
        assert_eq!(window.buffer_offset(2), 64);
        assert_eq!(window.blocks_to_read(3).unwrap(), 1..3);
    }

    #[test]
    fn test_boundary_end_keeps_formula_window() {
        // Ends exactly at the end of block 0; the formula still spans block 1
        let window = BlockWindow::for_record(&record(0, 64), 64).unwrap();
        assert_eq!(window.window_len, 2);
        assert_eq!(window.required_len(), 1);
        assert_eq!(window.buffer_len(), 192);
        assert_eq!(window.blocks_to_read(2).unwrap(), 0..2);
        // Archive only has block 0: the unused trailing block is dropped
        assert_eq!(window.blocks_to_read(1).unwrap(), 0..1);
    }

    #[test]
    fn test_window_past_block_table() {
        let window = BlockWindow::for_record(&record(130, 10), 64).unwrap();
        let err = window.blocks_to_read(2).unwrap_err();
        assert!(matches!(
            err,
            FormatError::BlockWindowOutOfRange {
                first: 2,
                end: 3,
                block_count: 2
            }
        ));
    }

    #[test]
    fn test_empty_record() {
        let window = BlockWindow::for_record(&record(64, 0), 64).unwrap();
        assert_eq!(window.required_len(), 0);
        assert_eq!(window.slice_range(), 0..0);
        assert_eq!(window.blocks_to_read(1).unwrap(), 1..1);
    }

    #[test]
    fn test_negative_fields_rejected() {
        assert!(BlockWindow::for_record(&record(-1, 4), 64).is_err());
        assert!(BlockWindow::for_record(&record(0, -4), 64).is_err());
        assert!(BlockWindow::for_record(&record(0, 4), 0).is_err());
    }

    proptest! {
        #[test]
        fn window_covers_record(
            offset in 0i64..1_000_000,
            size in 0i32..200_000,
            stride in 1usize..70_000,
        ) {
            let window = BlockWindow::for_record(&record(offset, size), stride).unwrap();
            let offset = offset as usize;
            let size = size as usize;

            prop_assert!(window.first_block * stride <= offset);
            prop_assert_eq!(window.first_block * stride + window.skip, offset);
            if size > 0 {
                prop_assert!((window.first_block + window.required_len()) * stride >= offset + size);
            }
            prop_assert!(window.required_len() <= window.window_len);
            prop_assert!(window.slice_range().end <= window.buffer_len());
            prop_assert!(window.buffer_len() >= window.window_len * stride + stride);
        }
    }
}
