//! Block decompression
//!
//! Every block is compressed on its own and both its compressed and
//! decompressed lengths are known from the block table, so a decompressor
//! only has to fill a caller-sized output slice from a caller-sized input.
//! Shipped game archives use Oodle Kraken, which is not bundled; plug it in
//! by implementing [`BlockDecompressor`].

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Codec result type
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised by block decompressors
#[derive(Debug, Error)]
pub enum CodecError {
    /// The compressed stream is malformed
    #[error("{codec} decompression failed: {reason}")]
    Decompression {
        /// Codec name
        codec: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// The stream decoded to a different length than the block declares
    #[error("{codec} produced {actual} bytes, block declares {expected}")]
    SizeMismatch {
        /// Codec name
        codec: &'static str,
        /// Declared decompressed size
        expected: usize,
        /// Bytes actually produced
        actual: usize,
    },

    /// Codec name not recognised
    #[error("unknown codec '{0}' (expected stored, zlib or lz4)")]
    UnknownCodec(String),
}

/// Decompresses one block with known input and output lengths
///
/// `output.len()` is the block's declared decompressed size. Implementations
/// return the number of bytes written.
pub trait BlockDecompressor: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Decompress `input` into `output`
    fn decompress(&self, input: &[u8], output: &mut [u8]) -> CodecResult<usize>;
}

/// Built-in codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Blocks stored uncompressed
    Stored,
    /// zlib streams
    #[default]
    Zlib,
    /// Raw LZ4 blocks (no frame, no size prefix)
    Lz4,
}

impl Codec {
    /// Every built-in codec
    pub const ALL: [Self; 3] = [Self::Stored, Self::Zlib, Self::Lz4];

    /// Name used in configuration and on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Zlib => "zlib",
            Self::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::UnknownCodec(s.to_string()))
    }
}

impl BlockDecompressor for Codec {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn decompress(&self, input: &[u8], output: &mut [u8]) -> CodecResult<usize> {
        match self {
            Self::Stored => {
                if input.len() != output.len() {
                    return Err(CodecError::SizeMismatch {
                        codec: self.name(),
                        expected: output.len(),
                        actual: input.len(),
                    });
                }
                output.copy_from_slice(input);
                Ok(input.len())
            }
            Self::Zlib => decompress_zlib(input, output),
            Self::Lz4 => lz4_flex::block::decompress_into(input, output).map_err(|e| {
                CodecError::Decompression {
                    codec: self.name(),
                    reason: e.to_string(),
                }
            }),
        }
    }
}

fn decompress_zlib(input: &[u8], output: &mut [u8]) -> CodecResult<usize> {
    let failed = |e: std::io::Error| CodecError::Decompression {
        codec: "zlib",
        reason: e.to_string(),
    };

    let mut decoder = ZlibDecoder::new(input);
    let mut written = 0;
    while written < output.len() {
        let n = decoder.read(&mut output[written..]).map_err(failed)?;
        if n == 0 {
            break;
        }
        written += n;
    }

    // Output must be exactly full; anything left over means the block table lies
    let mut probe = [0u8; 1];
    if decoder.read(&mut probe).map_err(failed)? != 0 {
        return Err(CodecError::SizeMismatch {
            codec: "zlib",
            expected: output.len(),
            actual: output.len() + 1,
        });
    }

    Ok(written)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_stored() {
        let mut out = [0u8; 5];
        assert_eq!(Codec::Stored.decompress(b"hello", &mut out).unwrap(), 5);
        assert_eq!(&out, b"hello");

        let mut short = [0u8; 4];
        assert!(matches!(
            Codec::Stored.decompress(b"hello", &mut short),
            Err(CodecError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_zlib_exact_output() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let compressed = zlib(&data);
        let mut out = vec![0u8; data.len()];
        assert_eq!(Codec::Zlib.decompress(&compressed, &mut out).unwrap(), data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn test_zlib_short_stream_reports_written() {
        let compressed = zlib(b"abc");
        let mut out = [0u8; 8];
        assert_eq!(Codec::Zlib.decompress(&compressed, &mut out).unwrap(), 3);
    }

    #[test]
    fn test_zlib_overlong_stream() {
        let compressed = zlib(b"abcdef");
        let mut out = [0u8; 4];
        assert!(matches!(
            Codec::Zlib.decompress(&compressed, &mut out),
            Err(CodecError::SizeMismatch { expected: 4, .. })
        ));
    }

    #[test]
    fn test_zlib_garbage() {
        let mut out = [0u8; 4];
        assert!(matches!(
            Codec::Zlib.decompress(b"not zlib at all", &mut out),
            Err(CodecError::Decompression { codec: "zlib", .. })
        ));
    }

    #[test]
    fn test_lz4_block() {
        let data = b"decima decima decima decima decima".repeat(8);
        let compressed = lz4_flex::block::compress(&data);
        let mut out = vec![0u8; data.len()];
        assert_eq!(Codec::Lz4.decompress(&compressed, &mut out).unwrap(), data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn test_codec_names() {
        assert_eq!("ZLIB".parse::<Codec>().unwrap(), Codec::Zlib);
        assert_eq!("lz4".parse::<Codec>().unwrap(), Codec::Lz4);
        assert_eq!(Codec::Stored.to_string(), "stored");
        assert!(matches!(
            "kraken".parse::<Codec>(),
            Err(CodecError::UnknownCodec(name)) if name == "kraken"
        ));
        assert_eq!(Codec::default(), Codec::Zlib);
    }
}
