//! MurmurHash3 x64/128 implementation
//!
//! Port of Austin Appleby's `MurmurHash3_x64_128` from the SMHasher
//! reference. Decima fingerprints keep only the first 64-bit lane.

use std::fmt;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// 128-bit MurmurHash3 result split into its two 64-bit lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Murmur3x64 {
    /// First lane (`h1`), the low 64 bits of the digest
    pub low: u64,
    /// Second lane (`h2`)
    pub high: u64,
}

impl Murmur3x64 {
    /// Compute the hash of `data` with the given seed
    pub fn hash(data: &[u8], seed: u32) -> Self {
        let (low, high) = murmur3_x64_128(data, seed);
        Self { low, high }
    }

    /// Digest bytes in the order the reference implementation stores them
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.low.to_le_bytes());
        out[8..].copy_from_slice(&self.high.to_le_bytes());
        out
    }
}

impl fmt::Display for Murmur3x64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// Compute MurmurHash3 x64/128, returning `(h1, h2)`
///
/// # Examples
///
/// ```
/// use decima_formats::murmur3::murmur3_x64_128;
///
/// let (h1, h2) = murmur3_x64_128(b"The quick brown fox jumps over the lazy dog", 0);
/// assert_eq!(h1, 0xe34b_bc7b_bc07_1b6c);
/// assert_eq!(h2, 0x7a43_3ca9_c49a_9347);
/// ```
pub fn murmur3_x64_128(data: &[u8], seed: u32) -> (u64, u64) {
    let mut h1 = u64::from(seed);
    let mut h2 = u64::from(seed);

    let mut blocks = data.chunks_exact(16);
    for block in &mut blocks {
        let k1 = read_le_partial(&block[..8]);
        let k2 = read_le_partial(&block[8..]);

        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(27).wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(k2);
        h2 = h2.rotate_left(31).wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2(read_le_partial(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(read_le_partial(&tail[..tail.len().min(8)]));
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

/// Little-endian read of up to eight bytes, zero-extended
fn read_le_partial(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Finalization mix, forces all bits of a hash block to avalanche
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}
