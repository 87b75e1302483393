//! Virtual paths look like `cache:models/characters/aloy.core`: an optional
//! type prefix, a colon, and the path proper. Only the part after the first
//! colon takes part in fingerprinting, case-folded to ASCII lowercase.

use crate::murmur3::murmur3_x64_128;

/// Seed used for every path fingerprint
pub const FINGERPRINT_SEED: u32 = 42;

/// Strip the type prefix, returning everything after the first `:`
///
/// Paths without a colon are returned unchanged.
///
/// ```
/// use decima_formats::unwrap_path;
///
/// assert_eq!(unwrap_path("cache:a/b"), "a/b");
/// assert_eq!(unwrap_path("noColon"), "noColon");
/// ```
pub fn unwrap_path(path: &str) -> &str {
    path.split_once(':').map_or(path, |(_, rest)| rest)
}

/// Type prefix of a virtual path, everything before the first `:`
///
/// Paths without a colon are returned whole.
pub fn path_type(path: &str) -> &str {
    path.split_once(':').map_or(path, |(prefix, _)| prefix)
}

/// Compute the 64-bit fingerprint of a virtual path
///
/// ```
/// use decima_formats::fingerprint;
///
/// assert_eq!(
///     fingerprint("cache:Some/Path.core"),
///     fingerprint("other:some/PATH.CORE"),
/// );
/// ```
pub fn fingerprint(path: &str) -> u64 {
    fingerprint_bytes(path.as_bytes())
}

/// Fingerprint of a raw byte path, for names that are not valid UTF-8
///
/// The prefix is stripped at the first `b':'` exactly like [`unwrap_path`].
pub fn fingerprint_bytes(path: &[u8]) -> u64 {
    let stripped = path
        .iter()
        .position(|&b| b == b':')
        .map_or(path, |pos| &path[pos + 1..]);

    let mut buffer = Vec::with_capacity(stripped.len() + 1);
    buffer.extend(stripped.iter().map(u8::to_ascii_lowercase));
    // Hashed input includes the C string terminator
    buffer.push(0);

    murmur3_x64_128(&buffer, FINGERPRINT_SEED).0
}

/// Render a fingerprint as 16 zero-padded lowercase hex digits
pub fn format_fingerprint(fingerprint: u64) -> String {
    format!("{fingerprint:016x}")
}

/// Parse a fingerprint written as hex, with or without a `0x` prefix
pub fn parse_fingerprint(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
