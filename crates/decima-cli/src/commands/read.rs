//! `read`: one file through the override resolution

use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use decima_formats::path::{format_fingerprint, parse_fingerprint};
use decima_storage::{FileKey, StorageConfig};
use tracing::info;

use super::open_set;

/// Interpret a command-line key
///
/// `0x`-prefixed hex and bare 16-digit hex are fingerprints; anything else
/// is a virtual path.
pub fn parse_key(key: &str) -> FileKey<'_> {
    let explicit = key.starts_with("0x") || key.starts_with("0X");
    let full_width = key.len() == 16 && key.bytes().all(|b| b.is_ascii_hexdigit());
    if (explicit || full_width)
        && let Some(fp) = parse_fingerprint(key)
    {
        return FileKey::Fingerprint(fp);
    }
    FileKey::Path(key)
}

pub(crate) fn handle(
    bin_dir: &Path,
    key: &str,
    output: Option<&Path>,
    config: &StorageConfig,
) -> anyhow::Result<()> {
    let set = open_set(bin_dir, config)?;
    let file_key = parse_key(key);

    let Some((archive, fp)) = set.owner(file_key) else {
        bail!(
            "{} ({}) not found in {}",
            key,
            format_fingerprint(file_key.fingerprint()),
            bin_dir.display()
        );
    };

    let data = archive
        .read(fp)
        .with_context(|| format!("failed to read {} from {}", key, archive.path().display()))?;
    info!(
        "Read {} bytes for {} from {}",
        data.len(),
        format_fingerprint(fp),
        archive.file_name()
    );

    match output {
        Some(path) => std::fs::write(path, &data)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("0x1234"), FileKey::Fingerprint(0x1234));
        assert_eq!(
            parse_key("7a1606811112dbe5"),
            FileKey::Fingerprint(0x7a16_0681_1112_dbe5)
        );
        assert_eq!(parse_key("abc"), FileKey::Path("abc"));
        assert_eq!(
            parse_key("cache:models/aloy.core"),
            FileKey::Path("cache:models/aloy.core")
        );
        assert_eq!(parse_key("0xnothex"), FileKey::Path("0xnothex"));
    }
}
