//! `extract`: write every record to disk under its presentation path

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use decima_formats::path::format_fingerprint;
use decima_storage::{ArchiveSet, StorageConfig};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::open_set;
use crate::OutputFormat;

/// Counts from one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Archives visited
    pub archives: usize,
    /// Files written, shadowed copies included
    pub written: usize,
    /// Bytes written
    pub bytes: u64,
    /// Shadowed copies skipped with `--owned-only`
    pub skipped_shadowed: usize,
    /// Records whose path would leave the output directory
    pub rejected_paths: usize,
}

pub(crate) fn handle(
    bin_dir: &Path,
    out_dir: &Path,
    owned_only: bool,
    config: &StorageConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let set = open_set(bin_dir, config)?;
    let report = extract(&set, out_dir, owned_only)?;

    match format {
        OutputFormat::Json => crate::output::print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "Extracted {} files ({} bytes) from {} archives into {}",
                report.written,
                report.bytes,
                report.archives,
                out_dir.display()
            );
            if report.skipped_shadowed > 0 {
                println!("Skipped {} shadowed copies", report.skipped_shadowed);
            }
            if report.rejected_paths > 0 {
                println!(
                    "Rejected {} paths outside the output directory",
                    report.rejected_paths
                );
            }
        }
    }
    Ok(())
}

/// Extract every record of every archive in `set` into `out_dir`
///
/// Shadowed copies are written before owned records, so a path shared by
/// several archives ends up holding the copy the set resolves to.
///
/// # Errors
///
/// Returns error if a directory or file cannot be created or a record
/// cannot be read
pub fn extract(
    set: &ArchiveSet,
    out_dir: &Path,
    owned_only: bool,
) -> anyhow::Result<ExtractReport> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut report = ExtractReport {
        archives: set.len(),
        ..ExtractReport::default()
    };

    let (shadowed, owned): (Vec<_>, Vec<_>) = set
        .all_records()
        .partition(|(position, _, record)| set.is_shadowed(*position, record.fingerprint));

    if owned_only {
        report.skipped_shadowed = shadowed.len();
    }
    let pending = if owned_only {
        owned
    } else {
        shadowed.into_iter().chain(owned).collect()
    };

    for (_, archive, record) in pending {
        let relative = archive.display_path(record.fingerprint);
        let Some(target) = contained_path(out_dir, &relative) else {
            warn!(
                "Refusing to write {} ({}) outside {}",
                relative,
                format_fingerprint(record.fingerprint),
                out_dir.display()
            );
            report.rejected_paths += 1;
            continue;
        };

        let data = archive.read(record.fingerprint).with_context(|| {
            format!(
                "failed to read {} from {}",
                format_fingerprint(record.fingerprint),
                archive.path().display()
            )
        })?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&target, &data)
            .with_context(|| format!("failed to write {}", target.display()))?;

        debug!("{} -> {}", archive.file_name(), target.display());
        report.written += 1;
        report.bytes += data.len() as u64;
    }

    info!(
        "Extracted {} files from {} archives",
        report.written, report.archives
    );
    Ok(report)
}

/// Join a relative archive path onto `root`, or `None` if it could escape
fn contained_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut has_normal = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    has_normal.then(|| root.join(relative))
}
