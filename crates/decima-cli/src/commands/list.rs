//! `list`: every record of every archive

use std::path::Path;

use comfy_table::Cell;
use decima_formats::path::format_fingerprint;
use decima_storage::{ArchiveSet, StorageConfig};
use serde::Serialize;

use super::open_set;
use crate::OutputFormat;
use crate::output::{create_table, numeric_cell, print_json};

/// One listed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Archive file name
    pub archive: String,
    /// Fingerprint as 16-digit hex
    pub fingerprint: String,
    /// Logical size in bytes
    pub size: i32,
    /// Presentation path
    pub path: String,
    /// Overridden by another archive
    pub shadowed: bool,
}

/// Listing rows in archive order, then fingerprint order
pub fn entries(set: &ArchiveSet) -> Vec<ListEntry> {
    set.all_records()
        .map(|(position, archive, record)| ListEntry {
            archive: archive.file_name().into_owned(),
            fingerprint: format_fingerprint(record.fingerprint),
            size: record.logical_size,
            path: archive.display_path(record.fingerprint),
            shadowed: set.is_shadowed(position, record.fingerprint),
        })
        .collect()
}

pub(crate) fn handle(
    bin_dir: &Path,
    config: &StorageConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let set = open_set(bin_dir, config)?;
    let entries = entries(&set);

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No records found in {}", bin_dir.display());
                return Ok(());
            }
            let mut table = create_table(&["Archive", "Fingerprint", "Size", "Path", "Shadowed"]);
            for entry in &entries {
                table.add_row(vec![
                    Cell::new(&entry.archive),
                    Cell::new(&entry.fingerprint),
                    numeric_cell(entry.size),
                    Cell::new(&entry.path),
                    Cell::new(if entry.shadowed { "yes" } else { "" }),
                ]);
            }
            println!("{table}");
            println!(
                "{} records, {} unique fingerprints",
                entries.len(),
                set.fingerprint_count()
            );
        }
    }
    Ok(())
}
