//! `info`: per-archive summary

use std::path::Path;

use comfy_table::Cell;
use decima_storage::{ArchiveIndex, StorageConfig};

use super::open_set;
use crate::OutputFormat;
use crate::output::{create_table, numeric_cell, print_json};

pub(crate) fn handle(
    bin_dir: &Path,
    config: &StorageConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let set = open_set(bin_dir, config)?;
    let summaries: Vec<_> = set.archives().iter().map(ArchiveIndex::summary).collect();

    match format {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Text => {
            if summaries.is_empty() {
                println!(
                    "No .{} archives in {}",
                    config.archive_extension,
                    bin_dir.display()
                );
                return Ok(());
            }

            let mut table = create_table(&[
                "Archive", "Priority", "Records", "Blocks", "Block size", "Stream index",
            ]);
            for (archive, summary) in set.archives().iter().zip(&summaries) {
                let priority = summary
                    .load_priority
                    .map_or_else(|| "unusable".to_string(), |p| p.to_string());
                let stream_index = summary
                    .stream_index_entries
                    .map_or_else(|| "none".to_string(), |n| format!("{n} entries"));
                table.add_row(vec![
                    Cell::new(archive.file_name()),
                    numeric_cell(priority),
                    numeric_cell(summary.record_count),
                    numeric_cell(summary.block_count),
                    numeric_cell(summary.max_block_size),
                    Cell::new(stream_index),
                ]);
            }
            println!("{table}");
            println!(
                "{} archives, {} unique fingerprints",
                set.len(),
                set.fingerprint_count()
            );
        }
    }
    Ok(())
}
