//! Command handlers

pub mod extract;
pub mod hash;
pub mod info;
pub mod list;
pub mod read;

use std::path::Path;

use anyhow::Context;
use decima_storage::{ArchiveSet, StorageConfig};

/// Open every archive in `bin_dir`
fn open_set(bin_dir: &Path, config: &StorageConfig) -> anyhow::Result<ArchiveSet> {
    ArchiveSet::open(bin_dir, config)
        .with_context(|| format!("failed to open archives in {}", bin_dir.display()))
}
