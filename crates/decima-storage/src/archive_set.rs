//! Directory-level view over many archives
//!
//! Every fingerprint resolves to exactly one owning archive. Archives are
//! visited in discovery order and records in fingerprint order; an unseen
//! fingerprint is claimed by the current archive, and a seen one moves only
//! when the current archive has a strictly smaller load priority. Equal
//! priorities therefore keep the archive visited first.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use decima_formats::path::format_fingerprint;
use decima_formats::{BlockDecompressor, Record, fingerprint};
use tracing::{debug, info, warn};

use crate::{ArchiveIndex, DiscoveryOrder, Result, StorageConfig};

/// Key for set-level lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKey<'a> {
    /// Virtual path, with or without a type prefix
    Path(&'a str),
    /// Precomputed fingerprint
    Fingerprint(u64),
}

impl FileKey<'_> {
    /// Fingerprint this key resolves to
    pub fn fingerprint(&self) -> u64 {
        match self {
            Self::Path(path) => fingerprint(path),
            Self::Fingerprint(fp) => *fp,
        }
    }
}

impl<'a> From<&'a str> for FileKey<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a String> for FileKey<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(path)
    }
}

impl From<u64> for FileKey<'_> {
    fn from(fp: u64) -> Self {
        Self::Fingerprint(fp)
    }
}

/// Archives of one directory plus the resolved owner of every fingerprint
#[derive(Debug, Default)]
pub struct ArchiveSet {
    archives: Vec<ArchiveIndex>,
    owners: HashMap<u64, usize>,
}

impl ArchiveSet {
    /// Open every archive in `dir` with the codec selected in `config`
    ///
    /// A directory that does not exist yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns error if `config` is invalid, the directory cannot be listed,
    /// or a discovered archive cannot be opened
    pub fn open<P: AsRef<Path>>(dir: P, config: &StorageConfig) -> Result<Self> {
        Self::open_with_decompressor(dir, config, Arc::new(config.codec))
    }

    /// Open every archive in `dir` with a caller-supplied block decompressor
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveSet::open`]
    pub fn open_with_decompressor<P: AsRef<Path>>(
        dir: P,
        config: &StorageConfig,
        decompressor: Arc<dyn BlockDecompressor>,
    ) -> Result<Self> {
        config.validate()?;
        let dir = dir.as_ref();

        let archives = discover_archives(dir, config)?
            .iter()
            .map(|path| {
                ArchiveIndex::open_with_decompressor(path, config, Arc::clone(&decompressor))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_archives(archives))
    }

    /// Resolve ownership over archives already opened, in the given order
    pub fn from_archives(archives: Vec<ArchiveIndex>) -> Self {
        let mut owners: HashMap<u64, usize> = HashMap::new();

        for (position, archive) in archives.iter().enumerate() {
            for record in archive.records() {
                match owners.entry(record.fingerprint) {
                    Entry::Vacant(slot) => {
                        slot.insert(position);
                    }
                    Entry::Occupied(mut slot) => {
                        let current = &archives[*slot.get()];
                        if current.load_priority() > archive.load_priority() {
                            debug!(
                                "{} overrides {} for {}",
                                archive.file_name(),
                                current.file_name(),
                                format_fingerprint(record.fingerprint)
                            );
                            slot.insert(position);
                        }
                    }
                }
            }
        }

        info!(
            "Archive set ready: {} archives, {} unique fingerprints",
            archives.len(),
            owners.len()
        );

        Self { archives, owners }
    }

    /// Read a file through its owning archive
    ///
    /// Returns an empty vector when no archive holds the key.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`ArchiveIndex::read`] on the owner
    pub fn read<'k>(&self, key: impl Into<FileKey<'k>>) -> Result<Vec<u8>> {
        match self.owner(key) {
            Some((archive, fp)) => archive.read(fp),
            None => Ok(Vec::new()),
        }
    }

    /// Whether any archive holds the key
    pub fn file_exists<'k>(&self, key: impl Into<FileKey<'k>>) -> bool {
        self.owners.contains_key(&key.into().fingerprint())
    }

    /// Owning archive and the resolved fingerprint
    pub fn owner<'k>(&self, key: impl Into<FileKey<'k>>) -> Option<(&ArchiveIndex, u64)> {
        let fp = key.into().fingerprint();
        self.owners.get(&fp).map(|&i| (&self.archives[i], fp))
    }

    /// Position of the owning archive in [`ArchiveSet::archives`]
    pub fn owner_index<'k>(&self, key: impl Into<FileKey<'k>>) -> Option<usize> {
        self.owners.get(&key.into().fingerprint()).copied()
    }

    /// Whether the archive at `position` holds `fingerprint` without owning it
    pub fn is_shadowed(&self, position: usize, fingerprint: u64) -> bool {
        self.archives
            .get(position)
            .is_some_and(|a| a.file_exists(fingerprint))
            && self.owners.get(&fingerprint) != Some(&position)
    }

    /// Archives in visiting order
    pub fn archives(&self) -> &[ArchiveIndex] {
        &self.archives
    }

    /// Every record of every archive, shadowed ones included
    pub fn all_records(&self) -> impl Iterator<Item = (usize, &ArchiveIndex, &Record)> {
        self.archives
            .iter()
            .enumerate()
            .flat_map(|(i, archive)| archive.records().map(move |r| (i, archive, r)))
    }

    /// Number of archives
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Whether the set holds no archives
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Number of distinct fingerprints across all archives
    pub fn fingerprint_count(&self) -> usize {
        self.owners.len()
    }
}

/// Regular files directly inside `dir` carrying the archive extension
fn discover_archives(dir: &Path, config: &StorageConfig) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Archive directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    info!("Scanning {} for .{} archives", dir.display(), config.archive_extension);

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && config.is_archive_path(&path) {
            debug!("Found archive {}", path.display());
            paths.push(path);
        }
    }

    if config.discovery_order == DiscoveryOrder::Sorted {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }

    Ok(paths)
}
