//! Configuration for archive discovery and reads

use decima_formats::Codec;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;

use crate::{DEFAULT_ARCHIVE_EXTENSION, DEFAULT_INDEX_EXTENSION, Result, StorageError};

/// Order in which discovered archives enter the ownership fold
///
/// Ties in load priority go to the archive visited first, so the order is
/// observable whenever two archives share a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryOrder {
    /// Ascending by file name
    #[default]
    Sorted,
    /// Whatever order the directory listing returns
    Filesystem,
}

/// Configuration for the storage layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Extension of archive files, without the dot
    pub archive_extension: String,

    /// Extension of sidecar stream index files, without the dot
    pub index_extension: String,

    /// Block codec used when no custom decompressor is supplied
    pub codec: Codec,

    /// Archive visiting order
    pub discovery_order: DiscoveryOrder,

    /// Look for and parse sidecar stream indices
    pub load_stream_indices: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            index_extension: DEFAULT_INDEX_EXTENSION.to_string(),
            codec: Codec::default(),
            discovery_order: DiscoveryOrder::default(),
            load_stream_indices: true,
        }
    }
}

impl StorageConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or fails
    /// [`StorageConfig::validate`]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| StorageError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the archive file extension
    #[must_use]
    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    /// Set the stream index file extension
    #[must_use]
    pub fn with_index_extension(mut self, extension: impl Into<String>) -> Self {
        self.index_extension = extension.into();
        self
    }

    /// Set the block codec
    #[must_use]
    pub const fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the archive visiting order
    #[must_use]
    pub const fn with_discovery_order(mut self, order: DiscoveryOrder) -> Self {
        self.discovery_order = order;
        self
    }

    /// Enable or disable stream index loading
    #[must_use]
    pub const fn with_stream_indices(mut self, enable: bool) -> Self {
        self.load_stream_indices = enable;
        self
    }

    /// Check that the extensions can be told apart
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] for an empty extension, an extension
    /// containing a dot or path separator, or identical archive and index
    /// extensions
    pub fn validate(&self) -> Result<()> {
        for (name, ext) in [
            ("archive_extension", &self.archive_extension),
            ("index_extension", &self.index_extension),
        ] {
            if ext.is_empty() {
                return Err(StorageError::Config(format!("{name} must not be empty")));
            }
            if ext.contains(['.', '/', '\\']) {
                return Err(StorageError::Config(format!(
                    "{name} '{ext}' must be a bare extension without dots or separators"
                )));
            }
        }
        if self.archive_extension == self.index_extension {
            return Err(StorageError::Config(format!(
                "archive and index extensions are both '{}'",
                self.archive_extension
            )));
        }
        Ok(())
    }

    /// Whether a path carries the archive extension, compared case-sensitively
    pub fn is_archive_path(&self, path: &Path) -> bool {
        path.extension().is_some_and(|e| e == OsStr::new(&self.archive_extension))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.archive_extension, "bin");
        assert_eq!(config.index_extension, "idx");
        assert_eq!(config.codec, Codec::Zlib);
        assert_eq!(config.discovery_order, DiscoveryOrder::Sorted);
        assert!(config.load_stream_indices);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StorageConfig::new()
            .with_archive_extension("core")
            .with_index_extension("map")
            .with_codec(Codec::Lz4)
            .with_discovery_order(DiscoveryOrder::Filesystem)
            .with_stream_indices(false);
        assert_eq!(config.archive_extension, "core");
        assert_eq!(config.index_extension, "map");
        assert_eq!(config.codec, Codec::Lz4);
        assert_eq!(config.discovery_order, DiscoveryOrder::Filesystem);
        assert!(!config.load_stream_indices);
    }

    #[test]
    fn test_validate_rejects_bad_extensions() {
        assert!(StorageConfig::new().with_archive_extension("").validate().is_err());
        assert!(StorageConfig::new().with_index_extension(".idx").validate().is_err());
        assert!(StorageConfig::new().with_index_extension("bin").validate().is_err());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"codec": "stored", "discovery_order": "filesystem"}"#)
                .unwrap();
        assert_eq!(config.codec, Codec::Stored);
        assert_eq!(config.discovery_order, DiscoveryOrder::Filesystem);
        assert_eq!(config.archive_extension, "bin");
    }

    #[test]
    fn test_json_roundtrip() {
        let config = StorageConfig::default().with_codec(Codec::Lz4);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<StorageConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_archive_path_match() {
        let config = StorageConfig::default();
        assert!(config.is_archive_path(Path::new("dir/patch.bin")));
        assert!(!config.is_archive_path(Path::new("dir/patch.BIN")));
        assert!(!config.is_archive_path(Path::new("dir/patch.idx")));
        assert!(!config.is_archive_path(Path::new("dir/bin")));
    }
}
