//! Decima archive CLI library
//!
//! This library provides the argument definitions and command handlers for
//! the `decima` binary.

#![allow(clippy::uninlined_format_args)]

pub mod commands;
pub mod output;

pub use crate::output::OutputFormat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use decima_formats::Codec;
use decima_storage::{DiscoveryOrder, StorageConfig};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "decima",
    about = "Extract and inspect Decima layered cache archives",
    version,
    long_about = "Reads a directory of Decima cache archives (.bin), resolves patch overrides by load priority and extracts or inspects the files they contain."
)]
pub struct Cli {
    /// Set the logging level (RUST_LOG overrides)
    #[arg(short, long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Path to a JSON storage configuration file
    #[arg(short, long, global = true, env = "DECIMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Block codec (stored, zlib, lz4)
    #[arg(long, global = true, env = "DECIMA_CODEC")]
    pub codec: Option<Codec>,

    /// Archive file extension
    #[arg(long, global = true, env = "DECIMA_ARCHIVE_EXT")]
    pub archive_ext: Option<String>,

    /// Stream index file extension
    #[arg(long, global = true, env = "DECIMA_INDEX_EXT")]
    pub index_ext: Option<String>,

    /// Visit archives in directory listing order instead of sorted by name
    #[arg(long, global = true, env = "DECIMA_FILESYSTEM_ORDER")]
    pub filesystem_order: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Logging verbosity
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Per-archive and per-override detail
    Debug,
    /// Progress
    Info,
    /// Problems that do not stop the run
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Default `EnvFilter` directive
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract every file of every archive
    Extract {
        /// Directory holding the archives
        bin_dir: PathBuf,

        /// Destination directory (created if missing)
        out_dir: PathBuf,

        /// Skip copies overridden by a higher-precedence archive
        #[arg(long)]
        owned_only: bool,
    },

    /// List every record with its archive, size and path
    List {
        /// Directory holding the archives
        bin_dir: PathBuf,
    },

    /// Summarize each archive
    Info {
        /// Directory holding the archives
        bin_dir: PathBuf,
    },

    /// Read one file through the override resolution
    Read {
        /// Directory holding the archives
        bin_dir: PathBuf,

        /// Virtual path, or fingerprint as 0x-prefixed or 16-digit hex
        key: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the fingerprint of virtual paths
    Hash {
        /// Virtual paths, with or without a type prefix
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

impl Cli {
    /// Storage configuration from `--config` with individual flags applied on top
    ///
    /// # Errors
    ///
    /// Returns error if the configuration file cannot be loaded or the merged
    /// configuration is invalid
    pub fn storage_config(&self) -> anyhow::Result<StorageConfig> {
        let mut config = match &self.config {
            Some(path) => StorageConfig::from_json_file(path)?,
            None => StorageConfig::default(),
        };

        if let Some(codec) = self.codec {
            config.codec = codec;
        }
        if let Some(ext) = &self.archive_ext {
            config.archive_extension.clone_from(ext);
        }
        if let Some(ext) = &self.index_ext {
            config.index_extension.clone_from(ext);
        }
        if self.filesystem_order {
            config.discovery_order = DiscoveryOrder::Filesystem;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run a parsed command line
///
/// # Errors
///
/// Returns error if configuration, archive access or output fails
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Hash { paths } => commands::hash::handle(paths, cli.format),
        Commands::Extract {
            bin_dir,
            out_dir,
            owned_only,
        } => commands::extract::handle(
            bin_dir,
            out_dir,
            *owned_only,
            &cli.storage_config()?,
            cli.format,
        ),
        Commands::List { bin_dir } => {
            commands::list::handle(bin_dir, &cli.storage_config()?, cli.format)
        }
        Commands::Info { bin_dir } => {
            commands::info::handle(bin_dir, &cli.storage_config()?, cli.format)
        }
        Commands::Read {
            bin_dir,
            key,
            output,
        } => commands::read::handle(bin_dir, key, output.as_deref(), &cli.storage_config()?),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "decima",
            "--codec",
            "lz4",
            "--archive-ext",
            "core",
            "--filesystem-order",
            "list",
            "dir",
        ])
        .unwrap();
        let config = cli.storage_config().unwrap();
        assert_eq!(config.codec, Codec::Lz4);
        assert_eq!(config.archive_extension, "core");
        assert_eq!(config.index_extension, "idx");
        assert_eq!(config.discovery_order, DiscoveryOrder::Filesystem);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["decima", "info", "dir", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_unknown_codec_rejected() {
        assert!(Cli::try_parse_from(["decima", "--codec", "kraken", "list", "dir"]).is_err());
    }

    #[test]
    fn test_conflicting_extensions_rejected() {
        let cli = Cli::try_parse_from(["decima", "--index-ext", "bin", "list", "dir"]).unwrap();
        assert!(cli.storage_config().is_err());
    }
}
