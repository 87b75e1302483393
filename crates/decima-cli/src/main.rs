//! `decima` binary entry point.
//!
//! Parses arguments, installs logging on stderr and hands off to the
//! library. Stdout is reserved for command output so `read` can be piped.

use anyhow::Result;
use clap::Parser;
use decima_cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    decima_cli::run(&cli)
}
