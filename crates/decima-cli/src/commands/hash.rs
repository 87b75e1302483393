//! `hash`: print path fingerprints

use decima_formats::fingerprint;
use decima_formats::path::format_fingerprint;
use serde::Serialize;

use crate::OutputFormat;
use crate::output::print_json;

#[derive(Debug, Serialize)]
struct HashEntry<'a> {
    path: &'a str,
    fingerprint: String,
}

pub(crate) fn handle(paths: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let entries: Vec<HashEntry<'_>> = paths
        .iter()
        .map(|path| HashEntry {
            path,
            fingerprint: format_fingerprint(fingerprint(path)),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}  {}", entry.fingerprint, entry.path);
            }
        }
    }
    Ok(())
}
