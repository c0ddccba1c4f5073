//! Snapshot rendering for terminal and pipe output.
//!
//! Pretty output is a plain key/value listing for interactive use; JSON is
//! the flat consumer shape (`last_updated`, telemetry fields, `Error`,
//! `RawData`) for pipes and scripting.

use std::io::{self, IsTerminal};
use std::time::UNIX_EPOCH;

use anyhow::Result;
use flashforge_telemetry_client::Snapshot;

/// Output format for snapshot rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable key/value listing.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Resolve an explicit `--output` value, or detect from whether stdout
    /// is a TTY (pretty for terminals, JSON for pipes).
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

/// Print one snapshot to stdout in the requested format.
pub(crate) fn print_snapshot(snapshot: &Snapshot, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(snapshot)?),
        Format::Pretty => {
            let secs = snapshot
                .last_updated()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            println!("last_updated: {secs}");
            for (key, value) in snapshot.fields() {
                println!("{key}: {value}");
            }
            if let Some(error) = snapshot.error() {
                println!("Error: {error}");
            }
            if let Some(raw) = snapshot.raw_data() {
                println!("RawData: {raw:?}");
            }
        }
    }
    Ok(())
}
