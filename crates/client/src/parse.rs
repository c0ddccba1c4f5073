//! Raw response text parsing.
//!
//! FlashForge firmware answers every command with plain CRLF-terminated
//! text where each line is ideally `key:value` — but nothing is guaranteed,
//! and the format drifts between firmware versions. [`split_fields`] is
//! therefore deliberately lenient: unknown or malformed lines are silently
//! skipped rather than treated as errors.
//!
//! The two sub-field parsers ([`split_dual_temperature`],
//! [`split_progress_counts`]) decode the multi-part values that the generic
//! line split cannot, with explicit failure reporting so a malformed value
//! degrades one command's derived fields instead of aborting the poll.

use crate::command::Command;
use crate::error::LinkError;
use crate::fields::FieldMap;

/// The prefix of the `~M27` response line that carries print progress.
pub(crate) const SD_PROGRESS_PREFIX: &str = "SD printing byte";

/// Split raw response text into an ordered `key -> value` map.
///
/// Splits on CRLF, then each line on its first colon. Both sides are
/// trimmed. Lines without a colon and lines whose key trims to empty are
/// skipped; an empty value is kept (the key maps to `""`). Never fails on
/// malformed input — it degrades to an empty or partial map.
pub fn split_fields(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    for line in text.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fields.insert(key, value.trim());
    }
    fields
}

// ── Temperature sub-fields ──────────────────────────────────────────────

/// The four temperature readings embedded in a `~M105` `T0` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualTemperature {
    /// Current extruder temperature.
    pub extruder_current: String,
    /// Target extruder temperature.
    pub extruder_target: String,
    /// Current bed temperature.
    pub bed_current: String,
    /// Target bed temperature.
    pub bed_target: String,
}

/// Decode a `~M105` `T0` value of the shape `<cur>/<tgt>B:<cur>/<tgt>`.
///
/// The firmware puts no separator before `B:`, so the value is split on
/// that literal substring first, then each half on `/`. Any missing split
/// is reported as a [`LinkError::MalformedResponse`] scoped to `~M105`.
pub fn split_dual_temperature(value: &str) -> Result<DualTemperature, LinkError> {
    let malformed = |details: String| LinkError::MalformedResponse {
        command: Command::Temperature.name(),
        details,
    };

    let (extruder, bed) = value
        .split_once("B:")
        .ok_or_else(|| malformed(format!("missing B: separator in {value:?}")))?;
    let (extruder_current, extruder_target) = extruder
        .split_once('/')
        .ok_or_else(|| malformed(format!("missing / in extruder reading {extruder:?}")))?;
    let (bed_current, bed_target) = bed
        .split_once('/')
        .ok_or_else(|| malformed(format!("missing / in bed reading {bed:?}")))?;

    Ok(DualTemperature {
        extruder_current: extruder_current.trim().to_string(),
        extruder_target: extruder_target.trim().to_string(),
        bed_current: bed_current.trim().to_string(),
        bed_target: bed_target.trim().to_string(),
    })
}

// ── Progress sub-fields ─────────────────────────────────────────────────

/// Find the `SD printing byte` line in a raw `~M27` response.
///
/// Returns the trimmed remainder after the prefix (e.g. `"120/4000"`), or
/// `None` when no such line exists — which is not an error; the printer
/// simply reports nothing while idle.
pub fn scan_print_progress(raw: &str) -> Option<&str> {
    raw.split("\r\n")
        .filter_map(|line| line.trim_start().strip_prefix(SD_PROGRESS_PREFIX))
        .map(str::trim)
        .next()
}

/// Split a progress remainder (`"120/4000"`) into byte-progress and
/// byte-total strings.
pub fn split_progress_counts(value: &str) -> Result<(&str, &str), LinkError> {
    let (progress, total) =
        value
            .split_once('/')
            .ok_or_else(|| LinkError::MalformedResponse {
                command: Command::Progress.name(),
                details: format!("missing / in progress value {value:?}"),
            })?;
    Ok((progress.trim(), total.trim()))
}
