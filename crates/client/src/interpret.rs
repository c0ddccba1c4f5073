//! Command-specific semantic transforms over parsed response fields.
//!
//! The wire protocol overloads generic keys across commands: `X` means
//! build-volume size in a `~M115` response but head position in `~M114`,
//! and `~M105` packs four temperature readings into one `T0` value. The
//! transform is therefore keyed by which [`Command`] produced the response,
//! not by field name alone — that dispatch is the whole point of this
//! module.

use crate::command::Command;
use crate::error::LinkError;
use crate::fields::{FieldMap, FieldValue};
use crate::parse::{
    scan_print_progress, split_dual_temperature, split_fields, split_progress_counts,
};

/// Parse a raw response and apply the transform for the command that
/// produced it, yielding the fields to merge into the snapshot.
///
/// Absence of a transform's trigger field is not an error — the firmware
/// may omit fields — so a quiet response passes through as whatever
/// `key:value` lines it did contain. A `MalformedResponse` error means the
/// trigger field was present but its expected structure was not; the caller
/// decides whether to fall back to the untransformed fields.
pub fn interpret(command: Command, raw: &str) -> Result<FieldMap, LinkError> {
    let mut fields = split_fields(raw);
    match command {
        Command::AcquireControl | Command::Status => {}
        Command::Info => rename_prefixed(&mut fields, "X", "MaxSize"),
        Command::HeadPosition => rename_prefixed(&mut fields, "X", "HeadPosition"),
        Command::Temperature => apply_temperature(&mut fields)?,
        Command::Progress => apply_progress(&mut fields, raw)?,
    }
    Ok(fields)
}

/// Replace `key` with `new_key`, restoring the original `"key:value"`
/// formatting in the value so downstream consumers see the firmware's own
/// convention under a descriptive name.
fn rename_prefixed(fields: &mut FieldMap, key: &str, new_key: &str) {
    if let Some(FieldValue::Text(value)) = fields.remove(key) {
        fields.insert(new_key, format!("{key}:{value}"));
    }
}

/// Split the `T0` dual-channel reading into four temperature fields.
fn apply_temperature(fields: &mut FieldMap) -> Result<(), LinkError> {
    let Some(value) = fields.get("T0").and_then(FieldValue::as_text) else {
        return Ok(());
    };
    let temps = split_dual_temperature(value)?;

    fields.remove("T0");
    fields.insert("TempT0", temps.extruder_current);
    fields.insert("TempT0_Target", temps.extruder_target);
    fields.insert("TempB", temps.bed_current);
    fields.insert("TempB_Target", temps.bed_target);
    Ok(())
}

/// Derive `ByteProgress`, `ByteTotal` and `ProgressPercent` from the
/// `SD printing byte` line of a `~M27` response.
fn apply_progress(fields: &mut FieldMap, raw: &str) -> Result<(), LinkError> {
    let Some(counts) = scan_print_progress(raw) else {
        return Ok(());
    };
    let (progress, total) = split_progress_counts(counts)?;

    let malformed = |value: &str| LinkError::MalformedResponse {
        command: Command::Progress.name(),
        details: format!("non-numeric progress count {value:?}"),
    };
    let progress_bytes: f64 = progress.parse().map_err(|_| malformed(progress))?;
    let total_bytes: f64 = total.parse().map_err(|_| malformed(total))?;

    fields.insert("ByteProgress", progress);
    fields.insert("ByteTotal", total);
    // Guard the division: a printer that is not mid-job reports total 0.
    let percent = if total_bytes > 0.0 {
        progress_bytes / total_bytes * 100.0
    } else {
        0.0
    };
    fields.insert("ProgressPercent", percent);
    Ok(())
}
