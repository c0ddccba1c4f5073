//! The immutable result of one poll cycle.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LinkError;
use crate::fields::{FieldMap, FieldValue};

/// A normalized telemetry snapshot produced by one poll cycle.
///
/// Created fresh each cycle and never mutated afterwards; a caller polling
/// on an interval simply replaces the previous snapshot. A snapshot produced
/// after a transport failure contains exactly the fields parsed before the
/// failure plus an error description — never partial garbage from the
/// response that triggered the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    fields: FieldMap,
    last_updated: SystemTime,
    error: Option<String>,
    raw_data: Option<String>,
}

impl Snapshot {
    /// A snapshot for a fully successful poll cycle.
    pub(crate) fn complete(fields: FieldMap) -> Self {
        Self {
            fields,
            last_updated: SystemTime::now(),
            error: None,
            raw_data: None,
        }
    }

    /// A degraded snapshot: the fields accumulated before `error` occurred,
    /// plus the most recent raw response when any bytes were received.
    pub(crate) fn degraded(fields: FieldMap, error: &LinkError, raw_data: Option<String>) -> Self {
        Self {
            fields,
            last_updated: SystemTime::now(),
            error: Some(error.to_string()),
            raw_data,
        }
    }

    /// The merged telemetry fields, in the order they were accumulated.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Look up one field by key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// The printer's `Status` field, when the status command succeeded.
    pub fn status(&self) -> Option<&str> {
        self.fields.get("Status").and_then(FieldValue::as_text)
    }

    /// When this poll cycle completed (success or failure).
    pub fn last_updated(&self) -> SystemTime {
        self.last_updated
    }

    /// The error description, when the poll cycle failed partway through.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The most recent raw response received before a failure, for
    /// diagnostics. `None` on success and on failures with zero bytes
    /// received.
    pub fn raw_data(&self) -> Option<&str> {
        self.raw_data.as_deref()
    }

    /// Whether this snapshot was degraded by a transport failure.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Snapshot {
    /// Serializes to the flat consumer shape: `last_updated` (Unix seconds)
    /// first, then every telemetry field, then `Error` and `RawData` when
    /// present.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let len = 1
            + self.fields.len()
            + usize::from(self.error.is_some())
            + usize::from(self.raw_data.is_some());
        let mut map = serializer.serialize_map(Some(len))?;

        let secs = self
            .last_updated
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        map.serialize_entry("last_updated", &secs)?;

        for (key, value) in self.fields.iter() {
            map.serialize_entry(key, value)?;
        }
        if let Some(error) = &self.error {
            map.serialize_entry("Error", error)?;
        }
        if let Some(raw) = &self.raw_data {
            map.serialize_entry("RawData", raw)?;
        }
        map.end()
    }
}
