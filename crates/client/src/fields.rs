//! Ordered field container for decoded telemetry values.
//!
//! Responses from different commands share generic key names, so the
//! snapshot is built by merging per-command maps where a later command's
//! key legitimately overwrites an earlier one. Insertion order governs
//! iteration; overwriting a key keeps its original position.

use std::fmt;

/// A decoded field value: raw protocol text, or a derived numeric.
///
/// Almost everything the printer reports stays as text in its original
/// formatting; only derived values (currently `ProgressPercent`) are numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A trimmed string value straight off the wire.
    Text(String),
    /// A value derived numerically from wire fields.
    Number(f64),
}

impl FieldValue {
    /// The string contents, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// The numeric contents, if this is a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Number(n) => Some(*n),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

// ── FieldMap ────────────────────────────────────────────────────────────

/// An ordered mapping from field name to [`FieldValue`].
///
/// Keys are unique within one map; inserting an existing key replaces its
/// value in place without moving it. Telemetry maps are small (a handful of
/// entries per command), so lookups scan linearly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing (in place) any existing entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove and return the value for `key`, if present.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the map contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fold `other` into this map; `other`'s values win on key collision.
    pub fn merge(&mut self, other: FieldMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a str, &'a FieldValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a FieldValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut map = FieldMap::new();
        map.insert("Status", "READY");
        assert_eq!(map.get("Status"), Some(&FieldValue::Text("READY".into())));
        assert!(map.contains_key("Status"));
        assert!(!map.contains_key("T0"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = FieldMap::new();
        map.insert("A", "1");
        map.insert("B", "2");
        map.insert("A", "3");

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(map.get("A").unwrap().as_text(), Some("3"));
    }

    #[test]
    fn merge_later_keys_win() {
        let mut base = FieldMap::new();
        base.insert("Status", "generic");
        base.insert("X", "old");

        let mut update = FieldMap::new();
        update.insert("Status", "READY");
        update.insert("Extra", "new");

        base.merge(update);
        assert_eq!(base.get("Status").unwrap().as_text(), Some("READY"));
        assert_eq!(base.get("X").unwrap().as_text(), Some("old"));
        assert_eq!(base.get("Extra").unwrap().as_text(), Some("new"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn remove_returns_value() {
        let mut map = FieldMap::new();
        map.insert("T0", "25.3/26.0B:24.0/25.0");
        let value = map.remove("T0").unwrap();
        assert_eq!(value.as_text(), Some("25.3/26.0B:24.0/25.0"));
        assert!(map.is_empty());
        assert!(map.remove("T0").is_none());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = FieldMap::new();
        map.insert("c", "3");
        map.insert("a", "1");
        map.insert("b", "2");
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn field_value_accessors() {
        assert_eq!(FieldValue::Text("x".into()).as_text(), Some("x"));
        assert_eq!(FieldValue::Text("x".into()).as_number(), None);
        assert_eq!(FieldValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(FieldValue::Number(3.0).as_text(), None);
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::Text("READY".into()).to_string(), "READY");
        assert_eq!(FieldValue::Number(3.0).to_string(), "3");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_flat_json_object() {
        let mut map = FieldMap::new();
        map.insert("Status", "READY");
        map.insert("ProgressPercent", 3.0);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Status":"READY","ProgressPercent":3.0}"#);
    }
}
