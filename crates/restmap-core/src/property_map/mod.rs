//! Hierarchical property map addressed by key paths
//!
//! [`PropertyMap`] is the uniform input and output representation for every
//! resource: request fields are written into it with dotted/bracketed key
//! paths (`"Account.Listed"`, `"list[2].field"`) and decoded responses are
//! read back the same way.
//!
//! Reads never fail. A path that does not resolve, or that is not a valid
//! key path at all, simply yields `None`. Writes create every missing
//! intermediate map or list on the way down.

pub mod path;
pub mod value;

pub use path::{KeyPath, ListIndex, Segment};
pub use value::{Properties, PropertyValue};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nested string-keyed property store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    properties: Properties,
}

impl PropertyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a JSON document through [`set_all`](Self::set_all)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: PropertyValue = serde_json::from_str(json)?;
        let mut map = Self::new();
        map.set_all(value)?;
        Ok(map)
    }

    /// Resolve a key path, returning `None` when any segment is missing
    pub fn get(&self, path: &str) -> Option<&PropertyValue> {
        let path = KeyPath::parse(path).ok()?;
        let (intermediate, last) = path.split_last();

        let mut current = &self.properties;
        for segment in intermediate {
            let next = lookup(current, segment)?;
            if next.is_empty_container() {
                return None;
            }
            current = next.as_map()?;
        }

        lookup(current, last)
    }

    /// `true` exactly when [`get`](Self::get) would return a value
    pub fn contains_key(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Assign `value` at `path`, creating intermediate maps and lists.
    ///
    /// A bracketed index may address an existing element or the position
    /// one past the end (which appends); anything further out is rejected.
    /// An intermediate segment that currently holds a scalar is replaced by
    /// an empty map or list.
    pub fn set(&mut self, path: &str, value: impl Into<PropertyValue>) -> Result<&mut Self> {
        let key_path = KeyPath::parse(path)?;
        let (intermediate, last) = key_path.split_last();

        let mut current = &mut self.properties;
        for segment in intermediate {
            current = descend(current, segment, path)?;
        }
        assign(current, last, value.into(), path)?;

        Ok(self)
    }

    /// Bulk import.
    ///
    /// A keyed map has each of its entries `set` individually; keys that are
    /// not valid key paths, or that index past the end of a list, are stored
    /// verbatim at the top level. A sequence
    /// (a list, or a map keyed `"0".."N-1"`) is stored as a list under the
    /// key `"list"`, with every map or list element normalized through this
    /// same method. Empty sources are a no-op.
    pub fn set_all(&mut self, source: impl Into<PropertyValue>) -> Result<&mut Self> {
        match source.into() {
            PropertyValue::Map(map) if PropertyValue::has_sequential_keys(&map) => {
                let items = map.into_values().collect();
                self.import_sequence(items)?;
            }
            PropertyValue::Map(map) => {
                for (key, value) in map {
                    match KeyPath::parse(&key) {
                        Ok(key_path) if is_writable(&self.properties, &key_path) => {
                            self.set(&key, value)?;
                        }
                        _ => {
                            self.properties.insert(key, value);
                        }
                    }
                }
            }
            PropertyValue::List(items) => {
                if !items.is_empty() {
                    self.import_sequence(items)?;
                }
            }
            other => {
                return Err(Error::Validation {
                    field: "source".to_string(),
                    message: format!("cannot import a scalar value ({})", other.to_json()),
                    expected: Some("a map or a list".to_string()),
                });
            }
        }
        Ok(self)
    }

    fn import_sequence(&mut self, items: Vec<PropertyValue>) -> Result<()> {
        let normalized = items
            .into_iter()
            .map(|item| -> Result<PropertyValue> {
                if item.is_scalar() {
                    return Ok(item);
                }
                let mut nested = PropertyMap::new();
                nested.set_all(item)?;
                Ok(PropertyValue::Map(nested.properties))
            })
            .collect::<Result<Vec<_>>>()?;

        self.properties
            .insert("list".to_string(), PropertyValue::List(normalized));
        Ok(())
    }

    /// Remove a top-level key
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.shift_remove(key)
    }

    /// Number of top-level keys
    pub fn size(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Top-level entries in insertion order
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, PropertyValue> {
        self.properties.iter()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn into_properties(self) -> Properties {
        self.properties
    }

    /// Canonical JSON encoding, keys in insertion order
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.properties)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        PropertyValue::Map(self.properties.clone()).to_json()
    }
}

fn lookup<'a>(map: &'a Properties, segment: &Segment) -> Option<&'a PropertyValue> {
    let value = map.get(segment.name())?;
    match segment.index() {
        None => Some(value),
        Some(index) => value.as_list()?.get(index.read_position()),
    }
}

/// Walk one intermediate segment for writing, creating what is missing
fn descend<'a>(
    map: &'a mut Properties,
    segment: &Segment,
    path: &str,
) -> Result<&'a mut Properties> {
    let slot = match segment.index() {
        None => ensure_map(map, segment.name()),
        Some(index) => {
            let list = ensure_list(map, segment.name());
            let position = element_position(list.len(), index, path)?;
            if position == list.len() {
                list.push(PropertyValue::Map(Properties::new()));
            }
            &mut list[position]
        }
    };

    if slot.as_map().is_none() {
        *slot = PropertyValue::Map(Properties::new());
    }
    match slot {
        PropertyValue::Map(nested) => Ok(nested),
        _ => unreachable!("slot was just replaced with a map"),
    }
}

fn assign(map: &mut Properties, segment: &Segment, value: PropertyValue, path: &str) -> Result<()> {
    match segment.index() {
        None => {
            map.insert(segment.name().to_string(), value);
        }
        Some(index) => {
            let list = ensure_list(map, segment.name());
            let position = element_position(list.len(), index, path)?;
            if position == list.len() {
                list.push(value);
            } else {
                list[position] = value;
            }
        }
    }
    Ok(())
}

fn ensure_map<'a>(map: &'a mut Properties, name: &str) -> &'a mut PropertyValue {
    map.entry(name.to_string())
        .or_insert_with(|| PropertyValue::Map(Properties::new()))
}

fn ensure_list<'a>(map: &'a mut Properties, name: &str) -> &'a mut Vec<PropertyValue> {
    let slot = map
        .entry(name.to_string())
        .or_insert_with(|| PropertyValue::List(Vec::new()));
    if slot.as_list().is_none() {
        *slot = PropertyValue::List(Vec::new());
    }
    match slot {
        PropertyValue::List(items) => items,
        _ => unreachable!("slot was just replaced with a list"),
    }
}

/// Whether `set` would succeed, checked without touching the map
fn is_writable(properties: &Properties, key_path: &KeyPath) -> bool {
    let mut current = Some(properties);
    for segment in key_path.segments() {
        let existing = current.and_then(|map| map.get(segment.name()));
        current = match segment.index() {
            None => existing.and_then(PropertyValue::as_map),
            Some(index) => {
                let items = existing.and_then(PropertyValue::as_list).unwrap_or(&[]);
                let position = match index {
                    ListIndex::Append => items.len(),
                    ListIndex::At(n) if n <= items.len() => n,
                    ListIndex::At(_) => return false,
                };
                items.get(position).and_then(PropertyValue::as_map)
            }
        };
    }
    true
}

fn element_position(len: usize, index: ListIndex, path: &str) -> Result<usize> {
    match index {
        ListIndex::Append => Ok(len),
        ListIndex::At(n) if n <= len => Ok(n),
        ListIndex::At(n) => Err(Error::invalid_key_path(
            path,
            format!("index {} is past the end of a list of length {}", n, len),
        )),
    }
}

impl fmt::Display for PropertyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.properties) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<Properties> for PropertyMap {
    fn from(properties: Properties) -> Self {
        Self { properties }
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Map(map.properties)
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = indexmap::map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text<'a>(map: &'a PropertyMap, path: &str) -> Option<&'a str> {
        map.get(path).and_then(PropertyValue::as_str)
    }

    #[test]
    fn test_plain_round_trip() {
        let mut map = PropertyMap::new();
        map.set("name", "widget").unwrap();
        assert_eq!(text(&map, "name"), Some("widget"));
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn test_nested_round_trip() {
        let mut map = PropertyMap::new();
        map.set("a.b.c", 7).unwrap();

        assert_eq!(map.get("a.b.c").and_then(PropertyValue::as_i64), Some(7));
        let inner = map.get("a.b").and_then(PropertyValue::as_map).unwrap();
        assert!(inner.contains_key("c"));
    }

    #[test]
    fn test_fluent_set() {
        let mut map = PropertyMap::new();
        map.set("AccountInquiry.AccountNumber", "5343434343434343")
            .unwrap()
            .set("AccountInquiry.Type", "CARD")
            .unwrap();

        assert_eq!(map.size(), 1);
        assert_eq!(text(&map, "AccountInquiry.Type"), Some("CARD"));
    }

    #[test]
    fn test_append_marker_keeps_insertion_order() {
        let mut map = PropertyMap::new();
        for value in ["x", "y", "z"] {
            map.set("list[]", value).unwrap();
        }

        assert_eq!(text(&map, "list[0]"), Some("x"));
        assert_eq!(text(&map, "list[1]"), Some("y"));
        assert_eq!(text(&map, "list[2]"), Some("z"));
        assert_eq!(text(&map, "list[]"), Some("x"));
        assert!(map.get("list[3]").is_none());
    }

    #[test]
    fn test_indexed_intermediate_creates_map_elements() {
        let mut map = PropertyMap::new();
        map.set("items[0].name", "first").unwrap();
        map.set("items[0].qty", 2).unwrap();
        map.set("items[1].name", "second").unwrap();
        map.set("items[].name", "third").unwrap();

        assert_eq!(text(&map, "items[0].name"), Some("first"));
        assert_eq!(map.get("items[0].qty").and_then(PropertyValue::as_i64), Some(2));
        assert_eq!(text(&map, "items[1].name"), Some("second"));
        assert_eq!(text(&map, "items[2].name"), Some("third"));
        assert_eq!(map.get("items").and_then(PropertyValue::as_list).map(|l| l.len()), Some(3));
    }

    #[test]
    fn test_index_past_end_is_rejected() {
        let mut map = PropertyMap::new();
        let result = map.set("list[3]", "x");
        assert!(matches!(result, Err(Error::InvalidKeyPath { .. })));
        assert!(!map.contains_key("list[3]"));
    }

    #[test]
    fn test_overwrite_by_index() {
        let mut map = PropertyMap::new();
        map.set("list[]", "a").unwrap();
        map.set("list[0]", "b").unwrap();
        assert_eq!(text(&map, "list[0]"), Some("b"));
    }

    #[test]
    fn test_missing_paths_are_absent() {
        let mut map = PropertyMap::new();
        map.set("Account.Listed", true).unwrap();

        assert!(map.get("Account.Missing").is_none());
        assert!(map.get("Other.Listed").is_none());
        assert!(map.get("Account.Listed.Deeper").is_none());
        assert!(map.get("Account[0]").is_none());
        assert!(map.get("Account..Listed").is_none());
        assert!(map.get("").is_none());
    }

    #[test]
    fn test_empty_intermediate_is_absent() {
        let mut map = PropertyMap::new();
        map.set("empty", PropertyValue::Map(Properties::new())).unwrap();
        assert!(map.get("empty").is_some());
        assert!(map.get("empty.anything").is_none());
    }

    #[test]
    fn test_contains_key_matches_get() {
        let mut map = PropertyMap::new();
        assert!(!map.contains_key("a"));
        assert!(!map.contains_key("a.b"));

        map.set("a.b", "v").unwrap();
        assert!(map.contains_key("a.b"));
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("a.c"));
    }

    #[test]
    fn test_null_values_are_present() {
        let mut map = PropertyMap::new();
        map.set("nothing", PropertyValue::Null).unwrap();
        assert!(map.contains_key("nothing"));
    }

    #[test]
    fn test_scalar_intermediate_is_replaced() {
        let mut map = PropertyMap::new();
        map.set("a", "scalar").unwrap();
        map.set("a.b", "nested").unwrap();
        assert_eq!(text(&map, "a.b"), Some("nested"));
    }

    #[test]
    fn test_set_all_merges_keyed_map() {
        let mut map = PropertyMap::new();
        map.set("existing", 1).unwrap();
        map.set_all(json!({"id": "42", "Account.Listed": "True", "nested": {"k": "v"}}))
            .unwrap();

        assert_eq!(map.size(), 4);
        assert_eq!(text(&map, "id"), Some("42"));
        assert_eq!(text(&map, "Account.Listed"), Some("True"));
        assert_eq!(text(&map, "nested.k"), Some("v"));
    }

    #[test]
    fn test_set_all_stores_sequence_under_list() {
        let mut map = PropertyMap::new();
        map.set_all(json!([
            {"id": 1, "title": "first"},
            {"id": 2, "title": "second"}
        ]))
        .unwrap();

        assert_eq!(map.size(), 1);
        assert_eq!(text(&map, "list[0].title"), Some("first"));
        assert_eq!(text(&map, "list[1].title"), Some("second"));
    }

    #[test]
    fn test_set_all_normalizes_sequence_elements() {
        let mut map = PropertyMap::new();
        map.set_all(json!([{"a.b": "dotted"}, [{"x": 1}]])).unwrap();

        assert_eq!(text(&map, "list[0].a.b"), Some("dotted"));
        assert_eq!(
            map.get("list[1].list[0].x").and_then(PropertyValue::as_i64),
            Some(1)
        );
    }

    #[test]
    fn test_set_all_numeric_keys_are_treated_as_list() {
        let mut map = PropertyMap::new();
        map.set_all(json!({"0": {"v": "a"}, "1": {"v": "b"}})).unwrap();

        assert!(map.get("0").is_none());
        assert_eq!(text(&map, "list[1].v"), Some("b"));
    }

    #[test]
    fn test_set_all_keeps_unparseable_keys_verbatim() {
        let mut map = PropertyMap::new();
        map.set_all(json!({"odd[key": "v"})).unwrap();
        assert_eq!(map.properties().get("odd[key").and_then(PropertyValue::as_str), Some("v"));
    }

    #[test]
    fn test_set_all_keeps_out_of_range_keys_verbatim() {
        let mut map = PropertyMap::new();
        map.set_all(json!({"items[3]": 1, "tags[0]": "a", "tags[1]": "b"}))
            .unwrap();

        assert_eq!(map.properties().get("items[3]"), Some(&PropertyValue::from(1)));
        assert!(!map.properties().contains_key("items"));
        assert_eq!(map.get("tags[1]").and_then(PropertyValue::as_str), Some("b"));
        assert_eq!(map.size(), 2);
    }

    #[test]
    fn test_set_all_rejects_scalar() {
        let mut map = PropertyMap::new();
        assert!(matches!(map.set_all("scalar"), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_set_all_empty_sources_are_noop() {
        let mut map = PropertyMap::new();
        map.set_all(json!([])).unwrap();
        map.set_all(json!({})).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_serialize_preserves_insertion_order() {
        let mut map = PropertyMap::new();
        map.set("z", 1).unwrap();
        map.set("a.list[]", "x").unwrap();
        map.set("m", true).unwrap();

        assert_eq!(map.to_json_string().unwrap(), r#"{"z":1,"a":{"list":["x"]},"m":true}"#);
        assert_eq!(map.to_string(), map.to_json_string().unwrap());
    }

    #[test]
    fn test_from_json_str() {
        let map = PropertyMap::from_json_str(r#"{"Account":{"Listed":"True","ReasonCode":"S"}}"#)
            .unwrap();
        assert_eq!(text(&map, "Account.ReasonCode"), Some("S"));

        assert!(PropertyMap::from_json_str("not json").is_err());
    }

    #[test]
    fn test_remove_top_level() {
        let mut map: PropertyMap = [("id", "1"), ("name", "n")].into_iter().collect();
        assert_eq!(map.remove("id"), Some(PropertyValue::from("1")));
        assert_eq!(map.size(), 1);
        assert!(map.remove("id").is_none());
    }
}
