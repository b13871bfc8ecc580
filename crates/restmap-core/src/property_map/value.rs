//! Values stored in a [`PropertyMap`](super::PropertyMap)

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Insertion-ordered map of named properties
pub type Properties = IndexMap<String, PropertyValue>;

/// A node in the property tree: a scalar leaf, a nested map, or a list
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<PropertyValue>),
    Map(Properties),
}

impl PropertyValue {
    /// Scalars are everything that is neither a map nor a list
    pub fn is_scalar(&self) -> bool {
        !matches!(self, PropertyValue::List(_) | PropertyValue::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// True for empty maps and empty lists
    pub fn is_empty_container(&self) -> bool {
        match self {
            PropertyValue::List(items) => items.is_empty(),
            PropertyValue::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Properties> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Properties> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<PropertyValue>> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text form of a scalar as it appears in a URL or header.
    ///
    /// Returns `None` for maps and lists. `Null` renders as an empty string.
    pub fn to_text(&self) -> Option<String> {
        match self {
            PropertyValue::Null => Some(String::new()),
            PropertyValue::Bool(b) => Some(b.to_string()),
            PropertyValue::Number(n) => Some(n.to_string()),
            PropertyValue::String(s) => Some(s.clone()),
            PropertyValue::List(_) | PropertyValue::Map(_) => None,
        }
    }

    /// Convert into a `serde_json::Value`, keeping key order
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Number(n) => Value::Number(n.clone()),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            PropertyValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Keys `"0".."N-1"` in order: the map is really a list.
    ///
    /// This misreads keyed maps whose field names happen to be consecutive
    /// integers starting at zero.
    pub(crate) fn has_sequential_keys(map: &Properties) -> bool {
        !map.is_empty()
            && map
                .keys()
                .enumerate()
                .all(|(i, key)| *key == i.to_string())
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => PropertyValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                PropertyValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&String> for PropertyValue {
    fn from(value: &String) -> Self {
        PropertyValue::String(value.clone())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(PropertyValue::Number)
            .unwrap_or(PropertyValue::Null)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

impl From<Properties> for PropertyValue {
    fn from(map: Properties) -> Self {
        PropertyValue::Map(map)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Null => serializer.serialize_unit(),
            PropertyValue::Bool(b) => serializer.serialize_bool(*b),
            PropertyValue::Number(n) => n.serialize(serializer),
            PropertyValue::String(s) => serializer.serialize_str(s),
            PropertyValue::List(items) => items.serialize(serializer),
            PropertyValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Into::into)
    }
}
