//! Request-time attribute values and spec-level defaults.
//!
//! A request body distinguishes three states per attribute: a concrete value,
//! an explicit `null`, and "not specified". Absence of a key in the body and
//! the [`AttrValue::NotSpecified`] marker are the same state.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde_json::{Map, Value};

/// Literal used in declarative schema documents to denote the
/// "not specified" sentinel as a default value.
pub const ATTR_NOT_SPECIFIED: &str = "ATTR_NOT_SPECIFIED";

/// The value of one attribute inside a request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttrValue {
    /// The caller supplied a non-null value.
    Specified(Value),
    /// The caller supplied `null`.
    ExplicitNull,
    /// The caller did not supply a value.
    #[default]
    NotSpecified,
}

impl AttrValue {
    /// Wrap a JSON value, mapping `null` to [`AttrValue::ExplicitNull`].
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::ExplicitNull,
            other => Self::Specified(other),
        }
    }

    /// The JSON view of a supplied value. `NotSpecified` has no JSON view.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Specified(v) => Some(v.clone()),
            Self::ExplicitNull => Some(Value::Null),
            Self::NotSpecified => None,
        }
    }

    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Specified(v) => Some(v),
            Self::ExplicitNull => Some(Value::Null),
            Self::NotSpecified => None,
        }
    }

    #[must_use]
    pub fn is_not_specified(&self) -> bool {
        matches!(self, Self::NotSpecified)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::ExplicitNull)
    }

    /// True when the caller supplied a non-null value.
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Specified(_))
    }

    #[must_use]
    pub fn as_specified(&self) -> Option<&Value> {
        match self {
            Self::Specified(v) => Some(v),
            Self::ExplicitNull | Self::NotSpecified => None,
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

/// The `default` entry of an attribute spec.
///
/// A spec without any default is modelled as `Option::<AttrDefault>::None`
/// by [`crate::AttributeSpec`]; such attributes are required on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrDefault {
    /// A concrete default, possibly `null`.
    Value(Value),
    /// The default marks the attribute as "not specified by the caller".
    NotSpecified,
}

impl AttrDefault {
    /// The request-body state produced when this default is filled in.
    #[must_use]
    pub fn to_attr_value(&self) -> AttrValue {
        match self {
            Self::Value(v) => AttrValue::from_json(v.clone()),
            Self::NotSpecified => AttrValue::NotSpecified,
        }
    }

    /// Parse a declarative default, recognising [`ATTR_NOT_SPECIFIED`].
    #[must_use]
    pub fn from_declared(value: Value) -> Self {
        match value {
            Value::String(ref s) if s == ATTR_NOT_SPECIFIED => Self::NotSpecified,
            other => Self::Value(other),
        }
    }
}

impl From<Value> for AttrDefault {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// A mutable request body owned by one request.
///
/// Keys map to [`AttrValue`]s. Writing [`AttrValue::NotSpecified`] records the
/// marker so that later stages can tell a filled-in "not specified" default
/// apart from a key that was never processed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestBody {
    attrs: BTreeMap<String, AttrValue>,
}

impl RequestBody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a body from a decoded JSON object.
    #[must_use]
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        Self {
            attrs: map
                .into_iter()
                .map(|(k, v)| (k, AttrValue::from_json(v)))
                .collect(),
        }
    }

    /// Render the body as a JSON object, dropping `NotSpecified` entries.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.attrs
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
            .collect()
    }

    /// Current state of `key`; absent keys read as `NotSpecified`.
    #[must_use]
    pub fn get(&self, key: &str) -> AttrValue {
        self.attrs.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn get_ref(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// True if the key is present at all, including as the `NotSpecified` marker.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// True if the key holds a supplied value or an explicit null.
    #[must_use]
    pub fn is_supplied(&self, key: &str) -> bool {
        self.attrs
            .get(key)
            .is_some_and(|v| !v.is_not_specified())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.attrs.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attrs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl From<Map<String, Value>> for RequestBody {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_json_map(map)
    }
}

impl<'a> IntoIterator for &'a RequestBody {
    type Item = (&'a String, &'a AttrValue);
    type IntoIter = btree_map::Iter<'a, String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for RequestBody {
    fn from_iter<T: IntoIterator<Item = (K, AttrValue)>>(iter: T) -> Self {
        Self {
            attrs: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Key-addressable storage that default filling can operate on.
///
/// Implemented for the top-level [`RequestBody`] and for nested JSON objects,
/// where the `NotSpecified` state is represented by key absence.
pub trait Slots {
    fn slot(&self, key: &str) -> AttrValue;
    fn set_slot(&mut self, key: &str, value: AttrValue);
}

impl Slots for RequestBody {
    fn slot(&self, key: &str) -> AttrValue {
        self.get(key)
    }

    fn set_slot(&mut self, key: &str, value: AttrValue) {
        self.insert(key, value);
    }
}

impl Slots for Map<String, Value> {
    fn slot(&self, key: &str) -> AttrValue {
        self.get(key)
            .cloned()
            .map_or(AttrValue::NotSpecified, AttrValue::from_json)
    }

    fn set_slot(&mut self, key: &str, value: AttrValue) {
        match value.into_json() {
            Some(json) => {
                self.insert(key.to_owned(), json);
            }
            None => {
                self.remove(key);
            }
        }
    }
}
