//! Attribute payloads carried by nodes and edges

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single attribute value. Filings carry names, addresses and dates as
/// strings and file numbers as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
}

impl PropertyValue {
    /// A string with nothing but whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            PropertyValue::String(s) => s.trim().is_empty(),
            PropertyValue::Integer(_) => false,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

/// Values beyond `i64::MAX` keep their decimal form as a string
impl From<u64> for PropertyValue {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| PropertyValue::String(i.to_string()), PropertyValue::Integer)
    }
}

/// Ordered attribute bundle. Equality ignores insertion order.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// Keep every non-blank value of `old`, take the rest from `new`
pub fn fill_gaps(old: &PropertyMap, new: &PropertyMap) -> PropertyMap {
    let mut merged = old.clone();
    for (key, value) in new {
        if value.is_blank() {
            continue;
        }
        match merged.get(key) {
            Some(existing) if !existing.is_blank() => {}
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
