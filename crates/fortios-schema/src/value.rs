//! Typed attribute values held in resource state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of a nested table, keyed by sub-attribute name.
pub type TableEntry = BTreeMap<String, AttrValue>;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// String value
    String(String),
    /// Nested table
    Table(Vec<TableEntry>),
}

impl AttrValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the table entries, if this is a table.
    #[must_use]
    pub fn as_table(&self) -> Option<&[TableEntry]> {
        match self {
            Self::Table(entries) => Some(entries),
            _ => None,
        }
    }

    /// Whether the value counts as explicitly set.
    ///
    /// Empty strings and empty tables are treated as unset; integers and
    /// booleans are set whenever present, zero and `false` included.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::String(value) => !value.is_empty(),
            Self::Table(entries) => !entries.is_empty(),
            Self::Int(_) | Self::Bool(_) => true,
        }
    }

    /// Short name of the value's type, used in conversion errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::String(_) => "string",
            Self::Table(_) => "table",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Table(entries) => write!(f, "<table of {}>", entries.len()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<TableEntry>> for AttrValue {
    fn from(entries: Vec<TableEntry>) -> Self {
        Self::Table(entries)
    }
}

/// Build a table entry from `(name, value)` pairs.
pub fn entry<I, K, V>(pairs: I) -> TableEntry
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_set_treats_zero_as_set_and_empty_as_unset() {
        assert!(AttrValue::Int(0).is_set());
        assert!(AttrValue::Bool(false).is_set());
        assert!(!AttrValue::String(String::new()).is_set());
        assert!(!AttrValue::Table(Vec::new()).is_set());
        assert!(AttrValue::from("disable").is_set());
    }

    #[test]
    fn entry_builds_rows() {
        let row = entry([("name", "vip1")]);
        assert_eq!(row.get("name"), Some(&AttrValue::from("vip1")));
    }

    #[test]
    fn serde_is_untagged() {
        let value: AttrValue = serde_json::from_str("[{\"id\": 3}]").unwrap();
        assert_eq!(value, AttrValue::Table(vec![entry([("id", 3_i64)])]));
        assert_eq!(serde_json::to_string(&AttrValue::Int(7)).unwrap(), "7");
    }
}
