//! Object Unflattener: wire attribute map back into typed state.
//!
//! Every remote attribute is read from its wire key and passed through its
//! converter. Nested tables are reconciled according to a
//! [`TableReadPolicy`] and optionally re-sorted by their declared key.

use crate::schema::{
    Attribute, AttributeKind, Converter, ResourceSchema, TableSchema, ATTR_DYNAMIC_SORT_SUBTABLE,
    ATTR_GET_ALL_TABLES,
};
use crate::state::ResourceState;
use crate::value::{AttrValue, TableEntry};
use fortios_core::{AttributeMap, DeviceVersion, Error, Result};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Whether nested tables are refreshed when the local state never set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableReadPolicy {
    /// Always write tables from the device response
    ImportAll,
    /// Only refresh tables the local state already tracks
    OnlyIfTracked,
}

/// Ordering applied to nested table entries before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Keep device order
    #[default]
    Unsorted,
    /// Plain string comparison of the sort key
    Lexical,
    /// Digit runs compared numerically (`port2` before `port10`)
    Natural,
}

impl SortMode {
    /// Interpret a `dynamic_sort_subtable` value.
    #[must_use]
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::Lexical,
            Some("natural") => Self::Natural,
            _ => Self::Unsorted,
        }
    }

    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Unsorted => Ordering::Equal,
            Self::Lexical => a.cmp(b),
            Self::Natural => natural_cmp(a, b),
        }
    }
}

/// Inputs to one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Device version, when known
    pub version: Option<DeviceVersion>,
    /// Session-wide import flag, used when `get_all_tables` is unset
    pub import_all_tables: bool,
    /// Force a table policy regardless of state
    pub policy: Option<TableReadPolicy>,
}

impl RefreshOptions {
    /// Options with nothing known about the device.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: None,
            import_all_tables: false,
            policy: None,
        }
    }

    /// Set the device version.
    #[must_use]
    pub const fn with_version(mut self, version: DeviceVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the session-wide import flag.
    #[must_use]
    pub const fn with_import_all_tables(mut self, import: bool) -> Self {
        self.import_all_tables = import;
        self
    }

    /// Force a table read policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: TableReadPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Resolve the table read policy for `state`.
    #[must_use]
    pub fn table_policy(&self, state: &ResourceState) -> TableReadPolicy {
        if let Some(policy) = self.policy {
            return policy;
        }
        let import = match state.get_str(ATTR_GET_ALL_TABLES) {
            Some(value) => value == "true",
            None => self.import_all_tables,
        };
        if import {
            TableReadPolicy::ImportAll
        } else {
            TableReadPolicy::OnlyIfTracked
        }
    }
}

/// Write the device's view of an object into `state`.
///
/// State is only modified when every attribute converts; a conversion
/// failure on an attribute that does not exist on the device's version is
/// logged and that attribute is left untouched.
///
/// # Errors
///
/// Returns [`Error::FieldConversion`] naming the first attribute that could
/// not be converted.
pub fn refresh_object(
    schema: &ResourceSchema,
    state: &mut ResourceState,
    wire: &AttributeMap,
    options: &RefreshOptions,
) -> Result<()> {
    let policy = options.table_policy(state);
    let sort = SortMode::from_setting(state.get_str(ATTR_DYNAMIC_SORT_SUBTABLE));
    let mut updates: Vec<(&'static str, Option<AttrValue>)> = Vec::new();

    for attr in schema.remote_attributes() {
        if attr.sensitive {
            continue;
        }
        if matches!(attr.kind, AttributeKind::Table(_))
            && policy == TableReadPolicy::OnlyIfTracked
            && state.get_ok(attr.name).is_none()
        {
            continue;
        }

        match read_attribute(attr, wire.get(&attr.wire_key), attr.name, sort) {
            Ok(value) => updates.push((attr.name, value)),
            Err(err) if !attr.available_on(options.version.as_ref()) => {
                warn!(
                    resource = schema.type_name,
                    attribute = attr.name,
                    error = %err,
                    "ignoring attribute not carried by this device version"
                );
            }
            Err(err) => return Err(err),
        }
    }

    for (name, value) in updates {
        match value {
            Some(value) => state.set(name, value),
            None => {
                state.unset(name);
            }
        }
    }
    Ok(())
}

fn read_attribute(
    attr: &Attribute,
    raw: Option<&Value>,
    path: &str,
    sort: SortMode,
) -> Result<Option<AttrValue>> {
    let Some(raw) = raw.filter(|value| !value.is_null()) else {
        return Ok(None);
    };

    if let AttributeKind::Table(table) = &attr.kind {
        let Value::Array(items) = raw else {
            debug!(attribute = path, "table value is not an array");
            return Ok(None);
        };
        let mut entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| read_entry(table, item, &format!("{path}.{index}"), sort))
            .collect::<Result<Vec<_>>>()?;
        if entries.is_empty() {
            return Ok(None);
        }
        if let Some(key) = table.sort_key {
            sort_entries(&mut entries, key, sort);
        }
        return Ok(Some(AttrValue::Table(entries)));
    }

    convert(attr.converter, raw, path).map(Some)
}

fn read_entry(table: &TableSchema, item: &Value, path: &str, sort: SortMode) -> Result<TableEntry> {
    let Value::Object(fields) = item else {
        return Err(Error::field(path, "expected an object in table"));
    };
    let mut row = TableEntry::new();
    for attr in table.attributes.iter().filter(|attr| !attr.local_only) {
        let field = format!("{path}.{}", attr.name);
        if let Some(value) = read_attribute(attr, fields.get(&attr.wire_key), &field, sort)? {
            row.insert(attr.name.to_string(), value);
        }
    }
    Ok(row)
}

fn convert(converter: Converter, raw: &Value, path: &str) -> Result<AttrValue> {
    match (converter, raw) {
        (Converter::Passthrough, Value::String(s)) => Ok(AttrValue::String(s.clone())),
        (Converter::Passthrough, Value::Number(n)) => Ok(AttrValue::String(n.to_string())),
        (Converter::Passthrough, Value::Bool(b)) => Ok(AttrValue::String(b.to_string())),
        (Converter::Integer, Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(AttrValue::Int)
            .ok_or_else(|| Error::field(path, format!("`{n}` is not an integer"))),
        (Converter::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| Error::field(path, format!("`{s}` is not an integer"))),
        (Converter::Boolean, Value::Bool(b)) => Ok(AttrValue::Bool(*b)),
        (Converter::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Ok(AttrValue::Bool(true)),
            "false" => Ok(AttrValue::Bool(false)),
            _ => Err(Error::field(path, format!("`{s}` is not a boolean"))),
        },
        (converter, other) => Err(Error::field(
            path,
            format!("cannot convert {} with {converter:?} converter", json_type(other)),
        )),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then(|| value as i64)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn sort_entries(entries: &mut [TableEntry], key: &str, mode: SortMode) {
    if mode == SortMode::Unsorted {
        return;
    }
    let sort_value = |row: &TableEntry| row.get(key).map(ToString::to_string).unwrap_or_default();
    entries.sort_by(|a, b| mode.compare(&sort_value(a), &sort_value(b)));
}

/// Compare strings treating runs of ASCII digits as numbers.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    loop {
        match (a.first(), b.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (run_a, rest_a) = split_digits(a);
                let (run_b, rest_b) = split_digits(b);
                let ordering = compare_digit_runs(run_a, run_b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a = rest_a;
                b = rest_b;
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
                a = &a[1..];
                b = &b[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |run: &[u8]| -> usize { run.iter().position(|c| *c != b'0').unwrap_or(run.len()) };
    let (a_sig, b_sig) = (&a[trim(a)..], &b[trim(b)..]);
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.len().cmp(&b.len()))
}
