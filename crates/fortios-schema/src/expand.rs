//! Object Builder: typed state to wire attribute map.

use crate::schema::{Attribute, AttributeKind, ResourceSchema, TableSchema};
use crate::state::ResourceState;
use crate::value::{AttrValue, TableEntry};
use fortios_core::{AttributeMap, DeviceVersion, Error, Result};
use serde_json::Value;
use tracing::debug;

/// How the payload is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Send set values, plus `null`/`[]` for non-computed attributes that
    /// were just unset
    Apply,
    /// Send every held attribute as `null` to restore device defaults
    Clear,
}

/// Convert typed state into the wire object for `schema`.
///
/// Attributes outside their availability range on `version` are skipped, as
/// are local-only attributes. Nested tables keep only the keys their
/// sub-schema declares.
///
/// # Errors
///
/// Returns [`Error::FieldConversion`] with the full field path when a held
/// value does not match its declared kind. Nothing is returned in that case.
pub fn build_object(
    schema: &ResourceSchema,
    state: &ResourceState,
    version: Option<&DeviceVersion>,
    mode: BuildMode,
) -> Result<AttributeMap> {
    let mut object = AttributeMap::new();

    for attr in schema.remote_attributes() {
        if !attr.available_on(version) {
            debug!(
                resource = schema.type_name,
                attribute = attr.name,
                "skipping attribute unavailable on device version"
            );
            continue;
        }

        match mode {
            BuildMode::Apply => {
                if let Some(value) = state.get_ok(attr.name) {
                    object.insert(attr.wire_key.clone(), to_wire(attr, value, attr.name)?);
                } else if !attr.computed && was_unset(state, attr.name) {
                    object.insert(attr.wire_key.clone(), unset_marker(attr));
                }
            }
            BuildMode::Clear => {
                if state.get(attr.name).is_some() {
                    object.insert(attr.wire_key.clone(), Value::Null);
                }
            }
        }
    }

    Ok(object)
}

fn was_unset(state: &ResourceState, name: &str) -> bool {
    state.has_change(name) && state.prior(name).is_some_and(AttrValue::is_set)
}

fn unset_marker(attr: &Attribute) -> Value {
    match attr.kind {
        AttributeKind::Table(_) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

fn to_wire(attr: &Attribute, value: &AttrValue, path: &str) -> Result<Value> {
    match (&attr.kind, value) {
        (AttributeKind::String, AttrValue::String(s)) => Ok(Value::String(s.clone())),
        (AttributeKind::Integer, AttrValue::Int(i)) => Ok(Value::from(*i)),
        (AttributeKind::Boolean, AttrValue::Bool(b)) => Ok(Value::Bool(*b)),
        (AttributeKind::Table(table), AttrValue::Table(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, row)| table_entry_to_wire(table, row, &format!("{path}.{index}")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (kind, other) => Err(Error::field(
            path,
            format!("expected {}, got {}", kind.type_name(), other.type_name()),
        )),
    }
}

fn table_entry_to_wire(table: &TableSchema, row: &TableEntry, path: &str) -> Result<Value> {
    let mut object = AttributeMap::new();
    for attr in table.attributes.iter().filter(|attr| !attr.local_only) {
        if let Some(value) = row.get(attr.name).filter(|value| value.is_set()) {
            let field = format!("{path}.{}", attr.name);
            object.insert(attr.wire_key.clone(), to_wire(attr, value, &field)?);
        }
    }
    Ok(Value::Object(object))
}
