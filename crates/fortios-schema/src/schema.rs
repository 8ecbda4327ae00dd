//! Declarative resource schemas.
//!
//! A [`ResourceSchema`] is the single source of truth for one resource type:
//! which typed attributes exist, which wire key each maps to, which converter
//! runs on read, and which constraints apply. The builder ([`crate::expand`])
//! and unflattener ([`crate::flatten`]) are driven entirely by this table.

use crate::state::ResourceState;
use crate::value::{AttrValue, TableEntry};
use fortios_core::{DeviceVersion, Error, Result, VersionRange};

/// Local attribute naming the vdom a resource lives in.
pub const ATTR_VDOMPARAM: &str = "vdomparam";
/// Local attribute selecting nested table ordering on read.
pub const ATTR_DYNAMIC_SORT_SUBTABLE: &str = "dynamic_sort_subtable";
/// Local attribute selecting the nested table read policy.
pub const ATTR_GET_ALL_TABLES: &str = "get_all_tables";

/// Shape of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    /// Free-form or enumerated string
    String,
    /// Integer
    Integer,
    /// Boolean
    Boolean,
    /// Nested table of sub-objects
    Table(TableSchema),
}

impl AttributeKind {
    /// Short name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "bool",
            Self::Table(_) => "table",
        }
    }

    fn default_converter(&self) -> Converter {
        match self {
            Self::String | Self::Table(_) => Converter::Passthrough,
            Self::Integer => Converter::Integer,
            Self::Boolean => Converter::Boolean,
        }
    }
}

/// Whether a table behaves as an ordered list or an unordered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrdering {
    /// Position is significant
    List,
    /// Position is not significant
    Set,
}

/// Sub-schema of a nested table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// List or set semantics
    pub ordering: TableOrdering,
    /// Sub-attribute used as the entry key when re-sorting
    pub sort_key: Option<&'static str>,
    /// Sub-attributes
    pub attributes: Vec<Attribute>,
}

impl TableSchema {
    /// An ordered table.
    #[must_use]
    pub fn list(attributes: Vec<Attribute>) -> Self {
        Self {
            ordering: TableOrdering::List,
            sort_key: None,
            attributes,
        }
    }

    /// An unordered table.
    #[must_use]
    pub fn set(attributes: Vec<Attribute>) -> Self {
        Self {
            ordering: TableOrdering::Set,
            sort_key: None,
            attributes,
        }
    }

    /// Designate the key entries are sorted by.
    #[must_use]
    pub fn sorted_by(mut self, key: &'static str) -> Self {
        self.sort_key = Some(key);
        self
    }

    /// Look up a sub-attribute by typed name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// Per-field conversion applied when reading wire values into state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Value is stored as received (strings and tables)
    Passthrough,
    /// Coerce JSON numbers, integral floats and numeric strings to integers
    Integer,
    /// Accept JSON booleans and `"true"`/`"false"`
    Boolean,
}

/// Value constraint checked before a value is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// String length in characters, inclusive
    StringLen {
        /// Minimum length
        min: usize,
        /// Maximum length
        max: usize,
    },
    /// Integer range, inclusive
    IntRange {
        /// Minimum value
        min: i64,
        /// Maximum value
        max: i64,
    },
    /// Canonical UUID string
    Uuid,
    /// One of a fixed set of strings
    OneOf(&'static [&'static str]),
}

impl Constraint {
    fn check(&self, path: &str, value: &AttrValue) -> Result<()> {
        let fail = |message: String| Err(Error::ValidationError(format!("{path}: {message}")));
        match (self, value) {
            (Self::StringLen { min, max }, AttrValue::String(s)) => {
                let len = s.chars().count();
                if len < *min || len > *max {
                    return fail(format!(
                        "expected length between {min} and {max}, got {len}"
                    ));
                }
            }
            (Self::IntRange { min, max }, AttrValue::Int(i)) => {
                if i < min || i > max {
                    return fail(format!("expected value between {min} and {max}, got {i}"));
                }
            }
            (Self::Uuid, AttrValue::String(s)) => {
                if uuid::Uuid::parse_str(s).is_err() {
                    return fail(format!("`{s}` is not a valid UUID"));
                }
            }
            (Self::OneOf(allowed), AttrValue::String(s)) => {
                if !allowed.contains(&s.as_str()) {
                    return fail(format!("expected one of {allowed:?}, got `{s}`"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// One typed attribute and its wire mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Typed (underscored) name
    pub name: &'static str,
    /// Wire (hyphenated) key
    pub wire_key: String,
    /// Value shape
    pub kind: AttributeKind,
    /// Converter applied on read
    pub converter: Converter,
    /// Must be set by the user
    pub required: bool,
    /// Device supplies a value when unset
    pub computed: bool,
    /// Changing the value replaces the object
    pub force_new: bool,
    /// Secret; never refreshed from the device
    pub sensitive: bool,
    /// Never sent to or read from the device
    pub local_only: bool,
    /// Value assumed when state holds none
    pub default: Option<AttrValue>,
    /// Constraint checked before sending
    pub constraint: Option<Constraint>,
    /// Device versions that carry the attribute
    pub available: VersionRange,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            wire_key: name.replace('_', "-"),
            converter: kind.default_converter(),
            kind,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            local_only: false,
            default: None,
            constraint: None,
            available: VersionRange::any(),
        }
    }

    /// A string attribute.
    #[must_use]
    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String)
    }

    /// An integer attribute.
    #[must_use]
    pub fn int(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Integer)
    }

    /// A boolean attribute.
    #[must_use]
    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Boolean)
    }

    /// A nested table attribute.
    #[must_use]
    pub fn table(name: &'static str, table: TableSchema) -> Self {
        Self::new(name, AttributeKind::Table(table))
    }

    /// A local-only string attribute with a default value.
    #[must_use]
    pub fn local(name: &'static str, default: Option<&'static str>) -> Self {
        let mut attr = Self::string(name);
        attr.local_only = true;
        attr.default = default.map(AttrValue::from);
        attr
    }

    /// Override the wire key.
    #[must_use]
    pub fn wire(mut self, key: &'static str) -> Self {
        self.wire_key = key.to_string();
        self
    }

    /// Override the read converter.
    #[must_use]
    pub const fn converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Mark as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark as force-new.
    #[must_use]
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark as sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Constrain string length.
    #[must_use]
    pub fn len_between(mut self, min: usize, max: usize) -> Self {
        self.constraint = Some(Constraint::StringLen { min, max });
        self
    }

    /// Constrain integer range.
    #[must_use]
    pub fn int_between(mut self, min: i64, max: i64) -> Self {
        self.constraint = Some(Constraint::IntRange { min, max });
        self
    }

    /// Constrain to a UUID.
    #[must_use]
    pub fn uuid(mut self) -> Self {
        self.constraint = Some(Constraint::Uuid);
        self
    }

    /// Constrain to a fixed set of strings.
    #[must_use]
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.constraint = Some(Constraint::OneOf(allowed));
        self
    }

    /// Only present on devices at or above `version`.
    #[must_use]
    pub const fn since(mut self, version: DeviceVersion) -> Self {
        self.available.since = Some(version);
        self
    }

    /// Only present on devices at or below `version`.
    #[must_use]
    pub const fn until(mut self, version: DeviceVersion) -> Self {
        self.available.until = Some(version);
        self
    }

    /// Sub-schema, if this is a table.
    #[must_use]
    pub const fn table_schema(&self) -> Option<&TableSchema> {
        match &self.kind {
            AttributeKind::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Whether the attribute exists on `version` (unknown version: yes).
    #[must_use]
    pub fn available_on(&self, version: Option<&DeviceVersion>) -> bool {
        version.map_or(true, |v| self.available.contains(v))
    }

    fn validate(&self, path: &str, value: &AttrValue) -> Result<()> {
        match (&self.kind, value) {
            (AttributeKind::String, AttrValue::String(_))
            | (AttributeKind::Integer, AttrValue::Int(_))
            | (AttributeKind::Boolean, AttrValue::Bool(_)) => {}
            (AttributeKind::Table(table), AttrValue::Table(entries)) => {
                for (index, row) in entries.iter().enumerate() {
                    validate_entry(table, &format!("{path}.{index}"), row)?;
                }
            }
            (kind, other) => {
                return Err(Error::ValidationError(format!(
                    "{path}: expected {}, got {}",
                    kind.type_name(),
                    other.type_name()
                )));
            }
        }

        if let Some(constraint) = &self.constraint {
            constraint.check(path, value)?;
        }
        Ok(())
    }
}

fn validate_entry(table: &TableSchema, path: &str, row: &TableEntry) -> Result<()> {
    for (key, value) in row {
        let Some(attr) = table.attribute(key) else {
            return Err(Error::ValidationError(format!(
                "{path}: unknown attribute `{key}`"
            )));
        };
        attr.validate(&format!("{path}.{key}"), value)?;
    }
    for attr in table.attributes.iter().filter(|attr| attr.required) {
        if !row.get(attr.name).is_some_and(AttrValue::is_set) {
            return Err(Error::ValidationError(format!(
                "{path}.{}: required attribute is not set",
                attr.name
            )));
        }
    }
    Ok(())
}

/// What deleting a settings resource does on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    /// Send every held attribute as `null` so the device restores defaults
    Reset,
    /// Issue a DELETE against the settings path
    Remove,
    /// Only drop local identity
    Forget,
}

/// Whether a resource is a keyed collection member or a singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Member of a table addressed by its primary key
    Collection {
        /// Typed attribute holding the primary key
        mkey: &'static str,
    },
    /// Singleton settings object, created by updating it
    Settings {
        /// Delete semantics
        on_delete: DeleteBehavior,
    },
}

/// Declarative description of one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    /// Typed resource name, e.g. `firewall_vipgrp64`
    pub type_name: &'static str,
    /// cmdb path, e.g. `firewall/vipgrp64`
    pub path: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Collection or settings
    pub kind: ResourceKind,
    /// Attributes
    pub attributes: Vec<Attribute>,
    /// Device versions that carry the resource
    pub available: VersionRange,
}

impl ResourceSchema {
    /// Create a collection resource schema.
    #[must_use]
    pub fn collection(type_name: &'static str, path: &'static str, mkey: &'static str) -> Self {
        Self {
            type_name,
            path,
            description: "",
            kind: ResourceKind::Collection { mkey },
            attributes: Vec::new(),
            available: VersionRange::any(),
        }
    }

    /// Create a settings resource schema.
    #[must_use]
    pub fn settings(type_name: &'static str, path: &'static str, on_delete: DeleteBehavior) -> Self {
        Self {
            type_name,
            path,
            description: "",
            kind: ResourceKind::Settings { on_delete },
            attributes: Vec::new(),
            available: VersionRange::any(),
        }
    }

    /// Set the description.
    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Only present on devices at or above `version`.
    #[must_use]
    pub const fn since(mut self, version: DeviceVersion) -> Self {
        self.available.since = Some(version);
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add the local `vdomparam` attribute.
    #[must_use]
    pub fn vdom_scoped(self) -> Self {
        self.with(Attribute::local(ATTR_VDOMPARAM, None).force_new().computed())
    }

    /// Add `dynamic_sort_subtable` and `get_all_tables`.
    #[must_use]
    pub fn with_table_controls(self) -> Self {
        self.with(Attribute::local(ATTR_DYNAMIC_SORT_SUBTABLE, Some("false")))
            .with(Attribute::local(ATTR_GET_ALL_TABLES, Some("false")))
    }

    /// Look up an attribute by typed name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Attributes exchanged with the device.
    pub fn remote_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|attr| !attr.local_only)
    }

    /// Check that the device firmware carries this resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when `version` is outside the
    /// resource's availability range.
    pub fn check_version(&self, version: &DeviceVersion) -> Result<()> {
        if self.available.contains(version) {
            return Ok(());
        }
        let required = match (self.available.since, self.available.until) {
            (Some(since), _) if *version < since => format!("{since} or later"),
            (_, Some(until)) => format!("{until} or earlier"),
            _ => "a different firmware".to_string(),
        };
        Err(Error::ValidationError(format!(
            "{} requires FortiOS {required}, device runs {version}",
            self.type_name
        )))
    }

    /// Whether this is a singleton settings resource.
    #[must_use]
    pub const fn is_settings(&self) -> bool {
        matches!(self.kind, ResourceKind::Settings { .. })
    }

    /// Whether the resource declares the `vdomparam` attribute.
    #[must_use]
    pub fn is_vdom_scoped(&self) -> bool {
        self.attribute(ATTR_VDOMPARAM).is_some()
    }

    /// Fill unset attributes that declare a default.
    pub fn apply_defaults(&self, state: &mut ResourceState) {
        for attr in &self.attributes {
            if let Some(default) = &attr.default {
                if state.get(attr.name).is_none() {
                    state.set(attr.name, default.clone());
                }
            }
        }
    }

    /// Reject in-place changes to attributes that require a new object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the first force-new attribute
    /// whose committed value differs from the desired one.
    pub fn check_in_place_update(&self, state: &ResourceState) -> Result<()> {
        let changed = self.attributes.iter().find(|attr| {
            attr.force_new
                && state.prior(attr.name).is_some_and(AttrValue::is_set)
                && state.get_ok(attr.name).is_some()
                && state.has_change(attr.name)
        });
        match changed {
            Some(attr) => Err(Error::ValidationError(format!(
                "{}: `{}` cannot change in place, the resource must be replaced",
                self.type_name, attr.name
            ))),
            None => Ok(()),
        }
    }

    /// Check state against types, required flags and constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the first offending attribute,
    /// or for attributes the schema does not declare.
    pub fn validate(&self, state: &ResourceState) -> Result<()> {
        for (name, value) in state.values() {
            let Some(attr) = self.attribute(name) else {
                return Err(Error::ValidationError(format!(
                    "{}: unknown attribute `{name}`",
                    self.type_name
                )));
            };
            if value.is_set() {
                attr.validate(name, value)?;
            }
        }

        for attr in self.attributes.iter().filter(|attr| attr.required) {
            if state.get_ok(attr.name).is_none() {
                return Err(Error::ValidationError(format!(
                    "{}: required attribute is not set",
                    attr.name
                )));
            }
        }
        Ok(())
    }
}
