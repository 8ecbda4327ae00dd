//! # fortios-schema
//!
//! Declarative resource schemas and the conversion engine between typed
//! resource state and the FortiOS wire representation.
//!
//! ## Modules
//!
//! - [`schema`] - Attribute and resource declarations
//! - [`state`] - Locally held resource state with change tracking
//! - [`value`] - Typed attribute values
//! - [`expand`] - Object Builder (state to wire)
//! - [`flatten`] - Object Unflattener (wire to state)
//!
//! ## Example
//!
//! ```
//! use fortios_schema::{build_object, Attribute, BuildMode, ResourceSchema, ResourceState};
//!
//! let schema = ResourceSchema::collection("firewall_vipgrp64", "firewall/vipgrp64", "name")
//!     .with(Attribute::string("name").required())
//!     .with(Attribute::int("color").int_between(0, 32));
//!
//! let mut state = ResourceState::new();
//! state.set("name", "grp1");
//! state.set("color", 3_i64);
//!
//! let object = build_object(&schema, &state, None, BuildMode::Apply).unwrap();
//! assert_eq!(object["color"], 3);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod expand;
pub mod flatten;
pub mod schema;
pub mod state;
pub mod value;

pub use expand::{build_object, BuildMode};
pub use flatten::{refresh_object, RefreshOptions, SortMode, TableReadPolicy};
pub use schema::{
    Attribute, AttributeKind, Constraint, Converter, DeleteBehavior, ResourceKind,
    ResourceSchema, TableOrdering, TableSchema, ATTR_DYNAMIC_SORT_SUBTABLE, ATTR_GET_ALL_TABLES,
    ATTR_VDOMPARAM,
};
pub use state::{ResourceState, Values};
pub use value::{entry, AttrValue, TableEntry};
