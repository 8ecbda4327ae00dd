//! # fortios-core
//!
//! Core types and utilities for working with FortiOS and FortiManager.
//!
//! This crate provides the shared error type, configuration, HTTP client
//! plumbing and the wire-level value types used by the schema engine and the
//! transport crates.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy shared across the workspace
//! - [`config`] - Device and FortiManager connection settings
//! - [`client`] - HTTP client utilities and fixed-count retry
//! - [`query`] - Query parameter builder (vdom scoping)
//! - [`types`] - Attribute maps and device versions

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{AttributeMap, DeviceVersion, VersionRange};
