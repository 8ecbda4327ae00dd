//! # fortios-provider
//!
//! Drives FortiOS configuration objects through create, read, update, delete
//! and import against a FortiGate.
//!
//! ## Modules
//!
//! - [`dispatcher`] - CRUD Dispatcher and lifecycle
//! - [`session`] - Per-session transport, default vdom and version cache
//! - [`registry`] - Resource schemas by typed name
//! - [`config`] - Environment-driven provider configuration
//!
//! ## Example
//!
//! ```no_run
//! use fortios_provider::{ProviderConfig, ResourceState};
//!
//! # async fn run() -> fortios_provider::Result<()> {
//! let dispatcher = ProviderConfig::from_env()?.dispatcher()?;
//!
//! let mut state = ResourceState::new();
//! state.set("status", "disable");
//! state.set("conn_timeout", 10_i64);
//! dispatcher
//!     .create("logfortianalyzer3_overridesetting", &mut state)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatcher;
pub mod registry;
mod resources;
pub mod session;

pub use config::ProviderConfig;
pub use dispatcher::{Dispatcher, Lifecycle};
pub use fortios_schema::{AttrValue, ResourceState};
pub use registry::ResourceRegistry;
pub use session::ProviderSession;

/// Convenient result alias that reuses the shared FortiOS error type.
pub type Result<T> = fortios_core::Result<T>;
