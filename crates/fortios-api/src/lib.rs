//! FortiGate REST client for FortiOS configuration objects.
//!
//! Provides the response envelope model, the [`Transport`] seam the CRUD
//! dispatcher is written against, and an asynchronous client for the
//! `/api/v2/cmdb` and `/api/v2/monitor/system/status` endpoints.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod transport;

pub use client::{FortiosClient, FortiosClientBuilder};
pub use models::{cmdb_path, ApiResponse};
pub use transport::Transport;

/// Convenient result alias that reuses the shared FortiOS error type.
pub type Result<T> = fortios_core::Result<T>;
