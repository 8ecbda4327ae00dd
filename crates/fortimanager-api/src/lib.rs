//! FortiManager JSON-RPC client.
//!
//! Requests are single-element JSON-RPC envelopes posted to `/jsonrpc`. Each
//! logical call runs inside its own login/logout pair, see
//! [`FmgClient::with_session`].

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{FmgClient, FmgClientBuilder, TraceGuard};
pub use models::{RpcMethod, RpcRequest, RpcResponse, RpcResult, RpcStatus, Session};

/// Convenient result alias that reuses the shared FortiOS error type.
pub type Result<T> = fortios_core::Result<T>;
