//! Transport seam used by the CRUD dispatcher.

use crate::models::ApiResponse;
use crate::Result;
use async_trait::async_trait;
use fortios_core::{AttributeMap, DeviceVersion};

/// Authenticated create/read/update/delete against a device's configuration
/// database.
///
/// `path` is the cmdb path (`firewall/vipgrp64`); `mkey` addresses one member
/// of a table and is `None` for singleton settings objects.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Create an object.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error when the device rejects the call.
    async fn create(
        &self,
        path: &str,
        object: &AttributeMap,
        vdom: Option<&str>,
    ) -> Result<ApiResponse>;

    /// Read an object; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error for anything other than not-found.
    async fn read(
        &self,
        path: &str,
        mkey: Option<&str>,
        vdom: Option<&str>,
    ) -> Result<Option<AttributeMap>>;

    /// Update an object in place.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error when the device rejects the call.
    async fn update(
        &self,
        path: &str,
        object: &AttributeMap,
        mkey: Option<&str>,
        vdom: Option<&str>,
    ) -> Result<ApiResponse>;

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns a transport or API error when the device rejects the call.
    async fn delete(&self, path: &str, mkey: Option<&str>, vdom: Option<&str>) -> Result<()>;

    /// Probe the device firmware version.
    ///
    /// # Errors
    ///
    /// Returns an error if the status endpoint fails or reports no version.
    async fn device_version(&self) -> Result<DeviceVersion>;
}
