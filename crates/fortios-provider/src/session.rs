//! Per-session provider state shared by every dispatcher call.

use crate::Result;
use fortios_api::{FortiosClient, Transport};
use fortios_core::config::FortiosConfig;
use fortios_core::{DeviceVersion, Error};
use fortios_schema::RefreshOptions;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Transport plus per-session settings.
///
/// The device version is probed at most once per session, on first use.
pub struct ProviderSession {
    transport: Arc<dyn Transport>,
    default_vdom: Option<String>,
    import_all_tables: bool,
    version: OnceCell<DeviceVersion>,
}

impl ProviderSession {
    /// Create a session over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_vdom: None,
            import_all_tables: false,
            version: OnceCell::new(),
        }
    }

    /// Create a session talking to the device described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST client cannot be built.
    pub fn from_config(config: &FortiosConfig) -> Result<Self> {
        let client = FortiosClient::from_config(config)?;
        let mut session = Self::new(Arc::new(client))
            .with_import_all_tables(config.import_all_tables);
        session.default_vdom = config.vdom.clone().filter(|vdom| !vdom.is_empty());
        Ok(session)
    }

    /// Set the vdom used when a resource does not name one.
    #[must_use]
    pub fn with_default_vdom(mut self, vdom: impl Into<String>) -> Self {
        self.default_vdom = Some(vdom.into());
        self
    }

    /// Reconcile every nested table on read unless a resource says otherwise.
    #[must_use]
    pub const fn with_import_all_tables(mut self, import: bool) -> Self {
        self.import_all_tables = import;
        self
    }

    /// Seed the device version, skipping the probe.
    #[must_use]
    pub fn with_device_version(self, version: DeviceVersion) -> Self {
        Self {
            version: OnceCell::new_with(Some(version)),
            ..self
        }
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Session default vdom.
    #[must_use]
    pub fn default_vdom(&self) -> Option<&str> {
        self.default_vdom.as_deref()
    }

    /// Session-wide import flag.
    #[must_use]
    pub const fn import_all_tables(&self) -> bool {
        self.import_all_tables
    }

    /// Device version, probing the device on first call.
    ///
    /// Concurrent first callers share a single probe.
    ///
    /// # Errors
    ///
    /// Returns the probe error; a later call probes again.
    pub async fn device_version(&self) -> Result<DeviceVersion> {
        self.version
            .get_or_try_init(|| async {
                let version = self.transport.device_version().await?;
                info!(%version, "detected FortiOS version");
                Ok::<_, Error>(version)
            })
            .await
            .copied()
    }

    /// Refresh options for this session at `version`.
    #[must_use]
    pub fn refresh_options(&self, version: DeviceVersion) -> RefreshOptions {
        RefreshOptions::new()
            .with_version(version)
            .with_import_all_tables(self.import_all_tables)
    }
}
