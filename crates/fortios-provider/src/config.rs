//! Provider-level configuration.

use crate::dispatcher::Dispatcher;
use crate::session::ProviderSession;
use crate::Result;
use fortimanager_api::FmgClient;
use fortios_core::config::{FortiManagerConfig, FortiosConfig, ENV_FMG_HOSTNAME};
use std::sync::Arc;
use tracing::debug;

/// FortiGate access plus an optional FortiManager.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// FortiGate REST access
    pub fortios: FortiosConfig,
    /// FortiManager JSON-RPC access, when configured
    pub fortimanager: Option<FortiManagerConfig>,
}

impl ProviderConfig {
    /// Create a configuration without FortiManager access.
    #[must_use]
    pub const fn new(fortios: FortiosConfig) -> Self {
        Self {
            fortios,
            fortimanager: None,
        }
    }

    /// Add FortiManager access.
    #[must_use]
    pub fn with_fortimanager(mut self, config: FortiManagerConfig) -> Self {
        self.fortimanager = Some(config);
        self
    }

    /// Load from the environment.
    ///
    /// FortiManager settings are read only when `FORTIOS_FMG_HOSTNAME` is set.
    ///
    /// # Errors
    ///
    /// Returns [`fortios_core::Error::ConfigError`] if a required variable is
    /// missing or invalid.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(FortiosConfig::from_env()?);
        if std::env::var_os(ENV_FMG_HOSTNAME).is_some_and(|value| !value.is_empty()) {
            config = config.with_fortimanager(FortiManagerConfig::from_env()?);
        } else {
            debug!("no FortiManager configured");
        }
        Ok(config)
    }

    /// Open a provider session against the FortiGate.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST client cannot be built.
    pub fn session(&self) -> Result<ProviderSession> {
        ProviderSession::from_config(&self.fortios)
    }

    /// Dispatcher over the built-in resources for a fresh session.
    ///
    /// # Errors
    ///
    /// See [`ProviderConfig::session`].
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        Ok(Dispatcher::new(Arc::new(self.session()?)))
    }

    /// JSON-RPC client for the configured FortiManager, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the FortiManager address is invalid.
    pub fn fortimanager_client(&self) -> Result<Option<FmgClient>> {
        self.fortimanager
            .as_ref()
            .map(FmgClient::from_config)
            .transpose()
    }
}
