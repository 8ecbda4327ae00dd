//! Configuration structures for FortiOS and FortiManager clients.
//!
//! Configuration is validated with `validator` on construction and can be
//! loaded from the environment variables the provider has always honoured.

use crate::client::{
    ClientConfig, RetryPolicy, FORTIMANAGER_DEFAULT_TIMEOUT, FORTIOS_DEFAULT_TIMEOUT,
    MAX_RETRIES_LIMIT,
};
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Hostname of the FortiGate (optionally with `:port`).
pub const ENV_HOSTNAME: &str = "FORTIOS_ACCESS_HOSTNAME";
/// REST API bearer token.
pub const ENV_TOKEN: &str = "FORTIOS_ACCESS_TOKEN";
/// Skip TLS certificate verification when `true`.
pub const ENV_INSECURE: &str = "FORTIOS_INSECURE";
/// PEM bundle of extra trusted roots.
pub const ENV_CA_BUNDLE: &str = "FORTIOS_CA_CABUNDLE";
/// Default virtual domain.
pub const ENV_VDOM: &str = "FORTIOS_VDOM";
/// Reconcile every nested table on read when `true`.
pub const ENV_IMPORT_TABLE: &str = "FORTIOS_IMPORT_TABLE";
/// FortiManager address.
pub const ENV_FMG_HOSTNAME: &str = "FORTIOS_FMG_HOSTNAME";
/// FortiManager user.
pub const ENV_FMG_USERNAME: &str = "FORTIOS_FMG_USERNAME";
/// FortiManager password.
pub const ENV_FMG_PASSWORD: &str = "FORTIOS_FMG_PASSWORD";
/// Verbose JSON-RPC tracing (`ON` / `on`).
pub const ENV_TRACEDEBUG: &str = "TRACEDEBUG";

/// Configuration for a FortiGate REST client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FortiosConfig {
    /// Device hostname or `host:port`
    #[validate(length(min = 1, max = 255))]
    pub hostname: String,

    /// API token
    #[serde(skip)]
    pub token: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a CA bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<PathBuf>,

    /// Default virtual domain for calls that do not set one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vdom: Option<String>,

    /// Reconcile every nested table on read
    #[serde(default)]
    pub import_all_tables: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries after the first attempt
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    FORTIOS_DEFAULT_TIMEOUT
}

const fn default_fmg_timeout_secs() -> u64 {
    FORTIMANAGER_DEFAULT_TIMEOUT
}

const fn default_max_retries() -> u32 {
    crate::client::DEFAULT_MAX_RETRIES
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|value| value.eq_ignore_ascii_case("true"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

impl FortiosConfig {
    /// Create a configuration for the given device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if validation fails.
    pub fn new(hostname: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            hostname: hostname.into(),
            token: None,
            tls_verify: default_tls_verify(),
            ca_bundle: None,
            vdom: None,
            import_all_tables: false,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Load the configuration from `FORTIOS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if `FORTIOS_ACCESS_HOSTNAME` is missing or
    /// the result fails validation.
    pub fn from_env() -> Result<Self, Error> {
        let hostname = env_string(ENV_HOSTNAME)
            .ok_or_else(|| Error::ConfigError(format!("{ENV_HOSTNAME} is not set")))?;

        let mut config = Self::new(hostname)?;
        if let Some(token) = env_string(ENV_TOKEN) {
            config = config.with_token(token);
        }
        if let Some(insecure) = env_flag(ENV_INSECURE) {
            config = config.with_tls_verify(!insecure);
        }
        if let Some(bundle) = env_string(ENV_CA_BUNDLE) {
            config = config.with_ca_bundle(PathBuf::from(bundle));
        }
        config.vdom = env_string(ENV_VDOM);
        config.import_all_tables = env_flag(ENV_IMPORT_TABLE).unwrap_or(false);
        Ok(config)
    }

    /// Set the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set the CA bundle path.
    #[must_use]
    pub fn with_ca_bundle(mut self, path: PathBuf) -> Self {
        self.ca_bundle = Some(path);
        self
    }

    /// Set the default vdom.
    #[must_use]
    pub fn with_vdom(mut self, vdom: impl Into<String>) -> Self {
        self.vdom = Some(vdom.into());
        self
    }

    /// Reconcile every nested table on read.
    #[must_use]
    pub const fn with_import_all_tables(mut self, import: bool) -> Self {
        self.import_all_tables = import;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set retries after the first attempt.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL of the device.
    ///
    /// A bare hostname is served over HTTPS; a value that already carries a
    /// scheme is used as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn base_url(&self) -> Result<Url, Error> {
        let raw = if self.hostname.contains("://") {
            self.hostname.clone()
        } else {
            format!("https://{}", self.hostname)
        };
        Url::parse(&raw).map_err(|e| Error::ConfigError(format!("Invalid hostname: {e}")))
    }

    /// HTTP settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new()
            .with_timeout(self.timeout())
            .with_retry_policy(RetryPolicy::fixed(self.max_retries.min(MAX_RETRIES_LIMIT)))
            .with_tls_verify(self.tls_verify);
        if let Some(bundle) = &self.ca_bundle {
            config = config.with_ca_cert(bundle.clone());
        }
        config
    }
}

/// Configuration for a FortiManager JSON-RPC client.
#[derive(Debug, Clone, Validate)]
pub struct FortiManagerConfig {
    /// FortiManager address, `host[:port]` or a full URL
    #[validate(length(min = 1, max = 255))]
    pub hostname: String,

    /// Login user
    #[validate(length(min = 1))]
    pub username: String,

    /// Login password
    pub password: SecretString,

    /// Log every request and response at debug level
    pub trace_debug: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

impl FortiManagerConfig {
    /// Create a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if validation fails.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            hostname: hostname.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            trace_debug: false,
            request_timeout_secs: default_fmg_timeout_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Load from `FORTIOS_FMG_*` and `TRACEDEBUG`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if a required variable is missing.
    pub fn from_env() -> Result<Self, Error> {
        let require = |name: &str| {
            env_string(name).ok_or_else(|| Error::ConfigError(format!("{name} is not set")))
        };
        let config = Self::new(
            require(ENV_FMG_HOSTNAME)?,
            require(ENV_FMG_USERNAME)?,
            std::env::var(ENV_FMG_PASSWORD).unwrap_or_default(),
        )?;
        Ok(config.with_trace_debug(trace_debug_enabled(
            std::env::var(ENV_TRACEDEBUG).ok().as_deref(),
        )))
    }

    /// Enable or disable request tracing.
    #[must_use]
    pub const fn with_trace_debug(mut self, enabled: bool) -> Self {
        self.trace_debug = enabled;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL of the JSON-RPC endpoint.
    ///
    /// A bare hostname is reached over plain HTTP, matching the appliance's
    /// default JSON-RPC listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn jsonrpc_url(&self) -> Result<Url, Error> {
        let base = if self.hostname.contains("://") {
            self.hostname.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.hostname)
        };
        Url::parse(&format!("{base}/jsonrpc"))
            .map_err(|e| Error::ConfigError(format!("Invalid FortiManager address: {e}")))
    }
}

/// Interpret the `TRACEDEBUG` value.
#[must_use]
pub fn trace_debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("ON" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_fortios_config_new() {
        let config = FortiosConfig::new("192.168.1.99").unwrap();
        assert_eq!(config.hostname, "192.168.1.99");
        assert!(config.tls_verify);
        assert_eq!(config.request_timeout_secs, FORTIOS_DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries, 1);
        assert!(!config.import_all_tables);
    }

    #[test]
    fn test_fortios_config_empty_hostname_rejected() {
        let err = FortiosConfig::new("").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_fortios_config_builder() {
        let config = FortiosConfig::new("fgt.example.com:8443")
            .unwrap()
            .with_token("abc")
            .with_tls_verify(false)
            .with_vdom("root")
            .with_import_all_tables(true)
            .with_timeout(5)
            .with_max_retries(2);

        assert_eq!(config.token.as_ref().unwrap().expose_secret(), "abc");
        assert!(!config.tls_verify);
        assert_eq!(config.vdom.as_deref(), Some("root"));
        assert!(config.import_all_tables);
        assert_eq!(config.timeout(), Duration::from_secs(5));

        let http = config.http_config();
        assert_eq!(http.retry_policy.max_retries, 2);
        assert!(!http.tls_verify);
    }

    #[test]
    fn test_fortios_base_url() {
        let config = FortiosConfig::new("fgt.example.com:8443").unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "https://fgt.example.com:8443/");

        let config = FortiosConfig::new("http://10.0.0.1").unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "http://10.0.0.1/");
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = FortiosConfig::new("fgt").unwrap().with_token("hidden");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hidden"));
        assert!(!format!("{config:?}").contains("hidden"));
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = FortiosConfig::new("fgt").unwrap();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.request_timeout_secs = 601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fmg_jsonrpc_url() {
        let config = FortiManagerConfig::new("10.0.0.5", "admin", "pw").unwrap();
        assert_eq!(config.jsonrpc_url().unwrap().as_str(), "http://10.0.0.5/jsonrpc");

        let config = FortiManagerConfig::new("https://fmg.example.com/", "admin", "pw").unwrap();
        assert_eq!(
            config.jsonrpc_url().unwrap().as_str(),
            "https://fmg.example.com/jsonrpc"
        );
    }

    #[test]
    fn test_fmg_requires_username() {
        assert!(FortiManagerConfig::new("fmg", "", "pw").is_err());
    }

    #[test]
    fn test_trace_debug_values() {
        assert!(trace_debug_enabled(Some("ON")));
        assert!(trace_debug_enabled(Some("on")));
        assert!(!trace_debug_enabled(Some("On")));
        assert!(!trace_debug_enabled(Some("off")));
        assert!(!trace_debug_enabled(None));
    }
}
