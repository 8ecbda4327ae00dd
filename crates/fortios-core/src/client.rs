//! HTTP client utilities and retry logic.
//!
//! This module provides HTTP client configuration, a fixed-count retry policy
//! and the [`ServiceClient`] shared by the FortiGate REST and FortiManager
//! JSON-RPC transports.

use crate::error::{Error, Result};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for FortiGate REST requests
pub const FORTIOS_DEFAULT_TIMEOUT: u64 = 30;

/// Default timeout for FortiManager JSON-RPC requests
pub const FORTIMANAGER_DEFAULT_TIMEOUT: u64 = 60;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Retry settings

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Upper bound for configured retries
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Fixed-count retry policy.
///
/// Device transports retry a small, fixed number of times. A constant delay may
/// be configured but no backoff is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,

    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy with default values (one retry, no delay).
    #[must_use]
    pub const fn new() -> Self {
        Self::fixed(DEFAULT_MAX_RETRIES)
    }

    /// Retry `retries` times without pausing.
    #[must_use]
    pub const fn fixed(retries: u32) -> Self {
        Self {
            max_retries: retries,
            delay: Duration::from_millis(0),
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::fixed(0)
    }

    /// Set the constant delay between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Verify TLS certificates
    pub tls_verify: bool,

    /// Optional PEM bundle of extra trusted roots
    pub ca_cert: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(FORTIOS_DEFAULT_TIMEOUT),
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            tls_verify: true,
            ca_cert: None,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries.
    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::no_retry();
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Trust an additional CA bundle.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.ca_cert = Some(path);
        self
    }

    fn http_client(&self, user_agent: &str, service: &str) -> Result<Client> {
        let mut builder = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(10));

        if !self.tls_verify {
            warn!(service, "TLS verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.ca_cert {
            debug!("loading {service} CA bundle from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read CA bundle {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid CA bundle: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build {service} HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceClient`].
#[derive(Debug, Clone)]
pub struct ServiceClientBuilder {
    service: &'static str,
    base_url: Url,
    http_config: ClientConfig,
    user_agent: String,
    token: Option<SecretString>,
}

impl ServiceClientBuilder {
    /// Create a builder for the named service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL cannot be parsed.
    pub fn new(service: &'static str, base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        // Url::join drops the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            service,
            base_url,
            http_config: ClientConfig::new().with_timeout(timeout),
            user_agent: format!("fortios-core/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        })
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the CA bundle cannot be loaded or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<ServiceClient> {
        let http = self.http_config.http_client(&self.user_agent, self.service)?;
        Ok(ServiceClient {
            service: self.service,
            http,
            base_url: self.base_url,
            retry_policy: self.http_config.retry_policy,
            token: self.token,
        })
    }
}

/// Thin wrapper around [`reqwest::Client`] that resolves paths against a base
/// URL, attaches credentials and retries transient failures.
#[derive(Clone)]
pub struct ServiceClient {
    service: &'static str,
    http: Client,
    base_url: Url,
    retry_policy: RetryPolicy,
    token: Option<SecretString>,
}

impl ServiceClient {
    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the service label used in logs.
    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    /// Return the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Resolve a relative path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] when the path cannot be joined.
    pub fn build_url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path.trim_start_matches('/')).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid {} path `{path}`: {err}", self.service))
        })
    }

    /// Send a request, retrying retryable failures up to the policy limit.
    ///
    /// `configure` is applied to every attempt's request builder. Non-success
    /// statuses are turned into errors by `map_status`; only errors for which
    /// [`Error::is_retryable`] holds are retried.
    ///
    /// # Errors
    ///
    /// Returns the mapped status error, or the last transport error once all
    /// attempts are exhausted.
    pub async fn execute_with_retry<F, M>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        configure: F,
        map_status: M,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
        M: Fn(StatusCode, String) -> Error,
    {
        let url = self.build_url(path)?;
        self.execute_url_with_retry(method, url, params, configure, map_status)
            .await
    }

    /// Same as [`ServiceClient::execute_with_retry`] for an already resolved URL.
    ///
    /// # Errors
    ///
    /// See [`ServiceClient::execute_with_retry`].
    pub async fn execute_url_with_retry<F, M>(
        &self,
        method: Method,
        url: Url,
        params: &[(&'static str, String)],
        configure: F,
        map_status: M,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
        M: Fn(StatusCode, String) -> Error,
    {
        let path = url.path().to_string();
        let mut attempt = 0;

        loop {
            let mut request = self.http.request(method.clone(), url.clone()).query(params);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token.expose_secret());
            }
            request = configure(request);

            debug!(service = self.service, %method, path = %path, attempt, "sending request");

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    map_status(status, text)
                }
                Err(err) => Error::from(err),
            };

            attempt += 1;
            if !error.is_retryable() || attempt >= self.retry_policy.attempts() {
                return Err(error);
            }

            warn!(service = self.service, path = %path, attempt, %error, "retrying request");
            if !self.retry_policy.delay.is_zero() {
                sleep(self.retry_policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn status_error(status: StatusCode, text: String) -> Error {
        if status.is_server_error() {
            Error::ServiceUnavailable(text)
        } else {
            Error::BadRequest(text)
        }
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.attempts(), 2);
        assert!(policy.delay.is_zero());
        assert!(policy.has_retries());
    }

    #[test]
    fn test_retry_policy_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.has_retries());
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::fixed(3).with_delay(Duration::from_millis(50));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_millis(50));
        assert_eq!(RetryPolicy::default(), RetryPolicy::new());
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .without_retries()
            .with_tls_verify(false);

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_policy.max_retries, 0);
        assert!(!config.tls_verify);
        assert_eq!(config.pool_max_idle_per_host, DEFAULT_POOL_MAX_IDLE_PER_HOST);
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let client = ServiceClientBuilder::new("fortios", "https://fgt.example.com/prefix", Duration::from_secs(1))
            .unwrap()
            .build()
            .unwrap();
        let url = client.build_url("/api/v2/cmdb/firewall/vipgrp64").unwrap();
        assert_eq!(
            url.as_str(),
            "https://fgt.example.com/prefix/api/v2/cmdb/firewall/vipgrp64"
        );
    }

    #[test]
    fn test_missing_ca_bundle_is_config_error() {
        let err = ServiceClientBuilder::new("fortios", "https://fgt", Duration::from_secs(1))
            .unwrap()
            .with_http_config(ClientConfig::new().with_ca_cert(PathBuf::from("/nonexistent/ca.pem")))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[tokio::test]
    async fn execute_sends_bearer_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64"))
            .and(query_param("vdom", "root"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new("fortios", server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_bearer_token(SecretString::from("secret-token"))
            .build()
            .unwrap();

        client
            .execute_with_retry(
                Method::GET,
                "api/v2/cmdb/firewall/vipgrp64",
                &[("vdom", "root".to_string())],
                |request| request,
                status_error,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn execute_retries_server_errors_a_fixed_number_of_times() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(3)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new("fortios", server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_retry_policy(RetryPolicy::fixed(2))
            .build()
            .unwrap();

        let err = client
            .execute_with_retry(Method::GET, "x", &[], |r| r, status_error)
            .await
            .unwrap_err();
        assert_eq!(err, Error::ServiceUnavailable("busy".to_string()));
    }

    #[tokio::test]
    async fn execute_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceClientBuilder::new("fortios", server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_retry_policy(RetryPolicy::fixed(3))
            .build()
            .unwrap();

        let err = client
            .execute_with_retry(Method::GET, "x", &[], |r| r, status_error)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
