//! Asynchronous FortiGate REST client implementation.

use crate::models::{cmdb_path, ApiResponse, SYSTEM_STATUS_PATH};
use crate::transport::Transport;
use crate::Result;
use async_trait::async_trait;
use fortios_core::client::{
    ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder, FORTIOS_DEFAULT_TIMEOUT,
};
use fortios_core::config::FortiosConfig;
use fortios_core::query::QueryParams;
use fortios_core::{AttributeMap, DeviceVersion, Error};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("fortios-api/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "FortiOS";

/// Builder for [`FortiosClient`].
#[derive(Debug, Clone)]
pub struct FortiosClientBuilder {
    inner: ServiceClientBuilder,
}

impl FortiosClientBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder = ServiceClientBuilder::new(
            SERVICE,
            base_url,
            Duration::from_secs(FORTIOS_DEFAULT_TIMEOUT),
        )?
        .with_user_agent(USER_AGENT);

        Ok(Self { inner: builder })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Authenticate with an API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self
            .inner
            .with_bearer_token(SecretString::from(token.into()));
        self
    }

    /// Authenticate with an already wrapped API token.
    #[must_use]
    pub fn with_secret_token(mut self, token: SecretString) -> Self {
        self.inner = self.inner.with_bearer_token(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<FortiosClient> {
        let inner = self.inner.build()?;
        Ok(FortiosClient { inner })
    }
}

/// Asynchronous FortiGate REST client.
#[derive(Clone)]
pub struct FortiosClient {
    inner: ServiceClient,
}

impl FortiosClient {
    /// Construct a client directly from the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        FortiosClientBuilder::new(base_url)?.build()
    }

    /// Construct a client from device configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the hostname or CA bundle is invalid.
    pub fn from_config(config: &FortiosConfig) -> Result<Self> {
        let mut builder =
            FortiosClientBuilder::new(config.base_url()?)?.with_http_config(config.http_config());
        if let Some(token) = &config.token {
            builder = builder.with_secret_token(token.clone());
        }
        builder.build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Fetch the `/api/v2/monitor/system/status` envelope.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the call fails.
    pub async fn system_status(&self) -> Result<ApiResponse> {
        let url = self.inner.build_url(SYSTEM_STATUS_PATH)?;
        self.send_json::<()>(Method::GET, url, None, &QueryParams::new())
            .await
    }

    /// URL of a cmdb table or settings object, or of one member when `mkey`
    /// is given. The member key is percent-encoded as a single segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for an empty member key, which would
    /// otherwise address the whole table.
    pub fn cmdb_url(&self, path: &str, mkey: Option<&str>) -> Result<Url> {
        let mut url = self.inner.build_url(&cmdb_path(path))?;
        if let Some(mkey) = mkey {
            if mkey.is_empty() {
                return Err(Error::InvalidEndpoint(format!(
                    "empty member key for {path}"
                )));
            }
            let table = url.to_string();
            url.path_segments_mut()
                .map_err(|()| Error::InvalidEndpoint(format!("{table} cannot address a member")))?
                .push(mkey);
        }
        Ok(url)
    }

    async fn send_json<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        params: &QueryParams,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .inner
            .execute_url_with_retry(
                method,
                url,
                params.as_pairs(),
                |mut request| {
                    request = request.header("Accept", "application/json");
                    if let Some(payload) = body {
                        request = request.json(payload);
                    }
                    request
                },
                map_status_to_error,
            )
            .await?;

        let status = response.status();
        let envelope = response.json::<ApiResponse>().await.map_err(Error::from)?;
        if envelope.is_error() {
            return Err(Error::Api {
                http_status: envelope.http_status.unwrap_or(status.as_u16()),
                message: envelope.error_message(),
            });
        }
        Ok(envelope)
    }
}

#[async_trait]
impl Transport for FortiosClient {
    async fn create(
        &self,
        path: &str,
        object: &AttributeMap,
        vdom: Option<&str>,
    ) -> Result<ApiResponse> {
        let endpoint = self.cmdb_url(path, None)?;
        debug!(path = endpoint.path(), vdom, "creating object");
        self.send_json(Method::POST, endpoint, Some(object), &QueryParams::vdom(vdom))
            .await
    }

    async fn read(
        &self,
        path: &str,
        mkey: Option<&str>,
        vdom: Option<&str>,
    ) -> Result<Option<AttributeMap>> {
        let endpoint = self.cmdb_url(path, mkey)?;
        let result = self
            .send_json::<()>(Method::GET, endpoint.clone(), None, &QueryParams::vdom(vdom))
            .await;

        match result {
            Ok(envelope) => Ok(envelope.first_result()),
            Err(Error::NotFound(_) | Error::Api { http_status: 404, .. }) => {
                debug!(path = endpoint.path(), vdom, "object not found");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        path: &str,
        object: &AttributeMap,
        mkey: Option<&str>,
        vdom: Option<&str>,
    ) -> Result<ApiResponse> {
        let endpoint = self.cmdb_url(path, mkey)?;
        debug!(path = endpoint.path(), vdom, "updating object");
        self.send_json(Method::PUT, endpoint, Some(object), &QueryParams::vdom(vdom))
            .await
    }

    async fn delete(&self, path: &str, mkey: Option<&str>, vdom: Option<&str>) -> Result<()> {
        let endpoint = self.cmdb_url(path, mkey)?;
        debug!(path = endpoint.path(), vdom, "deleting object");
        self.send_json::<()>(Method::DELETE, endpoint, None, &QueryParams::vdom(vdom))
            .await
            .map(|_| ())
    }

    async fn device_version(&self) -> Result<DeviceVersion> {
        let status = self.system_status().await?;
        let version = status
            .version
            .ok_or_else(|| Error::ParseError("system status carries no version".to_string()))?;
        version.parse()
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::AuthenticationFailed(format!("FortiOS authentication failed: {text}"))
        }
        StatusCode::CONFLICT | StatusCode::FAILED_DEPENDENCY => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("FortiOS temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("FortiOS server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("FortiOS error {status}: {text}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> FortiosClient {
        FortiosClientBuilder::new(server.uri())
            .unwrap()
            .with_token("api-token")
            .build()
            .unwrap()
    }

    fn object(value: serde_json::Value) -> AttributeMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_object_posts_to_cmdb_with_vdom() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64"))
            .and(query_param("vdom", "root"))
            .and(header("Authorization", "Bearer api-token"))
            .and(body_json(json!({"name": "grp1", "color": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "http_status": 200,
                "mkey": "grp1",
                "vdom": "root"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client
            .create(
                "firewall/vipgrp64",
                &object(json!({"name": "grp1", "color": 3})),
                Some("root"),
            )
            .await
            .unwrap();
        assert_eq!(response.mkey().as_deref(), Some("grp1"));
    }

    #[tokio::test]
    async fn read_object_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/grp1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "http_status": 200,
                "results": [{"name": "grp1", "color": 3}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let found = client
            .read("firewall/vipgrp64", Some("grp1"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["color"], 3);
    }

    #[test]
    fn cmdb_url_encodes_member_key_as_one_segment() {
        let client = FortiosClient::new("https://fgt.example.com").unwrap();
        let url = client.cmdb_url("firewall/vipgrp64", Some("grp 1/a")).unwrap();
        assert_eq!(url.path(), "/api/v2/cmdb/firewall/vipgrp64/grp%201%2Fa");

        let url = client
            .cmdb_url("log.fortianalyzer3/override-setting", None)
            .unwrap();
        assert_eq!(url.path(), "/api/v2/cmdb/log.fortianalyzer3/override-setting");
    }

    #[tokio::test]
    async fn empty_member_key_never_reaches_the_table() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .delete("firewall/vipgrp64", Some(""), None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ENDPOINT");
    }

    #[tokio::test]
    async fn read_object_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": "error",
                "http_status": 404
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "results": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client
            .read("firewall/vipgrp64", Some("missing"), None)
            .await
            .unwrap()
            .is_none());
        assert!(client
            .read("firewall/vipgrp64", Some("empty"), None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_settings_puts_without_mkey() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v2/cmdb/log.fortianalyzer3/override-setting"))
            .and(body_json(json!({"status": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "http_status": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client
            .update(
                "log.fortianalyzer3/override-setting",
                &object(json!({"status": null})),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.mkey(), None);
    }

    #[tokio::test]
    async fn error_status_in_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/grp1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "http_status": 200,
                "error": -651,
                "cli_error": "invalid value"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .update("firewall/vipgrp64", &AttributeMap::new(), Some("grp1"), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Api {
                http_status: 200,
                message: "FortiOS error -651: invalid value".to_string()
            }
        );
    }

    #[tokio::test]
    async fn delete_object_maps_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/grp1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .delete("firewall/vipgrp64", Some("grp1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn server_errors_are_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/cmdb/firewall/vipgrp64/grp1"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .delete("firewall/vipgrp64", Some("grp1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn device_version_reads_system_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/monitor/system/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "serial": "FGVM01TM00000000",
                "version": "v7.4.1",
                "build": 2463
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let version = client.device_version().await.unwrap();
        assert_eq!(version, DeviceVersion::new(7, 4, 1));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status_to_error(StatusCode::FAILED_DEPENDENCY, String::new()),
            Error::Conflict(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            Error::ServiceUnavailable(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::IM_A_TEAPOT, String::new()),
            Error::HttpError(_)
        ));
    }
}
