//! Asynchronous FortiManager JSON-RPC client.
//!
//! Every logical call runs inside a login/logout pair. [`FmgClient::with_session`]
//! owns that scope so the session is released on every exit path.

use crate::models::{
    RequestParams, RpcMethod, RpcRequest, RpcResponse, RpcResult, Session, LOGIN_URL, LOGOUT_URL,
};
use crate::Result;
use fortios_core::client::{
    ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder, FORTIMANAGER_DEFAULT_TIMEOUT,
};
use fortios_core::config::FortiManagerConfig;
use fortios_core::Error;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("fortimanager-api/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "FortiManager";
const JSONRPC_PATH: &str = "jsonrpc";

/// Builder for [`FmgClient`].
#[derive(Debug, Clone)]
pub struct FmgClientBuilder {
    inner: ServiceClientBuilder,
    username: String,
    password: SecretString,
    trace_debug: bool,
}

impl FmgClientBuilder {
    /// Create a builder for the FortiManager at `base_url`.
    ///
    /// Requests are posted to `{base_url}/jsonrpc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(
        base_url: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let inner = ServiceClientBuilder::new(
            SERVICE,
            base_url,
            Duration::from_secs(FORTIMANAGER_DEFAULT_TIMEOUT),
        )?
        .with_user_agent(USER_AGENT)
        .with_retry_policy(RetryPolicy::no_retry());

        Ok(Self {
            inner,
            username: username.into(),
            password: SecretString::from(password.into()),
            trace_debug: false,
        })
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

    /// Log requests, responses and scope entry/exit at debug level.
    #[must_use]
    pub const fn with_trace_debug(mut self, enabled: bool) -> Self {
        self.trace_debug = enabled;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<FmgClient> {
        Ok(FmgClient {
            inner: self.inner.build()?,
            username: self.username,
            password: self.password,
            trace_debug: self.trace_debug,
            next_id: AtomicU64::new(1),
        })
    }
}

/// FortiManager JSON-RPC client.
pub struct FmgClient {
    inner: ServiceClient,
    username: String,
    password: SecretString,
    trace_debug: bool,
    next_id: AtomicU64,
}

impl FmgClient {
    /// Construct a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn from_config(config: &FortiManagerConfig) -> Result<Self> {
        let base = config.jsonrpc_url()?.join(".")?;
        let http = ClientConfig::new()
            .with_timeout(config.timeout())
            .without_retries();

        let builder = FmgClientBuilder::new(base, config.username.clone(), "")?
            .with_http_config(http)
            .with_trace_debug(config.trace_debug);
        FmgClientBuilder {
            password: config.password.clone(),
            ..builder
        }
        .build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Whether request tracing is on.
    #[must_use]
    pub const fn trace_debug(&self) -> bool {
        self.trace_debug
    }

    /// Log entry into `scope`; the returned guard logs the exit.
    #[must_use]
    pub fn trace(&self, scope: &'static str) -> TraceGuard {
        TraceGuard::enter(scope, self.trace_debug)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send one request envelope and check the response contract.
    ///
    /// The echoed id must match, `result` must be a non-empty array and its
    /// first status must be code `0` with message `OK`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a malformed or mismatched envelope and
    /// [`Error::RpcStatus`] for a failure status.
    pub async fn call(
        &self,
        method: RpcMethod,
        url: &str,
        data: Option<Value>,
        session: Option<&Session>,
    ) -> Result<RpcResponse> {
        let request = RpcRequest {
            id: self.next_id(),
            method,
            session: session.map(|s| s.as_str().to_string()).unwrap_or_default(),
            params: [RequestParams::new(url, data)],
        };

        if self.trace_debug {
            // login data carries the password
            let data = request.params[0].data.as_ref().filter(|_| url != LOGIN_URL);
            debug!(id = request.id, %method, url, ?data, "[TRACEDEBUG] ==> request");
        }

        let response = self
            .inner
            .execute_with_retry(
                Method::POST,
                JSONRPC_PATH,
                &[],
                |builder| builder.json(&request),
                map_status_to_error,
            )
            .await?;
        let body = response.text().await.map_err(Error::from)?;

        if self.trace_debug {
            debug!(id = request.id, body = %body, "[TRACEDEBUG] ==> result");
        }

        let envelope: RpcResponse = serde_json::from_str(&body)?;
        check_envelope(request.id, &envelope)?;
        Ok(envelope)
    }

    /// Log in and return the issued session.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or no session is issued.
    pub async fn login(&self) -> Result<Session> {
        let data = json!({
            "user": self.username,
            "passwd": self.password.expose_secret(),
        });
        let response = self
            .call(RpcMethod::Exec, LOGIN_URL, Some(data), None)
            .await
            .map_err(|err| login_error(&err))?;

        response
            .session
            .filter(|session| !session.is_empty())
            .map(Session::new)
            .ok_or_else(|| Error::Protocol("login response carries no session".to_string()))
    }

    /// End a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn logout(&self, session: &Session) -> Result<()> {
        self.call(RpcMethod::Exec, LOGOUT_URL, None, Some(session))
            .await
            .map(|_| ())
    }

    /// Run `op` inside a fresh session.
    ///
    /// The session is logged out whether `op` succeeds or fails. A logout
    /// failure is logged and never replaces `op`'s result.
    ///
    /// # Errors
    ///
    /// Returns the login error, or whatever `op` returns.
    pub async fn with_session<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _trace = self.trace("with_session");
        let session = self.login().await?;
        let result = op(session.clone()).await;

        if let Err(err) = self.logout(&session).await {
            warn!(error = %err, "FortiManager logout failed");
        }
        result
    }

    /// Run one logical call in its own session and return the first result.
    ///
    /// # Errors
    ///
    /// Returns login, transport, protocol or status errors.
    pub async fn execute(&self, method: RpcMethod, url: &str, data: Option<Value>) -> Result<RpcResult> {
        self.with_session(|session| async move {
            let response = self.call(method, url, data, Some(&session)).await?;
            first_result(response)
        })
        .await
    }

    /// `get` the object at `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn get(&self, url: &str) -> Result<Option<Value>> {
        self.execute(RpcMethod::Get, url, None)
            .await
            .map(|result| result.data)
    }

    /// `set` the object at `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn set(&self, url: &str, data: Value) -> Result<RpcResult> {
        self.execute(RpcMethod::Set, url, Some(data)).await
    }

    /// `add` an object under `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn add(&self, url: &str, data: Value) -> Result<RpcResult> {
        self.execute(RpcMethod::Add, url, Some(data)).await
    }

    /// `update` the object at `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn update(&self, url: &str, data: Value) -> Result<RpcResult> {
        self.execute(RpcMethod::Update, url, Some(data)).await
    }

    /// `delete` the object at `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn delete(&self, url: &str) -> Result<RpcResult> {
        self.execute(RpcMethod::Delete, url, None).await
    }

    /// `exec` the command at `url`.
    ///
    /// # Errors
    ///
    /// See [`FmgClient::execute`].
    pub async fn exec(&self, url: &str, data: Option<Value>) -> Result<RpcResult> {
        self.execute(RpcMethod::Exec, url, data).await
    }
}

fn check_envelope(sent: u64, envelope: &RpcResponse) -> Result<()> {
    match envelope.id {
        Some(id) if id == sent => {}
        Some(id) => {
            return Err(Error::Protocol(format!(
                "id not match, should be {sent}, but is {id}"
            )));
        }
        None => return Err(Error::Protocol("response carries no id".to_string())),
    }

    let status = envelope
        .result
        .as_deref()
        .and_then(<[RpcResult]>::first)
        .map(|result| &result.status)
        .ok_or_else(|| Error::Protocol("can't get response status".to_string()))?;

    if !status.is_ok() {
        return Err(Error::RpcStatus {
            code: status.code,
            message: status.message.clone(),
        });
    }
    Ok(())
}

fn first_result(response: RpcResponse) -> Result<RpcResult> {
    response
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::Protocol("can't get response status".to_string()))
}

fn login_error(err: &Error) -> Error {
    match err {
        Error::RpcStatus { .. } => {
            Error::AuthenticationFailed(format!("FortiManager login failed: {err}"))
        }
        other => other.clone(),
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::InvalidEndpoint(format!("no JSON-RPC endpoint: {text}")),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::AuthenticationFailed(format!("FortiManager authentication failed: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("FortiManager server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("FortiManager error {status}: {text}")),
    }
}

/// Logs entry into a scope on creation and exit on drop when tracing is on.
#[derive(Debug)]
pub struct TraceGuard {
    scope: &'static str,
    enabled: bool,
}

impl TraceGuard {
    fn enter(scope: &'static str, enabled: bool) -> Self {
        if enabled {
            debug!("[TRACEDEBUG] -> Enter {scope} <-");
        }
        Self { scope, enabled }
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if self.enabled {
            debug!("[TRACEDEBUG]    -> Leave {} <-", self.scope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn test_client(server: &MockServer) -> FmgClient {
        FmgClientBuilder::new(server.uri(), "admin", "secret")
            .unwrap()
            .build()
            .unwrap()
    }

    fn request_of(request: &Request) -> RpcRequest {
        serde_json::from_slice(&request.body).unwrap()
    }

    fn ok_body(id: u64) -> Value {
        json!({
            "id": id,
            "result": [{"status": {"code": 0, "message": "OK"}, "url": "/sys/status"}],
            "session": "sess-1"
        })
    }

    /// Responds like FortiManager, optionally failing calls to `fail_url`.
    fn fake_fmg(
        fail_url: Option<&'static str>,
    ) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
        move |request: &Request| {
            let rpc = request_of(request);
            let url = rpc.params[0].url.as_str();
            if Some(url) == fail_url {
                return ResponseTemplate::new(200).set_body_json(json!({
                    "id": rpc.id,
                    "result": [{"status": {"code": -6, "message": "Invalid url"}, "url": url}]
                }));
            }
            let mut body = ok_body(rpc.id);
            if url == "/dvmdb/adom/root" {
                body["result"][0]["data"] = json!({"name": "root"});
            }
            ResponseTemplate::new(200).set_body_json(body)
        }
    }

    async fn called_urls(server: &MockServer) -> Vec<(String, String)> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(request_of)
            .map(|rpc| (rpc.params[0].url.clone(), rpc.session))
            .collect()
    }

    #[tokio::test]
    async fn call_accepts_matching_id_with_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(1)))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client
            .call(RpcMethod::Get, "/sys/status", None, None)
            .await
            .unwrap();
        assert_eq!(response.id, Some(1));
    }

    #[tokio::test]
    async fn call_rejects_mismatched_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(2)))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .call(RpcMethod::Get, "/sys/status", None, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Protocol("id not match, should be 1, but is 2".to_string())
        );
    }

    #[tokio::test]
    async fn call_rejects_missing_or_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(|request: &Request| {
                let rpc = request_of(request);
                let body = if rpc.id == 1 {
                    json!({"id": 1, "result": []})
                } else {
                    json!({"id": rpc.id})
                };
                ResponseTemplate::new(200).set_body_json(body)
            })
            .mount(&server)
            .await;

        let client = test_client(&server);
        for _ in 0..2 {
            let err = client
                .call(RpcMethod::Get, "/sys/status", None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Protocol(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn call_reports_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(Some("/pm/config/adom/root/obj/firewall/address")))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .call(
                RpcMethod::Get,
                "/pm/config/adom/root/obj/firewall/address",
                None,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "status not right: code is -6, message is Invalid url");
    }

    #[tokio::test]
    async fn execute_logs_in_and_out_around_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(None))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let data = client.get("/dvmdb/adom/root").await.unwrap();
        assert_eq!(data, Some(json!({"name": "root"})));

        let calls = called_urls(&server).await;
        assert_eq!(
            calls,
            vec![
                ("/sys/login/user".to_string(), String::new()),
                ("/dvmdb/adom/root".to_string(), "sess-1".to_string()),
                ("/sys/logout".to_string(), "sess-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn session_is_released_when_the_call_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(Some("/dvmdb/adom/missing")))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.delete("/dvmdb/adom/missing").await.unwrap_err();
        assert!(matches!(err, Error::RpcStatus { code: -6, .. }));

        let calls = called_urls(&server).await;
        assert_eq!(calls.last().map(|call| call.0.as_str()), Some("/sys/logout"));
    }

    #[tokio::test]
    async fn logout_failure_does_not_mask_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(Some("/sys/logout")))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.exec("/sys/status", None).await.unwrap();
        assert!(result.status.is_ok());
    }

    #[tokio::test]
    async fn login_failure_skips_operation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(Some("/sys/login/user")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("/dvmdb/adom/root").await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn request_ids_increase_per_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .respond_with(fake_fmg(None))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.exec("/sys/status", None).await.unwrap();

        let ids: Vec<u64> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request_of(request).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn from_config_targets_jsonrpc_root() {
        let config = FortiManagerConfig::new("10.0.0.5", "admin", "pw").unwrap();
        let client = FmgClient::from_config(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://10.0.0.5/");
        assert!(!client.trace_debug());
    }
}
