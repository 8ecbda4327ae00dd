//! JSON-RPC envelopes exchanged with FortiManager.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// URL of the login call.
pub const LOGIN_URL: &str = "/sys/login/user";
/// URL of the logout call.
pub const LOGOUT_URL: &str = "/sys/logout";

/// JSON-RPC method names understood by FortiManager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcMethod {
    /// Read objects
    Get,
    /// Create or replace objects
    Set,
    /// Create objects
    Add,
    /// Modify objects
    Update,
    /// Delete objects
    Delete,
    /// Run a command
    Exec,
}

impl RpcMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Exec => "exec",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single `params` element of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Target URL inside FortiManager's object tree
    pub url: String,
    /// Payload for the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RequestParams {
    /// Params for `url` with an optional payload.
    #[must_use]
    pub fn new(url: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            url: url.into(),
            data,
        }
    }
}

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Per-client request id, echoed by the server
    pub id: u64,
    /// Method name
    pub method: RpcMethod,
    /// Session token; empty for login
    pub session: String,
    /// Exactly one params element
    pub params: [RequestParams; 1],
}

/// Status block of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    /// `0` on success
    pub code: i64,
    /// `OK` on success
    pub message: String,
}

impl RpcStatus {
    /// Whether the status reports success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == 0 && self.message == "OK"
    }
}

/// One element of a response's `result` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResult {
    /// Call status
    pub status: RpcStatus,
    /// URL the result belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Returned data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Echo of the request id
    #[serde(default)]
    pub id: Option<u64>,
    /// Results, one per params element
    #[serde(default)]
    pub result: Option<Vec<RpcResult>>,
    /// Session token issued by login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

/// An authenticated FortiManager session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    /// Wrap a session token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_single_params_element() {
        let request = RpcRequest {
            id: 1,
            method: RpcMethod::Exec,
            session: String::new(),
            params: [RequestParams::new(
                LOGIN_URL,
                Some(json!({"user": "admin", "passwd": "pw"})),
            )],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "id": 1,
                "method": "exec",
                "session": "",
                "params": [{"url": "/sys/login/user", "data": {"user": "admin", "passwd": "pw"}}]
            })
        );
    }

    #[test]
    fn response_parses_status() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": 3,
            "result": [{"status": {"code": -11, "message": "No permission"}, "url": "/dvmdb/adom"}]
        }))
        .unwrap();

        let result = &response.result.unwrap()[0];
        assert!(!result.status.is_ok());
        assert_eq!(result.status.code, -11);
        assert_eq!(response.id, Some(3));
    }

    #[test]
    fn session_debug_is_redacted() {
        assert_eq!(format!("{:?}", Session::new("abc")), "Session(..)");
    }
}
