//! Wire models for the FortiGate REST API.

use fortios_core::AttributeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root of the configuration database endpoints.
pub const CMDB_ROOT: &str = "api/v2/cmdb";

/// Endpoint reporting firmware version and serial.
pub const SYSTEM_STATUS_PATH: &str = "api/v2/monitor/system/status";

/// Status string FortiOS reports for a rejected call.
pub const STATUS_ERROR: &str = "error";

/// Envelope returned by every FortiOS REST call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `success` or `error`
    #[serde(default)]
    pub status: String,
    /// HTTP status echoed in the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Primary key of the affected object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkey: Option<Value>,
    /// Query results (array for tables, object for settings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    /// Virtual domain the call ran in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdom: Option<String>,
    /// cmdb path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// cmdb name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Action performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Device serial number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Firmware version, e.g. `v7.2.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Firmware build number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<i64>,
    /// Numeric FortiOS error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<i64>,
    /// CLI error text accompanying a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_error: Option<String>,
}

impl ApiResponse {
    /// Whether the body reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR
    }

    /// Primary key as a string; numeric keys are formatted.
    #[must_use]
    pub fn mkey(&self) -> Option<String> {
        match self.mkey.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Human-readable description of a failure body.
    #[must_use]
    pub fn error_message(&self) -> String {
        let mut message = match self.error {
            Some(code) => format!("FortiOS error {code}"),
            None => "FortiOS reported an error".to_string(),
        };
        if let Some(cli) = self.cli_error.as_deref().filter(|cli| !cli.is_empty()) {
            message.push_str(": ");
            message.push_str(cli.trim());
        }
        message
    }

    /// First object in `results`, if any.
    ///
    /// Table endpoints return an array, settings endpoints a bare object.
    #[must_use]
    pub fn first_result(&self) -> Option<AttributeMap> {
        match self.results.as_ref()? {
            Value::Array(items) => items.iter().find_map(|item| item.as_object().cloned()),
            Value::Object(object) => Some(object.clone()),
            _ => None,
        }
    }
}

/// cmdb table or settings path for `path`, relative to the device root.
#[must_use]
pub fn cmdb_path(path: &str) -> String {
    format!("{CMDB_ROOT}/{}", path.trim_matches('/'))
}
