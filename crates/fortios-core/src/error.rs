//! Error types for FortiOS and FortiManager operations.
//!
//! A single error hierarchy is shared by the schema engine, the REST and
//! JSON-RPC transports, and the CRUD dispatcher, so failures keep their
//! category as they travel up to the caller.

use serde::Serialize;
use thiserror::Error;

/// Main error type for FortiOS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A single attribute could not be converted between typed state and wire format
    #[error("Error converting {field}: {message}")]
    FieldConversion {
        /// Attribute path, e.g. `exemption.0.rule.1.id`
        field: String,
        /// What went wrong
        message: String,
    },

    /// Typed state violates a schema constraint
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Resource type is not known to the registry
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint or path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Device is unreachable or temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Conflict error (object in use, duplicate key)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The device answered but reported an error in the response body
    #[error("API error (http status {http_status}): {message}")]
    Api {
        /// HTTP status reported inside the body
        http_status: u16,
        /// Error detail
        message: String,
    },

    /// Malformed or mismatching JSON-RPC envelope
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON-RPC status object did not report success
    #[error("status not right: code is {code}, message is {message}")]
    RpcStatus {
        /// Status code
        code: i64,
        /// Status message
        message: String,
    },

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A CRUD operation failed for a resource
    #[error("Error {operation} {resource} resource: {source}")]
    Operation {
        /// Verb, e.g. `creating`
        operation: String,
        /// Resource type name
        resource: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

/// Specialized result type for FortiOS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Attribute path for field-level failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Error {
    /// Build a field conversion error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldConversion {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the CRUD operation and resource it occurred in.
    #[must_use]
    pub fn during(self, operation: &str, resource: &str) -> Self {
        Self::Operation {
            operation: operation.to_string(),
            resource: resource.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FieldConversion { .. } => "FIELD_CONVERSION",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::UnknownResource(_) => "UNKNOWN_RESOURCE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::Api { .. } => "API_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::RpcStatus { .. } => "RPC_STATUS",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::Operation { source, .. } => source.error_code(),
        }
    }

    /// Returns the innermost error, looking through operation context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if a transport may retry the request that produced this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::ServiceUnavailable(_) | Self::HttpError(_)
        )
    }

    /// Converts the error into an [`ErrorResponse`].
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        let field = match self.root() {
            Self::FieldConversion { field, .. } => Some(field.clone()),
            _ => None,
        };
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            field,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
