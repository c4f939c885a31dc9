//! Error types for the mdapi client.
//!
//! Uses `thiserror` for structured error definitions. Each layer of the
//! client has its own error enum; [`RequestError`] is what every API call
//! ultimately returns.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Error raised while flattening query parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A value nested deeper than one level (or a list inside a list).
    #[error("Unsupported query shape for '{key}': only one level of nesting is allowed")]
    UnsupportedShape { key: String },
}

/// Error raised while turning raw JSON into a typed resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The `type` discriminator is missing or not in the type table.
    #[error("Unknown resource type: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownResourceType(Option<String>),

    /// The resource decoded fine but is not the kind the caller asked for.
    #[error("Expected a '{expected}' resource, got '{found}'")]
    UnexpectedResourceType {
        expected: &'static str,
        found: &'static str,
    },

    /// A required attribute is missing or has the wrong shape.
    #[error("Invalid '{kind}' resource: {message}")]
    SchemaViolation { kind: &'static str, message: String },

    /// Two entries in the type table share a discriminator.
    #[error("Resource type '{0}' is registered more than once")]
    DuplicateResourceType(&'static str),

    /// A resource kind has no entry in the type table.
    #[error("Resource type '{0}' has no decoder registered")]
    MissingResourceType(&'static str),
}

/// Error raised by a credential store.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Failed to read or write the credential file
    #[error("Credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored credentials are not valid JSON of the expected shape
    #[error("Invalid credential record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error raised by the HTTP transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error returned by every request made through the client.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The service answered 401.
    #[error("Not logged in: {0}")]
    NotLoggedIn(JsonValue),

    /// The service answered 403.
    #[error("Action forbidden: {0}")]
    ActionForbidden(JsonValue),

    /// Any other non-2xx answer, with the service-reported errors.
    #[error("Request failed: {}", format_service_errors(.0))]
    RequestFailed(Vec<JsonValue>),

    /// The session could not be refreshed; the user must log in again.
    #[error("Refreshing the session token failed: {reason}")]
    RefreshTokenFailed { reason: String },

    /// A path placeholder had no value.
    #[error("Missing URL parameter: {0}")]
    MissingUrlParam(String),

    /// A public operation was called with an out-of-range argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A successful response body was not valid JSON.
    #[error("Response body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// A successful response did not have the shape the operation expects.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl RequestError {
    /// Returns true when the caller has to log in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            RequestError::NotLoggedIn(_) | RequestError::RefreshTokenFailed { .. }
        )
    }
}

/// Error raised while constructing a client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn format_service_errors(errors: &[JsonValue]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }

    errors
        .iter()
        .map(|error| {
            error
                .get("detail")
                .or_else(|| error.get("title"))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}
