// src/error.rs

//! Error types for the gateway.
//!
//! Three layers of errors live here:
//! - [`AppError`] for configuration, I/O and other ambient failures
//! - [`TransportError`] for a single failed attempt against the upstream
//! - [`UpstreamError`] for the caller-visible outcome of a classified call

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parameter validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// A failed attempt that never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("I/O failure: {0}")]
    Io(String),

    /// The request could not be built or sent at all. Retrying will not help.
    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Request(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout(message)
        } else if err.is_connect() {
            TransportError::Connect(message)
        } else if err.is_builder() || err.is_redirect() {
            TransportError::Request(message)
        } else {
            TransportError::Io(message)
        }
    }
}

pub const MESSAGE_INVALID_PAYLOAD: &str = "Supplied payload is not valid";
pub const MESSAGE_BACKEND_FAILED: &str =
    "The request failed because of a problem with the upstream server";
pub const MESSAGE_UPSTREAM_TIMEOUT: &str = "The upstream server did not respond in time";
pub const MESSAGE_SERVER_ERROR: &str = "Internal server error. Contact application administrator.";

/// Caller-visible error for a call that did not end in success.
///
/// The `Display` output is safe to hand to an API client; upstream bodies and
/// status codes are kept in the fields for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("The requested resource '{uri}' was not found")]
    NotFound { uri: String },

    #[error("{}", MESSAGE_INVALID_PAYLOAD)]
    BadRequest { body: String },

    #[error("{}", MESSAGE_BACKEND_FAILED)]
    BadGateway { status: Option<u16> },

    #[error("{}", MESSAGE_UPSTREAM_TIMEOUT)]
    GatewayTimeout { status: Option<u16> },

    #[error("{}", MESSAGE_SERVER_ERROR)]
    Unknown { status: u16 },
}

impl UpstreamError {
    /// HTTP status a gateway should answer its own caller with.
    pub fn gateway_status(&self) -> u16 {
        match self {
            UpstreamError::NotFound { .. } => 404,
            UpstreamError::BadRequest { .. } => 400,
            UpstreamError::BadGateway { .. } => 502,
            UpstreamError::GatewayTimeout { .. } => 504,
            UpstreamError::Unknown { .. } => 500,
        }
    }
}
