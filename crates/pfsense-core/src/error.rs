//! Error types for pfSense operations.
//!
//! This module provides the error type shared by the API client and the
//! provider, including HTTP status code mapping and parsing of the error
//! envelope returned by the pfSense REST API.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Main error type for pfSense operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for pfSense: {0}")]
    Timeout(String),

    /// Appliance is unreachable or temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request rejected by the appliance
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Successful status but the payload lacks required data
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failed to parse a response body
    #[error("Failed to parse pfSense response: {0}")]
    ParseError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for pfSense operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnexpectedResponse(_) => "UNEXPECTED_RESPONSE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_) | Self::ConfigError(_) | Self::UnexpectedResponse(_)
        )
    }

    /// Map a non-success HTTP status and its raw body to an error.
    ///
    /// The message is taken from the pfSense error envelope when the body
    /// parses as one, otherwise the raw body is used.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let text = ApiErrorBody::parse(body)
            .map_or_else(|| body.trim().to_string(), |envelope| envelope.describe());

        match status {
            StatusCode::NOT_FOUND => Self::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::BadRequest(text),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Unauthorized(format!("pfSense authentication failed: {text}"))
            }
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => {
                Self::ServiceUnavailable(format!("pfSense temporarily unavailable: {text}"))
            }
            status if status.is_server_error() => {
                Self::ServiceUnavailable(format!("pfSense server error {status}: {text}"))
            }
            _ => Self::HttpError(format!("pfSense error {status}: {text}")),
        }
    }
}

/// Error envelope returned by the pfSense REST API v2.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// HTTP status code echoed in the body
    #[serde(default)]
    pub code: Option<u16>,
    /// Short status, e.g. `unauthorized`
    #[serde(default)]
    pub status: Option<String>,
    /// Machine readable response identifier
    #[serde(default)]
    pub response_id: Option<String>,
    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body, returning `None` when it is not an envelope.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        let envelope: Self = serde_json::from_str(body).ok()?;
        if envelope.message.is_none() && envelope.response_id.is_none() {
            return None;
        }
        Some(envelope)
    }

    /// Render the envelope as a single line.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.response_id, &self.message) {
            (Some(id), Some(message)) if !message.is_empty() => format!("{message} ({id})"),
            (Some(id), _) => id.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => String::new(),
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
