//! Error Handling Module
//!
//! Every failure in the library surfaces as an [`AiProxyError`]. Nothing is
//! recovered locally: callers always get a typed error instead of a partial or
//! default response.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while building, sending or decoding a provider request.
#[derive(Error, Debug)]
pub enum AiProxyError {
    /// The base URL and path did not form a valid URL.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// A payload did not match the expected shape.
    #[error("Decode failure: {message}")]
    DecodeFailure {
        /// Decoder diagnostic, including the location of the failure
        message: String,
        /// Raw body that failed to decode, when available
        raw: Option<String>,
    },

    /// The exchange exceeded the caller's deadline.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Network-level failure reported by the transport.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The provider or proxy rejected the credentials (401/403).
    #[error("Unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// Any other non-2xx response.
    #[error("Provider error ({status}): {body}")]
    ProviderError { status: u16, body: String },

    /// A request body or value could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid local configuration, such as an unencodable header.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AiProxyError>;

impl AiProxyError {
    /// Build a decode failure that keeps the raw body for diagnostics.
    pub fn decode_failure(message: impl Into<String>, raw: &[u8]) -> Self {
        Self::DecodeFailure {
            message: message.into(),
            raw: Some(String::from_utf8_lossy(raw).into_owned()),
        }
    }

    /// Classify a non-2xx HTTP status and its body.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Unauthorized { status, body },
            _ => Self::ProviderError { status, body },
        }
    }

    /// HTTP status code attached to this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::ProviderError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<serde_json::Error> for AiProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeFailure {
            message: err.to_string(),
            raw: None,
        }
    }
}

impl AiProxyError {
    /// Classify a `reqwest` failure for a request bounded by `timeout`.
    ///
    /// reqwest does not report which deadline fired, so the caller passes the
    /// one it configured.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::MalformedUrl(err.to_string())
        } else {
            Self::TransportFailure(err.to_string())
        }
    }
}
