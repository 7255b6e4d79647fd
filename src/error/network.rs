//! Network-related error types.
//!
//! Raised by [`HttpClient`](crate::traits::HttpClient) implementations while
//! opening a request or reading its body.

use thiserror::Error;

/// Transport failures talking to the remote store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Connection to the server failed (refused, DNS, TLS handshake).
    #[error("Connection to {url} failed: {message}")]
    ConnectionFailed { url: String, message: String },

    /// Request timed out before a response or the next chunk arrived.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Server answered with a non-2xx status.
    #[error("Server error ({status}): {message}")]
    HttpStatus { status: u16, message: String },

    /// The request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Reading the response body failed mid-stream.
    #[error("I/O error while reading response: {message}")]
    Io { message: String },

    /// The request was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Anything the classifier could not place.
    #[error("HTTP error: {message}")]
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::Io { .. } => true,
            NetworkError::InvalidUrl(_) => false,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NetworkError::HttpStatus { status: 404, .. })
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_STATUS",
            NetworkError::InvalidUrl(_) => "E_NET_URL",
            NetworkError::Io { .. } => "E_NET_IO",
            NetworkError::Cancelled => "E_NET_CANCEL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

/// Classify a reqwest error into a [`NetworkError`].
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_builder() {
        NetworkError::InvalidUrl(url.to_string())
    } else if let Some(status) = err.status() {
        NetworkError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        NetworkError::Io {
            message: err.to_string(),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}
