//! Unified error type for the provider stream client.

use thiserror::Error;

use super::category::ErrorCategory;
use super::lookup::LookupError;
use super::network::{classify_reqwest_error, NetworkError};
use super::stream::StreamError;

/// Unified error type.
///
/// Every public operation returns [`ProviderResult`](super::ProviderResult),
/// so callers can match on the layer that failed or just ask
/// [`is_retryable`](ProviderError::is_retryable).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP transport errors.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// SSE framing and JSON decoding errors.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Identifier validation and lookup errors.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ProviderError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::Network(NetworkError::HttpStatus { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            ProviderError::Network(NetworkError::HttpStatus { status: 404, .. }) => {
                ErrorCategory::NotFound
            }
            ProviderError::Network(NetworkError::HttpStatus { .. })
            | ProviderError::Network(NetworkError::InvalidUrl(_)) => ErrorCategory::Client,
            ProviderError::Network(_) => ErrorCategory::Network,
            ProviderError::Stream(StreamError::Transport { .. }) => ErrorCategory::Server,
            ProviderError::Stream(_) => ErrorCategory::Client,
            ProviderError::Lookup(LookupError::NotFound { .. }) => ErrorCategory::NotFound,
            ProviderError::Lookup(LookupError::MalformedId { .. }) => ErrorCategory::Client,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(err) => err.is_retryable(),
            ProviderError::Stream(err) => err.is_retryable(),
            ProviderError::Lookup(_) => false,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Network(err) => err.error_code(),
            ProviderError::Stream(err) => err.error_code(),
            ProviderError::Lookup(err) => err.error_code(),
        }
    }

    /// Whether this error means "no such record", at either the lookup or
    /// the HTTP layer.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Stream(err.into())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        ProviderError::Network(classify_reqwest_error(&err, &url))
    }
}
