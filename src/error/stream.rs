//! Streaming-related error types.
//!
//! These errors are raised while turning an SSE byte stream into decoded
//! JSON records.

use thiserror::Error;

/// Failures while framing, decoding or interpreting an event stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// The server sent an `error` frame. `payload` is the decoded frame data,
    /// or a JSON string when the data was not valid JSON.
    #[error("Server reported a stream error: {payload}")]
    Transport { payload: serde_json::Value },

    /// A single JSON value grew past the decoder's buffer limit before it
    /// closed.
    #[error("Decoder buffer overflow: {buffered} bytes buffered, limit is {limit}")]
    BufferOverflow { limit: usize, buffered: usize },

    /// A completed value failed to parse as JSON.
    #[error("Invalid JSON at byte {position}: {message}")]
    InvalidJson { position: usize, message: String },

    /// Bytes could not be decoded under the strict decode policy.
    #[error("Invalid {encoding} sequence at byte {offset} of line")]
    InvalidEncoding {
        encoding: &'static str,
        offset: usize,
    },

    /// The stream ended inside an unterminated JSON value.
    #[error("Stream ended with {pending} bytes of an unterminated JSON value")]
    Truncated { pending: usize },
}

impl StreamError {
    /// Only server-side error frames are worth retrying; everything else is
    /// deterministic for the same bytes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StreamError::Transport { .. })
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Transport { .. } => "E_STREAM_TRANSPORT",
            StreamError::BufferOverflow { .. } => "E_STREAM_OVERFLOW",
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
            StreamError::InvalidEncoding { .. } => "E_STREAM_ENCODING",
            StreamError::Truncated { .. } => "E_STREAM_TRUNCATED",
        }
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::InvalidJson {
            position: err.column(),
            message: err.to_string(),
        }
    }
}
