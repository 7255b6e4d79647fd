//! Client configuration.
//!
//! [`StreamConfig`] carries every knob of the streaming pipeline. Build it
//! with `Default` plus the `with_*` methods, or overlay environment variables
//! with [`StreamConfig::from_env`].
//!
//! # Example
//!
//! ```ignore
//! use provider_stream::config::StreamConfig;
//!
//! let config = StreamConfig::default()
//!     .with_cache(true)
//!     .with_max_url_length(4096)
//!     .with_interactive_mode(true);
//! ```

use std::str::FromStr;

use crate::sse::{CharEncoding, DecodePolicy};
use crate::traits::Headers;

/// Default bound on buffered, not yet closed JSON text (256 KiB).
pub const DEFAULT_BUFFER_LIMIT: usize = 256 * 1024;

/// Default bound on a single request URL.
pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

pub const ENV_BUFFER_LIMIT: &str = "PROVIDER_BUFFER_LIMIT";
pub const ENV_MAX_URL_LENGTH: &str = "PROVIDER_MAX_URL_LENGTH";
pub const ENV_CACHE: &str = "PROVIDER_CACHE";
pub const ENV_USE_STUB: &str = "PROVIDER_USE_STUB";
pub const ENV_INTERACTIVE: &str = "PROVIDER_INTERACTIVE";
pub const ENV_DECODE_ERRORS: &str = "PROVIDER_DECODE_ERRORS";

/// Configuration for streaming requests and lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Maximum bytes of an unfinished JSON value the decoder may hold.
    pub buffer_limit: usize,
    /// Character encoding of the SSE byte stream.
    pub char_encoding: CharEncoding,
    /// What to do with bytes that are invalid in `char_encoding`.
    pub decode_errors: DecodePolicy,
    /// Materialize stream results once instead of re-requesting per pass.
    pub cache: bool,
    /// Substitute stub records for identifiers the store cannot resolve.
    pub use_stub: bool,
    /// Upper bound for a single request URL when splitting identifier lists.
    pub max_url_length: usize,
    /// Record `error` frames and keep reading instead of failing the stream.
    pub interactive_mode: bool,
    /// Extra headers sent with every request.
    pub headers: Headers,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            char_encoding: CharEncoding::Utf8,
            decode_errors: DecodePolicy::Replace,
            cache: false,
            use_stub: false,
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            interactive_mode: false,
            headers: Headers::new(),
        }
    }
}

impl StreamConfig {
    /// Create a new StreamConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with any `PROVIDER_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(limit) = env_value::<usize>(ENV_BUFFER_LIMIT) {
            config.buffer_limit = limit;
        }
        if let Some(length) = env_value::<usize>(ENV_MAX_URL_LENGTH) {
            config.max_url_length = length;
        }
        if let Some(cache) = env_flag(ENV_CACHE) {
            config.cache = cache;
        }
        if let Some(use_stub) = env_flag(ENV_USE_STUB) {
            config.use_stub = use_stub;
        }
        if let Some(interactive) = env_flag(ENV_INTERACTIVE) {
            config.interactive_mode = interactive;
        }
        if let Some(policy) = env_value::<DecodePolicy>(ENV_DECODE_ERRORS) {
            config.decode_errors = policy;
        }
        config
    }

    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit;
        self
    }

    pub fn with_char_encoding(mut self, encoding: CharEncoding) -> Self {
        self.char_encoding = encoding;
        self
    }

    pub fn with_decode_errors(mut self, policy: DecodePolicy) -> Self {
        self.decode_errors = policy;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_use_stub(mut self, use_stub: bool) -> Self {
        self.use_stub = use_stub;
        self
    }

    pub fn with_max_url_length(mut self, length: usize) -> Self {
        self.max_url_length = length;
        self
    }

    pub fn with_interactive_mode(mut self, interactive: bool) -> Self {
        self.interactive_mode = interactive;
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value {:?} for {}", raw, key);
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring invalid flag {:?} for {}", raw, key);
            None
        }
    }
}
