//! Error handling for the provider stream client.
//!
//! Errors are grouped by the layer that raises them and unified under
//! [`ProviderError`]:
//!
//! | Type | Raised by | Retryable |
//! |------|-----------|-----------|
//! | [`NetworkError`] | HTTP transport (connect, timeout, status) | Mostly |
//! | [`StreamError`] | SSE framing, JSON decoding, error frames | Error frames only |
//! | [`LookupError`] | Identifier validation and single lookups | No |
//!
//! # Example
//!
//! ```ignore
//! use provider_stream::error::{ProviderError, ProviderResult};
//!
//! fn handle(result: ProviderResult<serde_json::Value>) {
//!     match result {
//!         Ok(record) => println!("{record}"),
//!         Err(ProviderError::Lookup(err)) => eprintln!("lookup failed: {err}"),
//!         Err(err) if err.is_retryable() => eprintln!("try again: {err}"),
//!         Err(err) => eprintln!("{} ({})", err, err.error_code()),
//!     }
//! }
//! ```

mod category;
mod lookup;
mod network;
mod provider_error;
mod result;
mod stream;

pub use category::ErrorCategory;
pub use lookup::LookupError;
pub use network::{classify_reqwest_error, NetworkError};
pub use provider_error::ProviderError;
pub use result::{ProviderResult, ResultExt};
pub use stream::StreamError;
