//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - HTTP GET, whole-body and streaming

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, Response};
