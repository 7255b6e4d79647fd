//! Provider Stream - streaming client core for an event/message store
//!
//! Turns Server-Sent Events responses into decoded JSON records and exposes
//! them as lazy, restartable collections.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod json;
pub mod prelude;
pub mod splitter;
pub mod sse;
pub mod stream;
pub mod stub;
pub mod traits;
