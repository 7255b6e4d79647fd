//! Endpoint queries and the client that runs them.
//!
//! Endpoints are described as data ([`StreamQuery`], [`LookupQuery`]) and
//! executed by one [`ProviderClient`]: URL building, splitting, stream
//! opening, decoding and wrapping in [`Data`](crate::data::Data) are shared.

mod client;
mod query;

pub use client::ProviderClient;
pub use query::{CompositeId, LookupQuery, StreamQuery, END_TIMESTAMP, START_TIMESTAMP};
