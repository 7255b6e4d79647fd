//! Incremental JSON value splitting.
//!
//! SSE payloads do not line up with JSON values: one `data:` field may hold
//! several values, and one value may span several frames.
//! [`BufferedJsonDecoder`] reassembles them.

mod decoder;

pub use decoder::BufferedJsonDecoder;
