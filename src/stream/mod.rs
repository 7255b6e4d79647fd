//! From SSE frames to decoded records.
//!
//! - [`StreamAdapter`] drops control frames, handles `error` frames and
//!   feeds everything else into a [`BufferedJsonDecoder`](crate::json::BufferedJsonDecoder)
//! - [`pipeline`] wires a response byte stream through
//!   [`FrameParser`](crate::sse::FrameParser) and the adapter as async streams
//! - [`ErrorLog`] collects `error` payloads in interactive mode

mod adapter;
mod error_log;
pub mod pipeline;

pub use adapter::{FrameKind, Records, StreamAdapter, CONTROL_EVENTS, ERROR_EVENT};
pub use error_log::ErrorLog;
pub use pipeline::{decode_frames, frames, records};
