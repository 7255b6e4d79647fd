//! Server-Sent Events framing.
//!
//! Turns raw response bytes into [`Frame`]s:
//! - [`LineDecoder`] splits bytes into text lines across chunk boundaries,
//!   applying the configured [`CharEncoding`] and [`DecodePolicy`]
//! - [`SseParser`] accumulates `event:`/`data:`/`id:`/`retry:` fields and
//!   emits a frame on each blank line
//! - [`FrameParser`] composes the two over byte chunks
//!
//! Comment lines (starting with `:`) are ignored and repeated `data:` lines
//! are joined with `\n`.

mod frame;
mod parser;
mod text;

pub use frame::{Frame, SseLine, DEFAULT_EVENT_TYPE};
pub use parser::{parse_sse_line, FrameParser, SseParser};
pub use text::{CharEncoding, DecodePolicy, LineDecoder};
