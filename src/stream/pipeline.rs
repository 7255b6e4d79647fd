//! Async plumbing from a response body to decoded records.
//!
//! Each stage is a `stream::unfold` over its own state and stops after the
//! first error it yields. Dropping the outermost stream drops the byte
//! stream and with it the connection.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::Value;

use crate::config::StreamConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::sse::{Frame, FrameParser};
use crate::traits::ByteStream;

use super::adapter::StreamAdapter;
use super::error_log::ErrorLog;

struct FrameState {
    bytes: ByteStream,
    parser: FrameParser,
    ready: VecDeque<Frame>,
    done: bool,
}

/// Parse a byte stream into SSE frames.
///
/// An unterminated final frame is still emitted when the body ends.
pub fn frames(bytes: ByteStream, parser: FrameParser) -> BoxStream<'static, ProviderResult<Frame>> {
    let state = FrameState {
        bytes,
        parser,
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => match state.parser.feed(&chunk) {
                    Ok(parsed) => state.ready.extend(parsed),
                    Err(e) => {
                        state.done = true;
                        return Some((Err(ProviderError::from(e)), state));
                    }
                },
                Some(Err(e)) => {
                    tracing::debug!("Byte stream failed: {}", e);
                    state.done = true;
                    return Some((Err(ProviderError::from(e)), state));
                }
                None => {
                    state.done = true;
                    match state.parser.finish() {
                        Ok(Some(frame)) => state.ready.push_back(frame),
                        Ok(None) => {}
                        Err(e) => return Some((Err(ProviderError::from(e)), state)),
                    }
                }
            }
        }
    })
    .boxed()
}

struct RecordState {
    frames: BoxStream<'static, ProviderResult<Frame>>,
    adapter: StreamAdapter,
    ready: VecDeque<Value>,
    done: bool,
}

/// Decode the data frames of `frames` into JSON records.
pub fn decode_frames(
    frames: BoxStream<'static, ProviderResult<Frame>>,
    adapter: StreamAdapter,
) -> BoxStream<'static, ProviderResult<Value>> {
    let state = RecordState {
        frames,
        adapter,
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(value) = state.ready.pop_front() {
                return Some((Ok(value), state));
            }
            if state.done {
                return None;
            }

            let step = match state.frames.next().await {
                Some(Ok(frame)) => state.adapter.handle_frame(&frame).map_err(ProviderError::from),
                Some(Err(e)) => Err(e),
                None => {
                    state.done = true;
                    state.adapter.finish().map_err(ProviderError::from)
                }
            };

            match step {
                Ok(values) => state.ready.extend(values),
                Err(e) => {
                    tracing::debug!("Record stream stopped: {} ({})", e, e.error_code());
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}

/// Full pipeline for one response body, configured from `config`.
///
/// Interactive-mode errors land in `errors`.
pub fn records(
    bytes: ByteStream,
    config: &StreamConfig,
    errors: ErrorLog,
) -> BoxStream<'static, ProviderResult<Value>> {
    let parser = FrameParser::from_config(config);
    let adapter = StreamAdapter::from_config(config).with_error_log(errors);
    decode_frames(frames(bytes, parser), adapter)
}
