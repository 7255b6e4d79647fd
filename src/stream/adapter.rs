//! Frame classification and record extraction.

use std::collections::VecDeque;

use serde_json::Value;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::json::BufferedJsonDecoder;
use crate::sse::Frame;

use super::error_log::ErrorLog;

/// Event types whose payload is never decoded.
pub const CONTROL_EVENTS: [&str; 3] = ["close", "keep_alive", "message_ids"];

/// Event type carrying a server-side error.
pub const ERROR_EVENT: &str = "error";

/// How the adapter treats a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Control,
    Error,
    Data,
}

impl FrameKind {
    pub fn of(frame: &Frame) -> Self {
        let event_type = frame.event_type.as_str();
        if event_type == ERROR_EVENT {
            FrameKind::Error
        } else if CONTROL_EVENTS.contains(&event_type) {
            FrameKind::Control
        } else {
            FrameKind::Data
        }
    }
}

/// Turns frames into decoded JSON records.
///
/// In the default mode an `error` frame fails with
/// [`StreamError::Transport`]. In interactive mode its payload is appended
/// to the adapter's [`ErrorLog`] and the stream keeps going. An adapter
/// belongs to exactly one stream.
#[derive(Debug)]
pub struct StreamAdapter {
    decoder: BufferedJsonDecoder,
    interactive: bool,
    errors: ErrorLog,
}

impl StreamAdapter {
    pub fn new(buffer_limit: usize, interactive: bool) -> Self {
        Self {
            decoder: BufferedJsonDecoder::new(buffer_limit),
            interactive,
            errors: ErrorLog::new(),
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.buffer_limit, config.interactive_mode)
    }

    /// Record interactive-mode errors into `log` instead of a private one.
    pub fn with_error_log(mut self, log: ErrorLog) -> Self {
        self.errors = log;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Errors captured so far in interactive mode.
    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Process one frame, returning the records it completes.
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Vec<Value>, StreamError> {
        match FrameKind::of(frame) {
            FrameKind::Control => {
                tracing::trace!("Skipping control frame: {}", frame.event_type);
                Ok(Vec::new())
            }
            FrameKind::Error => {
                let payload = serde_json::from_str(&frame.data)
                    .unwrap_or_else(|_| Value::String(frame.data.clone()));
                if self.interactive {
                    tracing::warn!("Stream reported an error, continuing: {}", payload);
                    self.errors.push(payload);
                    Ok(Vec::new())
                } else {
                    Err(StreamError::Transport { payload })
                }
            }
            FrameKind::Data => self.decoder.decode(&frame.data),
        }
    }

    /// Flush the decoder at end of stream.
    pub fn finish(&mut self) -> Result<Vec<Value>, StreamError> {
        self.decoder.finish()
    }

    /// Lazily decode a whole frame sequence, flushing at its end.
    pub fn handle<I>(&mut self, frames: I) -> Records<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Frame>,
    {
        Records {
            adapter: self,
            frames: frames.into_iter(),
            ready: VecDeque::new(),
            done: false,
        }
    }
}

/// Iterator returned by [`StreamAdapter::handle`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Records<'a, I> {
    adapter: &'a mut StreamAdapter,
    frames: I,
    ready: VecDeque<Value>,
    done: bool,
}

impl<I> Iterator for Records<'_, I>
where
    I: Iterator<Item = Frame>,
{
    type Item = Result<Value, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.ready.pop_front() {
                return Some(Ok(value));
            }
            if self.done {
                return None;
            }
            let step = match self.frames.next() {
                Some(frame) => self.adapter.handle_frame(&frame),
                None => {
                    self.done = true;
                    self.adapter.finish()
                }
            };
            match step {
                Ok(values) => self.ready.extend(values),
                Err(err) => {
                    self.done = true;
                    self.ready.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}
