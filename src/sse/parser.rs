//! SSE line and frame parsing.

use crate::config::StreamConfig;
use crate::error::StreamError;

use super::frame::{Frame, SseLine, DEFAULT_EVENT_TYPE};
use super::text::{CharEncoding, DecodePolicy, LineDecoder};

/// Parse a single SSE line into its component type.
///
/// Only one space after the field colon is stripped; payload whitespace is
/// otherwise preserved, since a JSON string may be split between two `data:`
/// fields.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(comment) = line.strip_prefix(':') {
        return SseLine::Comment(comment.trim().to_string());
    }

    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };

    match field {
        "event" => SseLine::Event(value.to_string()),
        "data" => SseLine::Data(value.to_string()),
        "id" => SseLine::Id(value.to_string()),
        "retry" => SseLine::Retry(value.to_string()),
        _ => SseLine::Unknown {
            field: field.to_string(),
            value: value.to_string(),
        },
    }
}

/// Stateful SSE parser that accumulates lines and emits complete frames.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
    /// Length of `data_buffer` once joined
    data_len: usize,
    current_id: Option<String>,
    current_retry: Option<u64>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line (without its terminator), returning a frame when the line
    /// completes one.
    pub fn feed_line(&mut self, line: &str) -> Option<Frame> {
        match parse_sse_line(line) {
            SseLine::Empty => self.take_frame(),
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                None
            }
            SseLine::Data(data) => {
                if !self.data_buffer.is_empty() {
                    self.data_len += 1;
                }
                self.data_len += data.len();
                self.data_buffer.push(data);
                None
            }
            SseLine::Id(id) => {
                // Ids containing NUL are ignored on the wire
                if !id.contains('\0') {
                    self.current_id = Some(id);
                }
                None
            }
            SseLine::Retry(retry) => {
                if let Ok(millis) = retry.trim().parse::<u64>() {
                    self.current_retry = Some(millis);
                }
                None
            }
            SseLine::Comment(_) => None,
            SseLine::Unknown { field, .. } => {
                tracing::trace!("Ignoring unknown SSE field: {}", field);
                None
            }
        }
    }

    /// Emit whatever is pending when the stream ends without a final blank
    /// line.
    pub fn finish(&mut self) -> Option<Frame> {
        self.take_frame()
    }

    /// Whether any field has been seen since the last emitted frame.
    pub fn has_pending(&self) -> bool {
        self.current_event_type.is_some()
            || !self.data_buffer.is_empty()
            || self.current_id.is_some()
            || self.current_retry.is_some()
    }

    /// Bytes of frame data accumulated so far.
    pub fn data_len(&self) -> usize {
        self.data_len
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
        self.data_len = 0;
        self.current_id = None;
        self.current_retry = None;
    }

    fn take_frame(&mut self) -> Option<Frame> {
        if !self.has_pending() {
            return None;
        }

        let frame = Frame {
            event_type: self
                .current_event_type
                .take()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data: self.data_buffer.join("\n"),
            id: self.current_id.take(),
            retry: self.current_retry.take(),
        };
        self.data_buffer.clear();
        self.data_len = 0;
        Some(frame)
    }
}

/// Byte-level SSE frame parser.
///
/// Feed raw response chunks in any size; frames come out as soon as their
/// terminating blank line arrives. Neither an unterminated line nor the
/// joined data of an unfinished frame may grow past `buffer_limit`.
#[derive(Debug)]
pub struct FrameParser {
    lines: LineDecoder,
    parser: SseParser,
    buffer_limit: usize,
}

impl FrameParser {
    pub fn new(encoding: CharEncoding, policy: DecodePolicy) -> Self {
        Self {
            lines: LineDecoder::new(encoding, policy),
            parser: SseParser::new(),
            buffer_limit: usize::MAX,
        }
    }

    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.lines = self.lines.with_line_limit(limit);
        self.buffer_limit = limit;
        self
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.char_encoding, config.decode_errors).with_buffer_limit(config.buffer_limit)
    }

    /// Feed a chunk of bytes, returning the frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, StreamError> {
        let mut frames = Vec::new();
        for line in self.lines.feed(chunk)? {
            frames.extend(self.feed_line(&line)?);
        }
        Ok(frames)
    }

    /// Flush the trailing partial line and any unterminated frame.
    pub fn finish(&mut self) -> Result<Option<Frame>, StreamError> {
        if let Some(line) = self.lines.finish()? {
            if let Some(frame) = self.feed_line(&line)? {
                return Ok(Some(frame));
            }
        }
        Ok(self.parser.finish())
    }

    fn feed_line(&mut self, line: &str) -> Result<Option<Frame>, StreamError> {
        let frame = self.parser.feed_line(line);
        let buffered = self.parser.data_len();
        if buffered > self.buffer_limit {
            self.parser.reset();
            return Err(StreamError::BufferOverflow {
                limit: self.buffer_limit,
                buffered,
            });
        }
        Ok(frame)
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(CharEncoding::Utf8, DecodePolicy::Replace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests for parse_sse_line

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse_sse_line(""), SseLine::Empty);
    }

    #[test]
    fn test_parse_comment_line() {
        assert_eq!(
            parse_sse_line(": keep-alive"),
            SseLine::Comment("keep-alive".to_string())
        );
    }

    #[test]
    fn test_parse_fields() {
        assert_eq!(parse_sse_line("event: close"), SseLine::Event("close".to_string()));
        assert_eq!(parse_sse_line("data:{\"a\":1}"), SseLine::Data("{\"a\":1}".to_string()));
        assert_eq!(parse_sse_line("id: 42"), SseLine::Id("42".to_string()));
        assert_eq!(parse_sse_line("retry: 500"), SseLine::Retry("500".to_string()));
    }

    #[test]
    fn test_parse_strips_exactly_one_space() {
        assert_eq!(parse_sse_line("data:  x "), SseLine::Data(" x ".to_string()));
    }

    #[test]
    fn test_parse_field_without_colon() {
        assert_eq!(parse_sse_line("data"), SseLine::Data(String::new()));
        assert_eq!(
            parse_sse_line("foo: bar"),
            SseLine::Unknown {
                field: "foo".to_string(),
                value: "bar".to_string()
            }
        );
    }

    // Tests for SseParser

    #[test]
    fn test_frame_emitted_on_blank_line() {
        let mut parser = SseParser::new();
        assert!(parser.feed_line("event: message").is_none());
        assert!(parser.feed_line("data: {\"a\":1}").is_none());
        let frame = parser.feed_line("").unwrap();
        assert_eq!(frame, Frame::new("message", "{\"a\":1}"));
    }

    #[test]
    fn test_multiple_data_lines_joined() {
        let mut parser = SseParser::new();
        parser.feed_line("data: first");
        parser.feed_line("data: second");
        let frame = parser.feed_line("").unwrap();
        assert_eq!(frame.data, "first\nsecond");
        assert_eq!(frame.event_type, DEFAULT_EVENT_TYPE);
    }

    #[test]
    fn test_id_and_retry() {
        let mut parser = SseParser::new();
        parser.feed_line("id: 7");
        parser.feed_line("retry: 1500");
        parser.feed_line("data: x");
        let frame = parser.feed_line("").unwrap();
        assert_eq!(frame.id.as_deref(), Some("7"));
        assert_eq!(frame.retry, Some(1500));
    }

    #[test]
    fn test_invalid_retry_ignored() {
        let mut parser = SseParser::new();
        parser.feed_line("retry: soon");
        parser.feed_line("data: x");
        assert_eq!(parser.feed_line("").unwrap().retry, None);
    }

    #[test]
    fn test_event_without_data_is_emitted() {
        let mut parser = SseParser::new();
        parser.feed_line("event: close");
        let frame = parser.feed_line("").unwrap();
        assert_eq!(frame, Frame::new("close", ""));
    }

    #[test]
    fn test_comment_only_block_emits_nothing() {
        let mut parser = SseParser::new();
        assert!(parser.feed_line(": ping").is_none());
        assert!(parser.feed_line("").is_none());
    }

    #[test]
    fn test_reset() {
        let mut parser = SseParser::new();
        parser.feed_line("event: message");
        parser.feed_line("data: x");
        parser.reset();
        assert!(!parser.has_pending());
        assert!(parser.feed_line("").is_none());
    }

    // Tests for FrameParser

    #[test]
    fn test_frame_parser_across_chunks() {
        let mut parser = FrameParser::default();
        let mut frames = parser.feed(b"event: keep_al").unwrap();
        frames.extend(parser.feed(b"ive\n\ndata: {\"a\"").unwrap());
        frames.extend(parser.feed(b":1}\n\nevent: close\n\n").unwrap());
        assert_eq!(
            frames,
            vec![
                Frame::new("keep_alive", ""),
                Frame::new("message", "{\"a\":1}"),
                Frame::new("close", ""),
            ]
        );
    }

    #[test]
    fn test_frame_parser_finish_flushes_unterminated_frame() {
        let mut parser = FrameParser::default();
        assert!(parser.feed(b"data: [1,2]").unwrap().is_empty());
        assert_eq!(
            parser.finish().unwrap(),
            Some(Frame::new("message", "[1,2]"))
        );
        assert_eq!(parser.finish().unwrap(), None);
    }

    #[test]
    fn test_frame_parser_bounds_unterminated_line() {
        let config = StreamConfig::default().with_buffer_limit(1024);
        let mut parser = FrameParser::from_config(&config);
        assert!(parser.feed(b"data: ").unwrap().is_empty());

        let chunk = vec![b'x'; 4096];
        let err = parser.feed(&chunk).unwrap_err();
        assert!(matches!(err, StreamError::BufferOverflow { limit: 1024, .. }));
    }

    #[test]
    fn test_frame_parser_bounds_joined_data() {
        let mut parser = FrameParser::default().with_buffer_limit(32);
        let line = format!("data: {}\n", "y".repeat(20));
        assert!(parser.feed(line.as_bytes()).unwrap().is_empty());

        let err = parser.feed(line.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            StreamError::BufferOverflow {
                limit: 32,
                buffered: 41
            }
        );
        // The oversized frame is discarded; parsing resumes at the next one.
        assert!(parser.feed(b"\n").unwrap().is_empty());
        assert_eq!(
            parser.feed(b"data: ok\n\n").unwrap(),
            vec![Frame::new("message", "ok")]
        );
    }

    #[test]
    fn test_data_len_tracks_join() {
        let mut parser = SseParser::new();
        parser.feed_line("data: ab");
        parser.feed_line("data: c");
        assert_eq!(parser.data_len(), "ab\nc".len());
        parser.feed_line("");
        assert_eq!(parser.data_len(), 0);
    }

    #[test]
    fn test_frame_parser_crlf() {
        let mut parser = FrameParser::default();
        let frames = parser.feed(b"data: 1\r\n\r\ndata: 2\r\n\r\n").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, "2");
    }
}
