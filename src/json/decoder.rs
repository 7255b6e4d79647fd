//! Buffered incremental JSON decoder.

use serde_json::Value;

use crate::error::StreamError;

/// What kind of top-level value the scanner is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// Object or array; closes when nesting depth returns to zero.
    Container,
    /// String literal; closes on the matching unescaped quote.
    Str,
    /// Number or literal; closes on the next delimiter or at finish.
    Scalar,
}

/// Splits a sequence of text fragments into complete JSON values.
///
/// Values are emitted as soon as they close. Whitespace and commas between
/// top-level values are skipped, so `{"a":1},{"b":2}` decodes as two
/// records. The text of the value still being assembled never exceeds
/// `buffer_limit` bytes; going past it fails with
/// [`StreamError::BufferOverflow`] and discards the buffer.
///
/// # Example
///
/// ```ignore
/// let mut decoder = BufferedJsonDecoder::new(1024);
/// assert!(decoder.decode(r#"{"a":"#)?.is_empty());
/// assert_eq!(decoder.decode("1}")?, vec![json!({"a": 1})]);
/// ```
#[derive(Debug)]
pub struct BufferedJsonDecoder {
    buffer: String,
    buffer_limit: usize,
    /// Next byte of `buffer` to scan.
    pos: usize,
    /// Start of the value being assembled, if inside one.
    start: Option<usize>,
    kind: ValueKind,
    depth: usize,
    in_string: bool,
    escaped: bool,
    /// Bytes already drained from the front of `buffer`, for error offsets.
    consumed: usize,
}

impl BufferedJsonDecoder {
    pub fn new(buffer_limit: usize) -> Self {
        Self {
            buffer: String::new(),
            buffer_limit,
            pos: 0,
            start: None,
            kind: ValueKind::Scalar,
            depth: 0,
            in_string: false,
            escaped: false,
            consumed: 0,
        }
    }

    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Bytes of an unfinished value currently held.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a fragment, returning every value it completes, in order.
    pub fn decode(&mut self, fragment: &str) -> Result<Vec<Value>, StreamError> {
        self.buffer.push_str(fragment);

        let ranges = self.scan();
        let values = self.parse_ranges(&ranges);
        self.compact();
        let values = values?;

        if self.buffer.len() > self.buffer_limit {
            let buffered = self.buffer.len();
            self.reset();
            return Err(StreamError::BufferOverflow {
                limit: self.buffer_limit,
                buffered,
            });
        }
        Ok(values)
    }

    /// Flush at end of stream.
    ///
    /// A trailing number or literal is complete once the stream ends; an
    /// unclosed object, array or string is reported as
    /// [`StreamError::Truncated`]. The decoder is empty afterwards either
    /// way.
    pub fn finish(&mut self) -> Result<Vec<Value>, StreamError> {
        let result = match self.start {
            None => Ok(Vec::new()),
            Some(start) if self.kind == ValueKind::Scalar => {
                let end = self.buffer.len();
                self.parse_ranges(&[(start, end)])
            }
            Some(start) => Err(StreamError::Truncated {
                pending: self.buffer.len() - start,
            }),
        };
        self.reset();
        result
    }

    /// Drop all buffered state.
    pub fn reset(&mut self) {
        self.consumed += self.buffer.len();
        self.buffer.clear();
        self.pos = 0;
        self.start = None;
        self.kind = ValueKind::Scalar;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }

    /// Advance over newly appended bytes, returning byte ranges of values
    /// that closed.
    fn scan(&mut self) -> Vec<(usize, usize)> {
        let bytes = self.buffer.as_bytes();
        let mut ranges = Vec::new();

        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            let Some(start) = self.start else {
                if !(b.is_ascii_whitespace() || b == b',') {
                    self.start = Some(self.pos);
                    match b {
                        b'{' | b'[' => {
                            self.kind = ValueKind::Container;
                            self.depth = 1;
                        }
                        b'"' => {
                            self.kind = ValueKind::Str;
                            self.in_string = true;
                        }
                        _ => self.kind = ValueKind::Scalar,
                    }
                }
                self.pos += 1;
                continue;
            };

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.kind == ValueKind::Str {
                        ranges.push((start, self.pos + 1));
                        self.start = None;
                    }
                }
                self.pos += 1;
                continue;
            }

            if self.kind == ValueKind::Scalar {
                if is_delimiter(b) {
                    // The delimiter itself is rescanned as a separator or
                    // the start of the next value.
                    ranges.push((start, self.pos));
                    self.start = None;
                } else {
                    self.pos += 1;
                }
                continue;
            }

            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        ranges.push((start, self.pos + 1));
                        self.start = None;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }

        ranges
    }

    fn parse_ranges(&self, ranges: &[(usize, usize)]) -> Result<Vec<Value>, StreamError> {
        ranges
            .iter()
            .map(|&(start, end)| {
                serde_json::from_str(&self.buffer[start..end]).map_err(|err| {
                    StreamError::InvalidJson {
                        position: self.consumed + start,
                        message: err.to_string(),
                    }
                })
            })
            .collect()
    }

    /// Drop the scanned prefix that no longer belongs to an open value.
    fn compact(&mut self) {
        let keep_from = self.start.unwrap_or(self.pos);
        if keep_from == 0 {
            return;
        }
        self.buffer.drain(..keep_from);
        self.consumed += keep_from;
        self.pos -= keep_from;
        if let Some(start) = self.start.as_mut() {
            *start -= keep_from;
        }
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b',' | b'{' | b'[' | b'"' | b'}' | b']')
}
