//! Byte to text-line decoding.
//!
//! Upstream chunk boundaries may fall anywhere, including inside a line or
//! a multi-byte character. [`LineDecoder`] keeps raw bytes until a line
//! terminator arrives and only then decodes the whole line, so a split
//! character is never seen as invalid.

use std::fmt;
use std::str::FromStr;

use crate::error::StreamError;

/// Character encodings the line decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// 7-bit ASCII: bytes above 0x7F are invalid.
    Ascii,
}

impl CharEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharEncoding::Utf8 => "utf-8",
            CharEncoding::Latin1 => "latin-1",
            CharEncoding::Ascii => "ascii",
        }
    }
}

impl fmt::Display for CharEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(CharEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(CharEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(CharEncoding::Ascii),
            other => Err(format!("unsupported encoding: {}", other)),
        }
    }
}

/// Handling of byte sequences that are invalid in the chosen encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Substitute U+FFFD for each invalid sequence.
    #[default]
    Replace,
    /// Drop invalid sequences.
    Ignore,
    /// Fail with [`StreamError::InvalidEncoding`].
    Strict,
}

impl FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(DecodePolicy::Replace),
            "ignore" => Ok(DecodePolicy::Ignore),
            "strict" => Ok(DecodePolicy::Strict),
            other => Err(format!("unknown decode policy: {}", other)),
        }
    }
}

/// Splits a byte stream into decoded lines.
///
/// Accepts `\n`, `\r\n` and bare `\r` as terminators. A leading UTF-8 byte
/// order mark on the first line is stripped. An unterminated line longer
/// than the line limit fails with [`StreamError::BufferOverflow`].
#[derive(Debug)]
pub struct LineDecoder {
    encoding: CharEncoding,
    policy: DecodePolicy,
    pending: Vec<u8>,
    line_limit: usize,
    /// Last byte seen was `\r`; a following `\n` belongs to the same terminator.
    after_cr: bool,
    at_start: bool,
}

impl LineDecoder {
    pub fn new(encoding: CharEncoding, policy: DecodePolicy) -> Self {
        Self {
            encoding,
            policy,
            pending: Vec::new(),
            line_limit: usize::MAX,
            after_cr: false,
            at_start: true,
        }
    }

    pub fn with_line_limit(mut self, limit: usize) -> Self {
        self.line_limit = limit;
        self
    }

    /// Feed a chunk, returning every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, StreamError> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        if self.after_cr && !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix(b"\n") {
                rest = stripped;
            }
            self.after_cr = false;
        }

        while let Some(pos) = rest.iter().position(|b| *b == b'\n' || *b == b'\r') {
            self.hold(&rest[..pos])?;
            lines.push(self.take_line()?);

            if rest[pos] == b'\r' {
                match rest.get(pos + 1) {
                    Some(b'\n') => rest = &rest[pos + 2..],
                    Some(_) => rest = &rest[pos + 1..],
                    None => {
                        self.after_cr = true;
                        rest = &[];
                    }
                }
            } else {
                rest = &rest[pos + 1..];
            }
        }

        self.hold(rest)?;
        Ok(lines)
    }

    fn hold(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let buffered = self.pending.len() + bytes.len();
        if buffered > self.line_limit {
            self.pending.clear();
            return Err(StreamError::BufferOverflow {
                limit: self.line_limit,
                buffered,
            });
        }
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    /// Flush an unterminated trailing line, if any.
    pub fn finish(&mut self) -> Result<Option<String>, StreamError> {
        self.after_cr = false;
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.take_line().map(Some)
    }

    /// Bytes held back waiting for a line terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn take_line(&mut self) -> Result<String, StreamError> {
        let bytes = std::mem::take(&mut self.pending);
        let mut line = decode(&bytes, self.encoding, self.policy)?;
        if self.at_start {
            self.at_start = false;
            if let Some(stripped) = line.strip_prefix('\u{FEFF}') {
                line = stripped.to_string();
            }
        }
        Ok(line)
    }
}

fn decode(bytes: &[u8], encoding: CharEncoding, policy: DecodePolicy) -> Result<String, StreamError> {
    match encoding {
        CharEncoding::Utf8 => decode_utf8(bytes, policy),
        CharEncoding::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
        CharEncoding::Ascii => {
            let mut out = String::with_capacity(bytes.len());
            for (offset, b) in bytes.iter().enumerate() {
                if b.is_ascii() {
                    out.push(char::from(*b));
                    continue;
                }
                match policy {
                    DecodePolicy::Replace => out.push(char::REPLACEMENT_CHARACTER),
                    DecodePolicy::Ignore => {}
                    DecodePolicy::Strict => {
                        return Err(StreamError::InvalidEncoding {
                            encoding: encoding.as_str(),
                            offset,
                        })
                    }
                }
            }
            Ok(out)
        }
    }
}

fn decode_utf8(bytes: &[u8], policy: DecodePolicy) -> Result<String, StreamError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    match policy {
        DecodePolicy::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DecodePolicy::Ignore => Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
        DecodePolicy::Strict => {
            let offset = std::str::from_utf8(bytes)
                .err()
                .map(|e| e.valid_up_to())
                .unwrap_or_default();
            Err(StreamError::InvalidEncoding {
                encoding: CharEncoding::Utf8.as_str(),
                offset,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8() -> LineDecoder {
        LineDecoder::new(CharEncoding::Utf8, DecodePolicy::Replace)
    }

    #[test]
    fn test_lines_across_chunks() {
        let mut decoder = utf8();
        assert!(decoder.feed(b"data: hel").unwrap().is_empty());
        assert_eq!(decoder.feed(b"lo\ndata").unwrap(), vec!["data: hello"]);
        assert_eq!(decoder.feed(b": x\n\n").unwrap(), vec!["data: x", ""]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_crlf_split_between_chunks() {
        let mut decoder = utf8();
        assert_eq!(decoder.feed(b"a\r").unwrap(), vec!["a"]);
        assert_eq!(decoder.feed(b"\nb\n").unwrap(), vec!["b"]);
    }

    #[test]
    fn test_bare_cr_terminates() {
        let mut decoder = utf8();
        assert_eq!(decoder.feed(b"a\rb\r\nc\n").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cr_then_blank_line() {
        let mut decoder = utf8();
        assert_eq!(decoder.feed(b"a\r").unwrap(), vec!["a"]);
        assert_eq!(decoder.feed(b"\r").unwrap(), vec![""]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let mut decoder = utf8();
        let text = "data: é\n".as_bytes();
        let (head, tail) = text.split_at(7);
        assert!(decoder.feed(head).unwrap().is_empty());
        assert_eq!(decoder.feed(tail).unwrap(), vec!["data: é"]);
    }

    #[test]
    fn test_replace_policy() {
        let mut decoder = utf8();
        let lines = decoder.feed(b"a\xffb\n").unwrap();
        assert_eq!(lines, vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn test_ignore_policy() {
        let mut decoder = LineDecoder::new(CharEncoding::Utf8, DecodePolicy::Ignore);
        assert_eq!(decoder.feed(b"a\xffb\n").unwrap(), vec!["ab"]);
    }

    #[test]
    fn test_strict_policy() {
        let mut decoder = LineDecoder::new(CharEncoding::Utf8, DecodePolicy::Strict);
        let err = decoder.feed(b"ab\xff\n").unwrap_err();
        assert_eq!(
            err,
            StreamError::InvalidEncoding {
                encoding: "utf-8",
                offset: 2
            }
        );
    }

    #[test]
    fn test_latin1_never_fails() {
        let mut decoder = LineDecoder::new(CharEncoding::Latin1, DecodePolicy::Strict);
        assert_eq!(decoder.feed(b"caf\xe9\n").unwrap(), vec!["café"]);
    }

    #[test]
    fn test_ascii_policies() {
        let mut replace = LineDecoder::new(CharEncoding::Ascii, DecodePolicy::Replace);
        assert_eq!(replace.feed(b"a\x80\n").unwrap(), vec!["a\u{FFFD}"]);

        let mut strict = LineDecoder::new(CharEncoding::Ascii, DecodePolicy::Strict);
        assert!(strict.feed(b"a\x80\n").is_err());
    }

    #[test]
    fn test_bom_stripped_once() {
        let mut decoder = utf8();
        let lines = decoder.feed("\u{FEFF}data: 1\n\u{FEFF}x\n".as_bytes()).unwrap();
        assert_eq!(lines, vec!["data: 1", "\u{FEFF}x"]);
    }

    #[test]
    fn test_finish_flushes_partial_line() {
        let mut decoder = utf8();
        decoder.feed(b"data: tail").unwrap();
        assert_eq!(decoder.finish().unwrap().as_deref(), Some("data: tail"));
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn test_line_limit_without_newline() {
        let mut decoder = utf8().with_line_limit(16);
        assert!(decoder.feed(b"data: 0123456789").unwrap().is_empty());
        let err = decoder.feed(&[b'x'; 1024]).unwrap_err();
        assert_eq!(
            err,
            StreamError::BufferOverflow {
                limit: 16,
                buffered: 1040
            }
        );
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_line_limit_counts_only_current_line() {
        let mut decoder = utf8().with_line_limit(8);
        let lines = decoder.feed(b"data: 1\ndata: 2\ndata: 3\n").unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("UTF_8".parse::<CharEncoding>().unwrap(), CharEncoding::Utf8);
        assert_eq!("iso-8859-1".parse::<CharEncoding>().unwrap(), CharEncoding::Latin1);
        assert!("koi8-r".parse::<CharEncoding>().is_err());
        assert_eq!("Strict".parse::<DecodePolicy>().unwrap(), DecodePolicy::Strict);
        assert!("explode".parse::<DecodePolicy>().is_err());
    }
}
