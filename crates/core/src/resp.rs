//! RESP framing used for replies and the propagation log.
//!
//! Replies written by command handlers, replies returned by nested calls and
//! entries of the append-only log all share this encoding:
//!
//! | Prefix | Shape |
//! |--------|-------|
//! | `+` | status line |
//! | `-` | error line, `<CLASS-TOKEN> <message>` |
//! | `:` | signed integer |
//! | `$` | bulk string, `$-1` for null |
//! | `*` | array header followed by that many frames, `*-1` for null |

use crate::error::{Error, Result};

/// A fully decoded reply frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `+OK`
    Simple(String),
    /// `-ERR message`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$3\r\nfoo`
    Bulk(Vec<u8>),
    /// `*2\r\n...`
    Array(Vec<Frame>),
    /// `$-1` or `*-1`
    Null,
}

impl Frame {
    /// Encode this frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Append the encoding of this frame to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => write_simple(out, s),
            Frame::Error(e) => write_error(out, e),
            Frame::Integer(i) => write_integer(out, *i),
            Frame::Bulk(b) => write_bulk(out, b),
            Frame::Array(items) => {
                write_array_header(out, items.len());
                for item in items {
                    item.encode_into(out);
                }
            }
            Frame::Null => write_null(out),
        }
    }

    /// Convenience constructor for a bulk frame.
    pub fn bulk(bytes: impl Into<Vec<u8>>) -> Self {
        Frame::Bulk(bytes.into())
    }

    /// Encode a command argument vector as an array of bulk strings.
    pub fn command<A: AsRef<[u8]>>(argv: &[A]) -> Vec<u8> {
        let mut out = Vec::new();
        write_array_header(&mut out, argv.len());
        for arg in argv {
            write_bulk(&mut out, arg.as_ref());
        }
        out
    }
}

/// `+<status>\r\n`. Line breaks in the status are replaced by spaces.
pub fn write_simple(out: &mut Vec<u8>, status: &str) {
    out.push(b'+');
    push_line(out, status);
}

/// `-<error>\r\n`. Line breaks in the message are replaced by spaces.
pub fn write_error(out: &mut Vec<u8>, message: &str) {
    out.push(b'-');
    push_line(out, message);
}

/// `:<value>\r\n`
pub fn write_integer(out: &mut Vec<u8>, value: i64) {
    out.push(b':');
    out.extend_from_slice(value.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// `$<len>\r\n<bytes>\r\n`
pub fn write_bulk(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'$');
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\r\n");
}

/// `*<len>\r\n`
pub fn write_array_header(out: &mut Vec<u8>, len: usize) {
    out.push(b'*');
    out.extend_from_slice(len.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// `$-1\r\n`
pub fn write_null(out: &mut Vec<u8>) {
    out.extend_from_slice(b"$-1\r\n");
}

fn push_line(out: &mut Vec<u8>, text: &str) {
    out.extend(text.bytes().map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b }));
    out.extend_from_slice(b"\r\n");
}

/// Decode exactly one frame from the start of `input`.
///
/// Returns the frame and the number of bytes it occupies.
pub fn parse_frame(input: &[u8]) -> Result<(Frame, usize)> {
    let (line, after_line) = read_line(input, 0)?;
    let (&kind, body) = line
        .split_first()
        .ok_or_else(|| protocol_error("empty frame header"))?;
    match kind {
        b'+' => Ok((Frame::Simple(lossy(body)), after_line)),
        b'-' => Ok((Frame::Error(lossy(body)), after_line)),
        b':' => Ok((Frame::Integer(parse_number(body)?), after_line)),
        b'$' => {
            let len = parse_number(body)?;
            if len < 0 {
                return Ok((Frame::Null, after_line));
            }
            let end = after_line + len as usize;
            if input.len() < end + 2 || &input[end..end + 2] != b"\r\n" {
                return Err(protocol_error("truncated bulk string"));
            }
            Ok((Frame::Bulk(input[after_line..end].to_vec()), end + 2))
        }
        b'*' => {
            let len = parse_number(body)?;
            if len < 0 {
                return Ok((Frame::Null, after_line));
            }
            let mut offset = after_line;
            let mut items = Vec::with_capacity(len.min(1024) as usize);
            for _ in 0..len {
                let (item, used) = parse_frame(&input[offset..])?;
                items.push(item);
                offset += used;
            }
            Ok((Frame::Array(items), offset))
        }
        other => Err(protocol_error(&format!("unknown frame type byte 0x{:02x}", other))),
    }
}

/// Byte length of the frame at the start of `input`, without decoding
/// nested payloads into owned values.
pub fn frame_len(input: &[u8]) -> Result<usize> {
    let (line, after_line) = read_line(input, 0)?;
    let (&kind, body) = line
        .split_first()
        .ok_or_else(|| protocol_error("empty frame header"))?;
    match kind {
        b'+' | b'-' | b':' => Ok(after_line),
        b'$' => {
            let len = parse_number(body)?;
            if len < 0 {
                return Ok(after_line);
            }
            let end = after_line + len as usize + 2;
            if input.len() < end {
                return Err(protocol_error("truncated bulk string"));
            }
            Ok(end)
        }
        b'*' => {
            let len = parse_number(body)?;
            let mut offset = after_line;
            for _ in 0..len.max(0) {
                offset += frame_len(&input[offset..])?;
            }
            Ok(offset)
        }
        other => Err(protocol_error(&format!("unknown frame type byte 0x{:02x}", other))),
    }
}

/// Split a header line off `input` starting at `from`; returns the line
/// without its terminator and the offset just past the terminator.
pub(crate) fn read_line(input: &[u8], from: usize) -> Result<(&[u8], usize)> {
    let rest = input.get(from..).unwrap_or_default();
    let pos = rest
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| protocol_error("missing line terminator"))?;
    Ok((&rest[..pos], from + pos + 2))
}

pub(crate) fn parse_number(text: &[u8]) -> Result<i64> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| protocol_error("invalid length or integer"))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn protocol_error(reason: &str) -> Error {
    Error::invalid_value(format!("Protocol error: {}", reason))
}
