//! Reply objects produced by nested command calls.
//!
//! A [`CallReply`] keeps the exact bytes the host produced for the call, so
//! it can be relayed to a client untouched. Its tag is read from the first
//! byte; scalar payloads are decoded on demand and array elements are split
//! out on first element access and cached.

use once_cell::unsync::OnceCell;

use crate::error::Result;
use crate::resp::{frame_len, parse_number, read_line};

/// Tag of a reply object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyType {
    /// Bulk or status string
    String,
    /// Error string
    Error,
    /// Integer
    Integer,
    /// Array of nested replies
    Array,
    /// Null bulk or null array
    Null,
    /// Bytes not recognised as a reply
    Unknown,
}

/// Reply returned by a nested command invocation.
#[derive(Debug)]
pub struct CallReply {
    proto: Vec<u8>,
    elements: OnceCell<Vec<CallReply>>,
}

impl CallReply {
    /// Wrap the encoded bytes of exactly one reply frame.
    pub fn from_proto(proto: Vec<u8>) -> Self {
        CallReply {
            proto,
            elements: OnceCell::new(),
        }
    }

    /// The encoded reply, suitable for relaying verbatim.
    pub fn proto(&self) -> &[u8] {
        &self.proto
    }

    /// Tag of this reply. Must be checked before interpreting the payload.
    pub fn reply_type(&self) -> ReplyType {
        match self.proto.first() {
            Some(b'+') => ReplyType::String,
            Some(b'-') => ReplyType::Error,
            Some(b':') => ReplyType::Integer,
            Some(b'$') if self.header_number() == Some(-1) => ReplyType::Null,
            Some(b'$') => ReplyType::String,
            Some(b'*') if self.header_number() == Some(-1) => ReplyType::Null,
            Some(b'*') => ReplyType::Array,
            _ => ReplyType::Unknown,
        }
    }

    /// Integer payload; 0 for non-integer replies.
    pub fn integer(&self) -> i64 {
        match self.reply_type() {
            ReplyType::Integer => self.header_number().unwrap_or(0),
            _ => 0,
        }
    }

    /// String payload of a bulk, status or error reply.
    pub fn string_bytes(&self) -> Option<&[u8]> {
        match self.reply_type() {
            ReplyType::String | ReplyType::Error => {
                let (line, after) = read_line(&self.proto, 0).ok()?;
                if self.proto[0] == b'$' {
                    let len = parse_number(&line[1..]).ok()? as usize;
                    self.proto.get(after..after + len)
                } else {
                    Some(&line[1..])
                }
            }
            _ => None,
        }
    }

    /// Byte length for string replies, element count for arrays, 0 otherwise.
    pub fn length(&self) -> usize {
        match self.reply_type() {
            ReplyType::String | ReplyType::Error => self.string_bytes().map_or(0, <[u8]>::len),
            ReplyType::Array => self.header_number().map_or(0, |n| n.max(0) as usize),
            _ => 0,
        }
    }

    /// Nested reply at `index` of an array reply.
    ///
    /// The first call splits the array into element replies, later calls
    /// reuse them. Returns `None` for non-arrays and out of range indexes.
    pub fn element(&self, index: usize) -> Option<&CallReply> {
        if self.reply_type() != ReplyType::Array {
            return None;
        }
        let elements = self.elements.get_or_try_init(|| self.split_elements()).ok()?;
        elements.get(index)
    }

    fn split_elements(&self) -> Result<Vec<CallReply>> {
        let (_, mut offset) = read_line(&self.proto, 0)?;
        let count = self.length();
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let used = frame_len(&self.proto[offset..])?;
            elements.push(CallReply::from_proto(self.proto[offset..offset + used].to_vec()));
            offset += used;
        }
        Ok(elements)
    }

    fn header_number(&self) -> Option<i64> {
        let (line, _) = read_line(&self.proto, 0).ok()?;
        parse_number(line.get(1..)?).ok()
    }
}
