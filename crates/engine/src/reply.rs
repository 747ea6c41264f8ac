//! Reply sink for one invocation.
//!
//! Handlers must produce exactly one top-level reply. The buffer tracks open
//! arrays so it knows when the top-level value is complete; anything written
//! after that is dropped, and a missing or unfinished reply is replaced by an
//! error when the invocation ends.

use ember_core::resp;
use ember_core::{format_f64, Status};
use tracing::warn;

#[derive(Debug, Default)]
pub(crate) struct ReplyBuffer {
    out: Vec<u8>,
    /// Elements still expected by each open array, innermost last
    open_arrays: Vec<usize>,
    complete: bool,
    dropped: usize,
}

impl ReplyBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn simple(&mut self, status: &str) -> Status {
        self.write(|out| resp::write_simple(out, status))
    }

    pub(crate) fn error(&mut self, message: &str) -> Status {
        self.write(|out| resp::write_error(out, message))
    }

    pub(crate) fn integer(&mut self, value: i64) -> Status {
        self.write(|out| resp::write_integer(out, value))
    }

    pub(crate) fn bulk(&mut self, bytes: &[u8]) -> Status {
        self.write(|out| resp::write_bulk(out, bytes))
    }

    pub(crate) fn null(&mut self) -> Status {
        self.write(resp::write_null)
    }

    pub(crate) fn double(&mut self, value: f64) -> Status {
        self.bulk(format_f64(value).as_bytes())
    }

    /// Append an already encoded reply unchanged.
    pub(crate) fn raw(&mut self, proto: &[u8]) -> Status {
        self.write(|out| out.extend_from_slice(proto))
    }

    /// Start an array; the next `len` values become its elements.
    pub(crate) fn array(&mut self, len: usize) -> Status {
        if !self.accepting() {
            return Status::Err;
        }
        resp::write_array_header(&mut self.out, len);
        if len == 0 {
            self.value_done();
        } else {
            self.open_arrays.push(len);
        }
        Status::Ok
    }

    /// True once a complete top-level reply has been written.
    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    /// Replies dropped because a top-level reply was already complete.
    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }

    /// The encoded reply, substituting an error if the handler did not
    /// finish one.
    pub(crate) fn finish(self, command: &str) -> Vec<u8> {
        if self.complete {
            return self.out;
        }
        let reason = if self.out.is_empty() {
            "no reply"
        } else {
            "incomplete array reply"
        };
        warn!(target: "ember::dispatch", command, reason, "handler broke the single reply contract");
        let mut out = Vec::new();
        resp::write_error(
            &mut out,
            &format!("ERR command '{}' produced {}", command, reason),
        );
        out
    }

    fn write(&mut self, encode: impl FnOnce(&mut Vec<u8>)) -> Status {
        if !self.accepting() {
            return Status::Err;
        }
        encode(&mut self.out);
        self.value_done();
        Status::Ok
    }

    fn accepting(&mut self) -> bool {
        if self.complete {
            self.dropped += 1;
            warn!(target: "ember::dispatch", dropped = self.dropped, "reply after the top-level reply was complete");
            return false;
        }
        true
    }

    fn value_done(&mut self) {
        loop {
            match self.open_arrays.last_mut() {
                None => {
                    self.complete = true;
                    return;
                }
                Some(remaining) => {
                    *remaining -= 1;
                    if *remaining > 0 {
                        return;
                    }
                    self.open_arrays.pop();
                }
            }
        }
    }
}
