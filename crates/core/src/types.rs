//! Small value types exchanged across the host/module boundary.

use std::fmt;
use std::ops::BitOr;

/// Only protocol version currently spoken by the host.
pub const API_VERSION_1: u32 = 1;

/// Sentinel returned by `GetExpire` for keys without a deadline, and accepted
/// by `SetExpire` to remove one.
pub const NO_EXPIRE: i64 = -1;

/// Outcome of a command handler or reply capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation succeeded
    Ok,
    /// Operation failed
    Err,
}

impl Status {
    /// True for [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl<T, E> From<Result<T, E>> for Status {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(_) => Status::Err,
        }
    }
}

/// Type of the value a key handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// No value stored under the key
    Empty,
    /// Byte string
    String,
    /// Doubly ended list of byte strings
    List,
    /// Field/value map
    Hash,
    /// Unordered set of members
    Set,
    /// Members ordered by score
    ZSet,
}

impl KeyType {
    /// Name reported by the host's `TYPE` command.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::Empty => "none",
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Hash => "hash",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
        }
    }

    /// True if the key is empty or already holds `expected`.
    pub fn is_empty_or(self, expected: KeyType) -> bool {
        self == KeyType::Empty || self == expected
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access intent requested when opening a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    read: bool,
    write: bool,
}

impl OpenMode {
    /// Read access
    pub const READ: OpenMode = OpenMode {
        read: true,
        write: false,
    };
    /// Write access
    pub const WRITE: OpenMode = OpenMode {
        read: false,
        write: true,
    };
    /// Read and write access
    pub const READ_WRITE: OpenMode = OpenMode {
        read: true,
        write: true,
    };

    /// Whether read access was requested
    pub fn is_read(self) -> bool {
        self.read
    }

    /// Whether write access was requested
    pub fn is_write(self) -> bool {
        self.write
    }
}

impl BitOr for OpenMode {
    type Output = OpenMode;

    fn bitor(self, rhs: OpenMode) -> OpenMode {
        OpenMode {
            read: self.read || rhs.read,
            write: self.write || rhs.write,
        }
    }
}

/// End of a list targeted by push/pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    /// First element
    Head,
    /// Last element
    Tail,
}

/// Existence condition for sorted set additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZaddMode {
    /// Add or update unconditionally
    #[default]
    Always,
    /// Only add members that do not exist yet
    Nx,
    /// Only update members that already exist
    Xx,
}

/// What a sorted set addition actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZaddOutcome {
    /// A new member was inserted
    Added,
    /// An existing member had its score changed
    Updated,
    /// Nothing changed, because of the mode or an identical score
    Nop,
}

/// Handle to a key opened through a command context.
///
/// Handles are generation-checked: once released, the same slot may be reused
/// but the stale handle keeps failing with `InvalidHandle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHandle {
    /// Slot index in the invocation's key table
    pub index: u32,
    /// Slot generation at allocation time
    pub generation: u32,
}

/// Handle to a reply object returned by `Call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyHandle {
    /// Slot index in the invocation's reply table
    pub index: u32,
    /// Slot generation at allocation time
    pub generation: u32,
}
