//! Error types for the module protocol
//!
//! Every failure that can occur on either side of the host/module boundary is
//! represented by [`Error`]. Errors never cross the boundary as panics: host
//! capabilities return them as values and command handlers turn them into an
//! error reply with [`Error::reply_message`].

use std::io;
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Canonical wrong-type error text sent to clients.
pub const WRONGTYPE_MESSAGE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Error types for the module protocol
///
/// # Categories
///
/// | Category | Variants |
/// |----------|----------|
/// | Type | `WrongType` |
/// | Value | `InvalidValue`, `InvalidFormat`, `NoSuchDb` |
/// | Handle | `KeyNotWritable`, `InvalidHandle`, `DoubleRelease`, `CursorNotActive` |
/// | Phase | `NotLoading`, `NotInvocation` |
/// | Load | `DuplicateCommand`, `CapabilityMissing`, `CapabilityMismatch`, `UnsupportedApiVersion`, `ModuleLoadFailed`, `ModuleAlreadyLoaded` |
/// | System | `Config`, `Io` |
#[derive(Debug, Error)]
pub enum Error {
    // ==================== Type Errors ====================
    /// Key holds a value of a type incompatible with the operation
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,

    // ==================== Value Errors ====================
    /// Argument or stored value failed validation
    #[error("{reason}")]
    InvalidValue {
        /// Human readable reason
        reason: String,
    },

    /// Call/replicate format string does not match the supplied arguments
    #[error("invalid call format: {reason}")]
    InvalidFormat {
        /// What was wrong with the format
        reason: String,
    },

    /// Logical database index out of range
    #[error("DB index is out of range: {index}")]
    NoSuchDb {
        /// Requested index
        index: i64,
    },

    // ==================== Handle Errors ====================
    /// Mutating operation on a key handle opened without write mode
    #[error("key handle is not open for writing")]
    KeyNotWritable,

    /// Handle does not refer to a live resource of this invocation
    #[error("stale or unknown {kind} handle")]
    InvalidHandle {
        /// Resource kind ("key" or "reply")
        kind: &'static str,
    },

    /// Resource released twice under explicit ownership
    #[error("{kind} handle released twice")]
    DoubleRelease {
        /// Resource kind ("key" or "reply")
        kind: &'static str,
    },

    /// Range cursor accessed while not positioned on an element
    #[error("sorted set range cursor is not active")]
    CursorNotActive,

    // ==================== Phase Errors ====================
    /// Load-time capability used outside module loading
    #[error("operation is only valid while a module is loading")]
    NotLoading,

    /// Invocation capability used outside a command invocation
    #[error("operation is only valid inside a command invocation")]
    NotInvocation,

    // ==================== Load Errors ====================
    /// Command name already registered
    #[error("command '{name}' is already registered")]
    DuplicateCommand {
        /// Offending command name
        name: String,
    },

    /// Host does not provide a required capability
    #[error("capability '{name}' is not provided by the host")]
    CapabilityMissing {
        /// Capability name
        name: String,
    },

    /// Host resolved a capability name to an entry point of another kind
    #[error("capability '{name}' resolved to an incompatible entry point")]
    CapabilityMismatch {
        /// Capability name
        name: String,
    },

    /// Requested protocol version is not supported
    #[error("unsupported module API version {requested}")]
    UnsupportedApiVersion {
        /// Version the module asked for
        requested: u32,
    },

    /// Module entry point reported failure
    #[error("module load failed: {reason}")]
    ModuleLoadFailed {
        /// Why the load was aborted
        reason: String,
    },

    /// A module with the same name is already loaded
    #[error("module '{name}' is already loaded")]
    ModuleAlreadyLoaded {
        /// Module name
        name: String,
    },

    // ==================== System Errors ====================
    /// Configuration could not be read or is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (append-only log, config file)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidValue`].
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::InvalidFormat`].
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Error::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Leading class token used when this error is sent as a reply.
    pub fn class_token(&self) -> &'static str {
        match self {
            Error::WrongType => "WRONGTYPE",
            _ => "ERR",
        }
    }

    /// Full `<CLASS-TOKEN> <message>` text for an error reply.
    pub fn reply_message(&self) -> String {
        match self {
            Error::WrongType => WRONGTYPE_MESSAGE.to_string(),
            other => format!("{} {}", other.class_token(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrongtype_reply_message() {
        assert_eq!(Error::WrongType.reply_message(), WRONGTYPE_MESSAGE);
        assert_eq!(Error::WrongType.class_token(), "WRONGTYPE");
    }

    #[test]
    fn test_generic_errors_use_err_token() {
        let err = Error::invalid_value("invalid count");
        assert_eq!(err.class_token(), "ERR");
        assert_eq!(err.reply_message(), "ERR invalid count");
    }

    #[test]
    fn test_error_display_duplicate_command() {
        let err = Error::DuplicateCommand {
            name: "hello.simple".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hello.simple"));
        assert!(msg.contains("already registered"));
    }

    #[test]
    fn test_error_display_capability_missing() {
        let err = Error::CapabilityMissing {
            name: "OpenKey".to_string(),
        };
        assert!(err.to_string().contains("OpenKey"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::DoubleRelease { kind: "key" };
        match err {
            Error::DoubleRelease { kind } => assert_eq!(kind, "key"),
            _ => panic!("Wrong error variant"),
        }
    }
}
