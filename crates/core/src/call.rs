//! Positional argument encoding for `Call` and `Replicate`.
//!
//! A call names a command, a format string and a list of typed arguments.
//! Each format code describes how the argument at the same position is
//! serialized, so the number of codes must equal the number of arguments:
//!
//! | Code | Argument |
//! |------|----------|
//! | `s` | [`CallArg::String`], a module string |
//! | `c`, `b` | [`CallArg::Buffer`], literal bytes |
//! | `l` | [`CallArg::Integer`], rendered in decimal |
//! | `v` | [`CallArg::Vector`], expanded into several arguments |
//! | `!` | no argument; replicate the call if it modified the dataset |

use crate::error::{Error, Result};
use crate::string::ModuleString;

/// One positional argument of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    /// Module string (`s`)
    String(ModuleString),
    /// Literal bytes (`c` or `b`)
    Buffer(Vec<u8>),
    /// Integer literal (`l`)
    Integer(i64),
    /// Several module strings spliced in place (`v`)
    Vector(Vec<ModuleString>),
}

impl CallArg {
    fn code_matches(&self, code: char) -> bool {
        matches!(
            (code, self),
            ('s', CallArg::String(_))
                | ('c', CallArg::Buffer(_))
                | ('b', CallArg::Buffer(_))
                | ('l', CallArg::Integer(_))
                | ('v', CallArg::Vector(_))
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            CallArg::String(_) => "string",
            CallArg::Buffer(_) => "buffer",
            CallArg::Integer(_) => "integer",
            CallArg::Vector(_) => "vector",
        }
    }

    fn push_into(&self, argv: &mut Vec<Vec<u8>>) {
        match self {
            CallArg::String(s) => argv.push(s.as_bytes().to_vec()),
            CallArg::Buffer(b) => argv.push(b.clone()),
            CallArg::Integer(i) => argv.push(i.to_string().into_bytes()),
            CallArg::Vector(items) => argv.extend(items.iter().map(|s| s.as_bytes().to_vec())),
        }
    }
}

impl From<&ModuleString> for CallArg {
    fn from(s: &ModuleString) -> Self {
        CallArg::String(s.clone())
    }
}

impl From<ModuleString> for CallArg {
    fn from(s: ModuleString) -> Self {
        CallArg::String(s)
    }
}

impl From<&str> for CallArg {
    fn from(s: &str) -> Self {
        CallArg::Buffer(s.as_bytes().to_vec())
    }
}

impl From<i64> for CallArg {
    fn from(i: i64) -> Self {
        CallArg::Integer(i)
    }
}

/// A command line ready to dispatch or propagate.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedCall {
    /// Command name followed by the serialized arguments
    pub argv: Vec<Vec<u8>>,
    /// Whether the `!` modifier was present
    pub replicate: bool,
}

/// Serialize `args` according to `format`, prefixing the command name.
///
/// Fails with `InvalidFormat` on an unknown code, a code whose argument has
/// a different kind, or a code/argument count mismatch.
pub fn pack(command: &str, format: &str, args: &[CallArg]) -> Result<PackedCall> {
    let mut argv = vec![command.as_bytes().to_vec()];
    let mut replicate = false;
    let mut remaining = args.iter();

    for code in format.chars() {
        match code {
            '!' => replicate = true,
            's' | 'c' | 'b' | 'l' | 'v' => {
                let arg = remaining.next().ok_or_else(|| {
                    Error::invalid_format(format!("format '{}' has more codes than arguments", format))
                })?;
                if !arg.code_matches(code) {
                    return Err(Error::invalid_format(format!(
                        "code '{}' does not accept a {} argument",
                        code,
                        arg.kind()
                    )));
                }
                arg.push_into(&mut argv);
            }
            other => {
                return Err(Error::invalid_format(format!("unknown format code '{}'", other)));
            }
        }
    }

    if remaining.next().is_some() {
        return Err(Error::invalid_format(format!(
            "format '{}' has fewer codes than arguments",
            format
        )));
    }

    Ok(PackedCall { argv, replicate })
}
