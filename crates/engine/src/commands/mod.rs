//! Built-in commands.
//!
//! Each submodule implements one family of commands against the keyspace:
//!
//! | Module | Commands |
//! |--------|----------|
//! | `server` | PING ECHO SELECT DBSIZE FLUSHDB |
//! | `keys` | DEL EXISTS TYPE PEXPIRE PTTL PERSIST |
//! | `string` | GET SET INCR INCRBY DECR APPEND STRLEN |
//! | `list` | LPUSH RPUSH LPOP RPOP LLEN LRANGE |
//! | `hash` | HSET HGET |
//! | `set` | SADD SCARD |
//! | `zset` | ZADD ZSCORE ZCARD ZREM |
//!
//! Arity follows the usual convention: a positive arity is the exact
//! argument count including the command name, a negative one the minimum.

mod hash;
mod keys;
mod list;
mod server;
mod set;
mod string;
mod zset;

use ember_core::{parse_f64, parse_i64, Error, Frame, Result};
use ember_storage::Keyspace;

/// State a built-in command runs against.
pub(crate) struct BuiltinCtx<'a> {
    pub ks: &'a mut Keyspace,
    pub db: &'a mut usize,
    pub argv: &'a [Vec<u8>],
}

pub(crate) type BuiltinFn = fn(&mut BuiltinCtx<'_>) -> Result<Frame>;

/// A host command.
pub(crate) struct Builtin {
    pub name: &'static str,
    pub arity: i32,
    /// Propagated when it changes the dataset
    pub write: bool,
    pub handler: BuiltinFn,
}

impl Builtin {
    pub(crate) fn arity_ok(&self, argc: usize) -> bool {
        if self.arity >= 0 {
            argc == self.arity as usize
        } else {
            argc >= self.arity.unsigned_abs() as usize
        }
    }
}

macro_rules! builtin {
    ($name:literal, $arity:expr, $write:expr, $handler:path) => {
        Builtin {
            name: $name,
            arity: $arity,
            write: $write,
            handler: $handler,
        }
    };
}

pub(crate) static BUILTINS: &[Builtin] = &[
    builtin!("ping", -1, false, server::ping),
    builtin!("echo", 2, false, server::echo),
    builtin!("select", 2, false, server::select),
    builtin!("dbsize", 1, false, server::dbsize),
    builtin!("flushdb", 1, true, server::flushdb),
    builtin!("del", -2, true, keys::del),
    builtin!("exists", -2, false, keys::exists),
    builtin!("type", 2, false, keys::key_type),
    builtin!("pexpire", 3, true, keys::pexpire),
    builtin!("pttl", 2, false, keys::pttl),
    builtin!("persist", 2, true, keys::persist),
    builtin!("get", 2, false, string::get),
    builtin!("set", 3, true, string::set),
    builtin!("incr", 2, true, string::incr),
    builtin!("incrby", 3, true, string::incrby),
    builtin!("decr", 2, true, string::decr),
    builtin!("append", 3, true, string::append),
    builtin!("strlen", 2, false, string::strlen),
    builtin!("lpush", -3, true, list::lpush),
    builtin!("rpush", -3, true, list::rpush),
    builtin!("lpop", 2, true, list::lpop),
    builtin!("rpop", 2, true, list::rpop),
    builtin!("llen", 2, false, list::llen),
    builtin!("lrange", 4, false, list::lrange),
    builtin!("hset", -4, true, hash::hset),
    builtin!("hget", 3, false, hash::hget),
    builtin!("sadd", -3, true, set::sadd),
    builtin!("scard", 2, false, set::scard),
    builtin!("zadd", -4, true, zset::zadd),
    builtin!("zscore", 3, false, zset::zscore),
    builtin!("zcard", 2, false, zset::zcard),
    builtin!("zrem", -3, true, zset::zrem),
];

// =============================================================================
// Argument helpers
// =============================================================================

pub(crate) fn int_arg(arg: &[u8]) -> Result<i64> {
    parse_i64(arg).ok_or_else(|| Error::invalid_value("value is not an integer or out of range"))
}

pub(crate) fn float_arg(arg: &[u8]) -> Result<f64> {
    parse_f64(arg).ok_or_else(|| Error::invalid_value("value is not a valid float"))
}

pub(crate) fn ok() -> Frame {
    Frame::Simple("OK".to_string())
}

pub(crate) fn count(n: usize) -> Frame {
    Frame::Integer(n as i64)
}

pub(crate) fn wrong_arity(name: &str) -> Frame {
    Frame::Error(format!("ERR wrong number of arguments for '{}' command", name))
}
