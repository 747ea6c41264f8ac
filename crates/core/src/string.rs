//! Binary-safe strings passed to and created by modules.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// Binary-safe string value.
///
/// Command arguments arrive as `ModuleString`s and modules create new ones
/// for list elements, call arguments and replies. Ownership is ordinary Rust
/// ownership: a string is released when it is dropped.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ModuleString(Vec<u8>);

impl ModuleString {
    /// Create a string from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        ModuleString(bytes.into())
    }

    /// Create the decimal representation of an integer.
    pub fn from_i64(value: i64) -> Self {
        ModuleString(value.to_string().into_bytes())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the string, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lossy UTF-8 view, for logging and messages.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Parse as a signed 64-bit integer.
    ///
    /// Accepts only the canonical decimal form: no whitespace, no leading
    /// `+`, no leading zeros.
    pub fn parse_i64(&self) -> Result<i64> {
        parse_i64(&self.0).ok_or_else(|| Error::invalid_value("value is not an integer or out of range"))
    }

    /// Parse as a double. Accepts `inf`, `+inf`, `-inf`; rejects NaN.
    pub fn parse_f64(&self) -> Result<f64> {
        parse_f64(&self.0).ok_or_else(|| Error::invalid_value("value is not a valid float"))
    }
}

/// Strict integer parsing shared by the host and modules.
pub fn parse_i64(bytes: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if text == "-0" {
        return None;
    }
    text.parse().ok()
}

/// Double parsing shared by the host and modules.
pub fn parse_f64(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?;
    if text.is_empty() || text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        return None;
    }
    let value = match text.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => f64::INFINITY,
        "-inf" | "-infinity" => f64::NEG_INFINITY,
        _ => text.parse::<f64>().ok()?,
    };
    if value.is_nan() {
        return None;
    }
    Some(value)
}

/// Render a double the way the host replies with it.
///
/// The shortest text that parses back to the same value. Very large and very
/// small magnitudes switch to exponent form, e.g. `1e300`.
pub fn format_f64(value: f64) -> String {
    let magnitude = value.abs();
    if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if magnitude >= 1e17 || (magnitude != 0.0 && magnitude < 1e-4) {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

impl Deref for ModuleString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ModuleString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for ModuleString {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ModuleString {
    fn from(s: &str) -> Self {
        ModuleString(s.as_bytes().to_vec())
    }
}

impl From<String> for ModuleString {
    fn from(s: String) -> Self {
        ModuleString(s.into_bytes())
    }
}

impl From<&[u8]> for ModuleString {
    fn from(b: &[u8]) -> Self {
        ModuleString(b.to_vec())
    }
}

impl From<Vec<u8>> for ModuleString {
    fn from(b: Vec<u8>) -> Self {
        ModuleString(b)
    }
}

impl fmt::Debug for ModuleString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for ModuleString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}
