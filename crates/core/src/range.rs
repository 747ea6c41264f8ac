//! Sorted set ranges by score, lex order and rank.
//!
//! A [`ZsetRange`] selects a contiguous run of sorted set members, either by
//! score interval, by lexicographic member interval, or by rank. Every kind
//! supports unbounded ends: `Bound::Unbounded` stands for -inf/+inf on scores,
//! [`LexBound::Min`]/[`LexBound::Max`] for `-`/`+` on members, and
//! `end: None` for the absolute last rank.

use std::ops::Bound;

use crate::error::{Error, Result};
use crate::string::parse_f64;

/// Range over the members of a sorted set.
#[derive(Debug, Clone, PartialEq)]
pub enum ZsetRange {
    /// Members whose score falls in the interval
    Score {
        /// Lower end
        min: Bound<f64>,
        /// Upper end
        max: Bound<f64>,
    },
    /// Members whose bytes fall in the interval. Meaningful when all members
    /// share one score, as with the host's lexicographic commands.
    Lex {
        /// Lower end
        min: LexBound,
        /// Upper end
        max: LexBound,
    },
    /// Members by zero-based rank, both ends inclusive
    Position {
        /// First rank
        start: usize,
        /// Last rank, `None` for the last member
        end: Option<usize>,
    },
}

/// One end of a lexicographic interval.
///
/// `Min` sorts before every member and `Max` after every member, whichever
/// end of the interval they appear on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound {
    /// `-`
    Min,
    /// `+`
    Max,
    /// `[member`
    Included(Vec<u8>),
    /// `(member`
    Excluded(Vec<u8>),
}

impl ZsetRange {
    /// Every member, in score order.
    pub fn all() -> Self {
        ZsetRange::Score {
            min: Bound::Unbounded,
            max: Bound::Unbounded,
        }
    }

    /// Closed score interval `[min, max]`.
    pub fn score_inclusive(min: f64, max: f64) -> Self {
        ZsetRange::Score {
            min: Bound::Included(min),
            max: Bound::Included(max),
        }
    }

    /// Score interval from the host's textual syntax, e.g. `("(1", "+inf")`.
    pub fn parse_score(min: &[u8], max: &[u8]) -> Result<Self> {
        Ok(ZsetRange::Score {
            min: parse_score_bound(min)?,
            max: parse_score_bound(max)?,
        })
    }

    /// Lex interval from the host's textual syntax, e.g. `("[a", "+")`.
    pub fn parse_lex(min: &[u8], max: &[u8]) -> Result<Self> {
        Ok(ZsetRange::Lex {
            min: parse_lex_bound(min)?,
            max: parse_lex_bound(max)?,
        })
    }

    /// True if the range can select nothing regardless of contents.
    pub fn is_empty(&self) -> bool {
        match self {
            ZsetRange::Score { min, max } => {
                let (lo, lo_ex) = score_end(min, f64::NEG_INFINITY);
                let (hi, hi_ex) = score_end(max, f64::INFINITY);
                lo > hi || (lo == hi && (lo_ex || hi_ex))
            }
            ZsetRange::Lex { min, max } => match (min, max) {
                (LexBound::Max, _) | (_, LexBound::Min) => true,
                (LexBound::Min, _) | (_, LexBound::Max) => false,
                (LexBound::Included(a), LexBound::Included(b)) => a > b,
                (LexBound::Included(a), LexBound::Excluded(b))
                | (LexBound::Excluded(a), LexBound::Included(b))
                | (LexBound::Excluded(a), LexBound::Excluded(b)) => a >= b,
            },
            ZsetRange::Position { start, end } => matches!(end, Some(end) if end < start),
        }
    }
}

fn score_end(bound: &Bound<f64>, unbounded: f64) -> (f64, bool) {
    match bound {
        Bound::Included(v) => (*v, false),
        Bound::Excluded(v) => (*v, true),
        Bound::Unbounded => (unbounded, false),
    }
}

/// True if `score` is not below the lower bound.
pub fn score_above_min(score: f64, min: &Bound<f64>) -> bool {
    match min {
        Bound::Included(v) => score >= *v,
        Bound::Excluded(v) => score > *v,
        Bound::Unbounded => true,
    }
}

/// True if `score` is not beyond the upper bound.
pub fn score_below_max(score: f64, max: &Bound<f64>) -> bool {
    match max {
        Bound::Included(v) => score <= *v,
        Bound::Excluded(v) => score < *v,
        Bound::Unbounded => true,
    }
}

/// True if `member` is not below the lower bound.
pub fn lex_above_min(member: &[u8], min: &LexBound) -> bool {
    match min {
        LexBound::Min => true,
        LexBound::Max => false,
        LexBound::Included(v) => member >= v.as_slice(),
        LexBound::Excluded(v) => member > v.as_slice(),
    }
}

/// True if `member` is not beyond the upper bound.
pub fn lex_below_max(member: &[u8], max: &LexBound) -> bool {
    match max {
        LexBound::Min => false,
        LexBound::Max => true,
        LexBound::Included(v) => member <= v.as_slice(),
        LexBound::Excluded(v) => member < v.as_slice(),
    }
}

fn parse_score_bound(text: &[u8]) -> Result<Bound<f64>> {
    let (exclusive, number) = match text.split_first() {
        Some((b'(', rest)) => (true, rest),
        _ => (false, text),
    };
    let value = parse_f64(number).ok_or_else(|| Error::invalid_value("min or max is not a float"))?;
    Ok(if exclusive {
        Bound::Excluded(value)
    } else {
        Bound::Included(value)
    })
}

fn parse_lex_bound(text: &[u8]) -> Result<LexBound> {
    match text.split_first() {
        Some((b'-', [])) => Ok(LexBound::Min),
        Some((b'+', [])) => Ok(LexBound::Max),
        Some((b'[', rest)) => Ok(LexBound::Included(rest.to_vec())),
        Some((b'(', rest)) => Ok(LexBound::Excluded(rest.to_vec())),
        _ => Err(Error::invalid_value("min or max not valid string range item")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score_exclusive_prefix() {
        let range = ZsetRange::parse_score(b"(1", b"2").unwrap();
        assert_eq!(
            range,
            ZsetRange::Score {
                min: Bound::Excluded(1.0),
                max: Bound::Included(2.0),
            }
        );
    }

    #[test]
    fn test_parse_score_infinities() {
        let range = ZsetRange::parse_score(b"-inf", b"+inf").unwrap();
        assert_eq!(
            range,
            ZsetRange::Score {
                min: Bound::Included(f64::NEG_INFINITY),
                max: Bound::Included(f64::INFINITY),
            }
        );
        assert!(!range.is_empty());
        assert!(ZsetRange::parse_score(b"+inf", b"-inf").unwrap().is_empty());
    }

    #[test]
    fn test_parse_score_rejects_garbage() {
        assert!(ZsetRange::parse_score(b"abc", b"1").is_err());
        assert!(ZsetRange::parse_score(b"(", b"1").is_err());
    }

    #[test]
    fn test_parse_lex() {
        let range = ZsetRange::parse_lex(b"[a", b"+").unwrap();
        assert_eq!(
            range,
            ZsetRange::Lex {
                min: LexBound::Included(b"a".to_vec()),
                max: LexBound::Max,
            }
        );
        assert_eq!(
            ZsetRange::parse_lex(b"+", b"-").unwrap(),
            ZsetRange::Lex {
                min: LexBound::Max,
                max: LexBound::Min,
            }
        );
        assert!(ZsetRange::parse_lex(b"a", b"+").is_err());
    }

    #[test]
    fn test_empty_ranges() {
        assert!(ZsetRange::score_inclusive(3.0, 1.0).is_empty());
        assert!(ZsetRange::parse_score(b"(1", b"1").unwrap().is_empty());
        assert!(!ZsetRange::score_inclusive(1.0, 1.0).is_empty());
        assert!(ZsetRange::Position { start: 3, end: Some(1) }.is_empty());
        assert!(!ZsetRange::Position { start: 0, end: None }.is_empty());
        assert!(!ZsetRange::parse_lex(b"-", b"+").unwrap().is_empty());
        assert!(ZsetRange::parse_lex(b"+", b"-").unwrap().is_empty());
        assert!(ZsetRange::parse_lex(b"+", b"+").unwrap().is_empty());
        assert!(ZsetRange::parse_lex(b"[a", b"-").unwrap().is_empty());
        assert!(!ZsetRange::parse_lex(b"-", b"[a").unwrap().is_empty());
    }

    #[test]
    fn test_bound_predicates() {
        assert!(score_above_min(1.0, &Bound::Included(1.0)));
        assert!(!score_above_min(1.0, &Bound::Excluded(1.0)));
        assert!(score_below_max(2.0, &Bound::Included(2.0)));
        assert!(!score_below_max(2.0, &Bound::Excluded(2.0)));
        assert!(lex_above_min(b"b", &LexBound::Excluded(b"a".to_vec())));
        assert!(!lex_below_max(b"c", &LexBound::Included(b"b".to_vec())));
        assert!(!lex_above_min(b"z", &LexBound::Max));
        assert!(!lex_below_max(b"", &LexBound::Min));
    }
}
