//! Sorted set storage and range traversal
//!
//! Members are kept twice: a hash map for O(1) score lookup, and an ordered
//! set of `(score, member)` pairs for traversal. Equal scores order by member
//! bytes, which is what makes lexicographic ranges meaningful on sets whose
//! members share one score.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;

use ember_core::range::{lex_above_min, lex_below_max, score_above_min, score_below_max};
use ember_core::{Error, Result, ZaddMode, ZaddOutcome, ZsetRange};
use rustc_hash::FxHashMap;

const NAN_SCORE: &str = "resulting score is not a number (NaN)";

/// Score with a total order. NaN never gets stored.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Members ordered by score, then by member bytes.
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: FxHashMap<Vec<u8>, f64>,
    order: BTreeSet<(Score, Vec<u8>)>,
}

impl SortedSet {
    /// Create an empty sorted set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// True if there are no members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score of `member`
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Add or update `member` subject to `mode`.
    pub fn add(&mut self, member: &[u8], score: f64, mode: ZaddMode) -> Result<ZaddOutcome> {
        if score.is_nan() {
            return Err(Error::invalid_value(NAN_SCORE));
        }
        match (self.score(member), mode) {
            (Some(_), ZaddMode::Nx) | (None, ZaddMode::Xx) => Ok(ZaddOutcome::Nop),
            (Some(old), _) if old == score => Ok(ZaddOutcome::Nop),
            (Some(_), _) => {
                self.store(member, score);
                Ok(ZaddOutcome::Updated)
            }
            (None, _) => {
                self.store(member, score);
                Ok(ZaddOutcome::Added)
            }
        }
    }

    /// Add `delta` to the score of `member`, starting from 0 when absent.
    ///
    /// Returns the outcome and the new score, or `None` when `mode` prevented
    /// the update.
    pub fn incr(
        &mut self,
        member: &[u8],
        delta: f64,
        mode: ZaddMode,
    ) -> Result<(ZaddOutcome, Option<f64>)> {
        if delta.is_nan() {
            return Err(Error::invalid_value(NAN_SCORE));
        }
        let current = self.score(member);
        match (current, mode) {
            (Some(_), ZaddMode::Nx) | (None, ZaddMode::Xx) => return Ok((ZaddOutcome::Nop, None)),
            _ => {}
        }
        let updated = current.unwrap_or(0.0) + delta;
        if updated.is_nan() {
            return Err(Error::invalid_value(NAN_SCORE));
        }
        let outcome = match current {
            None => ZaddOutcome::Added,
            Some(old) if old == updated => ZaddOutcome::Nop,
            Some(_) => ZaddOutcome::Updated,
        };
        if outcome != ZaddOutcome::Nop {
            self.store(member, updated);
        }
        Ok((outcome, Some(updated)))
    }

    /// Remove `member`; returns whether it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.order.remove(&(Score(score), member.to_vec()));
                true
            }
            None => false,
        }
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], f64)> + '_ {
        self.order.iter().map(|(s, m)| (m.as_slice(), s.0))
    }

    fn store(&mut self, member: &[u8], score: f64) {
        // -0.0 and 0.0 must land on the same ordered position
        let score = score + 0.0;
        if let Some(old) = self.scores.insert(member.to_vec(), score) {
            self.order.remove(&(Score(old), member.to_vec()));
        }
        self.order.insert((Score(score), member.to_vec()));
    }

    // ---------------------------------------------------------------------
    // Range traversal
    // ---------------------------------------------------------------------

    /// Position a cursor on the first member of `range`.
    ///
    /// The cursor is past the end straight away if nothing matches.
    pub fn seek(&self, range: ZsetRange) -> RangeCursor {
        let first = if range.is_empty() {
            None
        } else {
            match &range {
                ZsetRange::Score { min, max } => {
                    let start = match min {
                        Bound::Included(v) | Bound::Excluded(v) => {
                            Bound::Included((Score(*v), Vec::new()))
                        }
                        Bound::Unbounded => Bound::Unbounded,
                    };
                    self.order
                        .range((start, Bound::Unbounded))
                        .find(|(s, _)| score_above_min(s.0, min))
                        .filter(|(s, _)| score_below_max(s.0, max))
                }
                ZsetRange::Lex { min, max } => self
                    .order
                    .iter()
                    .find(|(_, m)| lex_above_min(m, min))
                    .filter(|(_, m)| lex_below_max(m, max)),
                ZsetRange::Position { start, .. } => self.order.iter().nth(*start),
            }
        };
        let rank = match &range {
            ZsetRange::Position { start, .. } => *start,
            _ => 0,
        };
        RangeCursor {
            current: first.map(|(s, m)| (m.clone(), s.0)),
            range,
            rank,
        }
    }

    /// Move `cursor` to the next member of its range.
    ///
    /// Returns false, and leaves the cursor past the end, when the range is
    /// exhausted. A cursor never moves backwards.
    pub fn advance(&self, cursor: &mut RangeCursor) -> bool {
        let Some((member, score)) = cursor.current.take() else {
            return false;
        };
        let next_rank = cursor.rank + 1;
        let mut after = self
            .order
            .range((Bound::Excluded((Score(score), member)), Bound::Unbounded));
        let next = match &cursor.range {
            ZsetRange::Score { max, .. } => after.next().filter(|(s, _)| score_below_max(s.0, max)),
            ZsetRange::Lex { max, .. } => after.next().filter(|(_, m)| lex_below_max(m, max)),
            ZsetRange::Position { end, .. } => after
                .next()
                .filter(|_| end.map_or(true, |end| next_rank <= end)),
        };
        cursor.rank = next_rank;
        cursor.current = next.map(|(s, m)| (m.clone(), s.0));
        cursor.current.is_some()
    }
}

/// Single-pass iterator state over one range of a sorted set.
#[derive(Debug, Clone)]
pub struct RangeCursor {
    range: ZsetRange,
    current: Option<(Vec<u8>, f64)>,
    rank: usize,
}

impl RangeCursor {
    /// Range this cursor walks
    pub fn range(&self) -> &ZsetRange {
        &self.range
    }

    /// Member and score under the cursor, `None` once past the end
    pub fn current(&self) -> Option<(&[u8], f64)> {
        self.current.as_ref().map(|(m, s)| (m.as_slice(), *s))
    }

    /// True once the cursor has moved past its range
    pub fn end_reached(&self) -> bool {
        self.current.is_none()
    }
}
