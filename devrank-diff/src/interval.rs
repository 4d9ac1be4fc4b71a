// Closed line intervals and their intersection length.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed range `[start, end]` of 1-based line numbers in one file version.
///
/// A range with `start > end` is empty: it has length zero and intersects
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: i64,
    pub end: i64,
}

impl LineRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub const fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of lines covered.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let span = i128::from(self.end) - i128::from(self.start) + 1;
        u64::try_from(span).unwrap_or(u64::MAX)
    }

    pub const fn contains(&self, line: i64) -> bool {
        self.start <= line && line <= self.end
    }

    /// The common part of two ranges, or `None` when they are disjoint.
    pub fn intersection(&self, other: LineRange) -> Option<LineRange> {
        let overlap = LineRange::new(self.start.max(other.start), self.end.min(other.end));
        (!overlap.is_empty()).then_some(overlap)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Number of lines shared by two closed ranges.
pub fn intersect_length(a: LineRange, b: LineRange) -> u64 {
    a.intersection(b).map_or(0, |overlap| overlap.len())
}

// ── Tests ─────────────────────────────────────────────────────────────
