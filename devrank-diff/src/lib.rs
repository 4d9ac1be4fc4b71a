// Line-interval diff engine.
//
// Everything here works on already-extracted line numbers: hunk headers and
// hunk bodies of a unified diff, the inverse of a per-file diff, and the
// attribution of changed lines to the functions that enclose them.

pub mod attribution;
pub mod interval;
pub mod inverse;
pub mod patch;

use serde::{Deserialize, Serialize};

pub use attribution::{
    ChangeStats, ChurnCount, Contribution, ScanCursor, SourceTexts, changed_function_stats,
    changed_functions, count_units,
};
pub use interval::{LineRange, intersect_length};
pub use inverse::inverse_diff;
pub use patch::{Hunk, parse_hunk_intervals, parse_hunks, parse_patch};

/// Error type for the diff engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("{what} #{index} starts at line {start}, before the previous one at line {previous}")]
    Unsorted {
        what: &'static str,
        index: usize,
        start: i64,
        previous: i64,
    },

    #[error("{what} #{index} {current} overlaps the previous one {previous}")]
    Overlapping {
        what: &'static str,
        index: usize,
        previous: LineRange,
        current: LineRange,
    },
}

pub type Result<T> = std::result::Result<T, DiffError>;

// ── Addition record ────────────────────────────────────────────────

/// A block of inserted lines, located in the old file's coordinate space.
///
/// `position` is the old-file line after which the block is inserted, so an
/// insertion at the very top of a file has position `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Addition {
    pub position: i64,
    pub length: i64,
}

impl Addition {
    pub const fn new(position: i64, length: i64) -> Self {
        Self { position, length }
    }

    /// Number of inserted lines, with negative lengths read as zero.
    pub fn lines(&self) -> u64 {
        u64::try_from(self.length).unwrap_or(0)
    }
}

// ── Per-file diff ──────────────────────────────────────────────────

/// The change one commit made to one file: insertion points plus deleted
/// intervals, both in old-file coordinates and sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub additions: Vec<Addition>,
    pub deletions: Vec<LineRange>,
}

impl FileDiff {
    pub fn new(additions: Vec<Addition>, deletions: Vec<LineRange>) -> Self {
        Self {
            additions,
            deletions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }

    /// Total number of inserted lines.
    pub fn added_lines(&self) -> u64 {
        self.additions.iter().map(Addition::lines).sum()
    }

    /// Total number of deleted lines.
    pub fn deleted_lines(&self) -> u64 {
        self.deletions.iter().map(LineRange::len).sum()
    }

    /// Check the ordering preconditions that attribution and inversion rely on.
    ///
    /// Additions must be sorted by position; deletions must be sorted and
    /// pairwise disjoint. Nothing is re-sorted: an out-of-order diff is a bug
    /// in whatever produced it.
    pub fn validate(&self) -> Result<()> {
        for (index, pair) in self.additions.windows(2).enumerate() {
            if pair[1].position < pair[0].position {
                return Err(DiffError::Unsorted {
                    what: "addition",
                    index: index + 1,
                    start: pair[1].position,
                    previous: pair[0].position,
                });
            }
        }
        check_disjoint("deletion", self.deletions.iter().copied())
    }
}

// ── Function ranges ────────────────────────────────────────────────

/// A function's line span in the pre-commit version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRange {
    pub name: String,
    pub range: LineRange,
}

impl FunctionRange {
    pub fn new(name: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            name: name.into(),
            range: LineRange::new(start, end),
        }
    }
}

/// Check that function ranges are sorted by start line and do not overlap.
pub fn validate_function_ranges(functions: &[FunctionRange]) -> Result<()> {
    check_disjoint("function range", functions.iter().map(|f| f.range))
}

fn check_disjoint(what: &'static str, ranges: impl Iterator<Item = LineRange>) -> Result<()> {
    let mut previous: Option<LineRange> = None;
    for (index, current) in ranges.enumerate() {
        if let Some(prev) = previous {
            if current.start < prev.start {
                return Err(DiffError::Unsorted {
                    what,
                    index,
                    start: current.start,
                    previous: prev.start,
                });
            }
            if current.start <= prev.end {
                return Err(DiffError::Overlapping {
                    what,
                    index,
                    previous: prev,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_sorted_diff() {
        let diff = FileDiff::new(
            vec![Addition::new(7, 31), Addition::new(27, 3)],
            vec![LineRange::new(32, 44), LineRange::new(56, 70)],
        );
        assert_eq!(diff.validate(), Ok(()));
        assert_eq!(diff.added_lines(), 34);
        assert_eq!(diff.deleted_lines(), 28);
    }

    #[test]
    fn validate_rejects_unsorted_additions() {
        let diff = FileDiff::new(vec![Addition::new(9, 1), Addition::new(3, 1)], vec![]);
        assert!(matches!(
            diff.validate(),
            Err(DiffError::Unsorted { index: 1, .. })
        ));
    }

    #[test]
    fn validate_rejects_overlapping_deletions() {
        let diff = FileDiff::new(vec![], vec![LineRange::new(1, 5), LineRange::new(5, 8)]);
        let err = diff.validate().unwrap_err();
        assert!(matches!(err, DiffError::Overlapping { .. }));
        assert_eq!(
            err.to_string(),
            "deletion #1 [5, 8] overlaps the previous one [1, 5]"
        );
    }

    #[test]
    fn function_ranges_must_partition() {
        let ok = vec![
            FunctionRange::new("a", 1, 4),
            FunctionRange::new("b", 6, 9),
        ];
        assert!(validate_function_ranges(&ok).is_ok());

        let unsorted = vec![
            FunctionRange::new("b", 6, 9),
            FunctionRange::new("a", 1, 4),
        ];
        assert!(matches!(
            validate_function_ranges(&unsorted),
            Err(DiffError::Unsorted { what: "function range", .. })
        ));
    }

    #[test]
    fn file_diff_json_shape() {
        let diff = FileDiff::new(vec![Addition::new(3, 2)], vec![LineRange::new(5, 6)]);
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "additions": [{"position": 3, "length": 2}],
                "deletions": [{"start": 5, "end": 6}],
            })
        );
    }
}
