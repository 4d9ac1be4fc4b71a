// Function change attribution: map one commit's additions and deletions onto
// the functions of the pre-commit file.
//
// Counting intentionally casts usize → u64 (token counts).
#![allow(clippy::cast_possible_truncation, clippy::cast_lossless)]

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FileDiff, FunctionRange, LineRange};

/// Changed-line count per function for one commit.
pub type ChurnCount = HashMap<String, u64>;

// ── Change statistics ──────────────────────────────────────────────

/// What one commit did to one function.
///
/// `added_units`/`removed_units` are token counts of the touched lines; they
/// are absent when the source text was not available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub adds: u64,
    pub dels: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_units: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_units: Option<u64>,
}

impl ChangeStats {
    pub const fn lines(adds: u64, dels: u64) -> Self {
        Self {
            adds,
            dels,
            added_units: None,
            removed_units: None,
        }
    }

    pub const fn with_units(adds: u64, dels: u64, added_units: u64, removed_units: u64) -> Self {
        Self {
            adds,
            dels,
            added_units: Some(added_units),
            removed_units: Some(removed_units),
        }
    }

    /// Raw changed-line count.
    pub const fn line_churn(&self) -> u64 {
        self.adds + self.dels
    }

    /// Changed logical units, if both sides were measured.
    pub fn unit_churn(&self) -> Option<u64> {
        Some(self.added_units? + self.removed_units?)
    }

    pub const fn has_units(&self) -> bool {
        self.added_units.is_some() && self.removed_units.is_some()
    }

    /// Fold another record for the same function and commit into this one.
    pub fn merge(&mut self, other: &ChangeStats) {
        self.adds += other.adds;
        self.dels += other.dels;
        self.added_units = sum_optional(self.added_units, other.added_units);
        self.removed_units = sum_optional(self.removed_units, other.removed_units);
    }
}

fn sum_optional(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

// ── Two-pointer scan ───────────────────────────────────────────────

/// A piece of change attributed to a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// An insertion point inside the function; `index` is the addition's
    /// position in the diff.
    Added { index: usize, length: u64 },
    /// The part of a deleted interval that lies inside the function.
    Deleted { overlap: LineRange },
}

impl Contribution {
    pub fn lines(&self) -> u64 {
        match self {
            Self::Added { length, .. } => *length,
            Self::Deleted { overlap } => overlap.len(),
        }
    }
}

/// Scan position over a commit's additions and deletions, carried from one
/// function to the next.
///
/// Functions must be visited in ascending order of start line, and the diff
/// must satisfy [`FileDiff::validate`]. Under those preconditions every record
/// is looked at a bounded number of times over the whole pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    pub next_addition: usize,
    pub next_deletion: usize,
}

impl ScanCursor {
    /// Report every addition and deletion that falls inside `range`.
    ///
    /// An addition is a single point and belongs to at most one function, so
    /// the cursor moves past it once matched. It is inside when
    /// `start <= position < end`: lines inserted after a function's last line
    /// are not part of it. A deleted interval can straddle a function
    /// boundary, so the cursor stays on it for the next function.
    pub fn attribute(
        &mut self,
        range: LineRange,
        diff: &FileDiff,
        mut emit: impl FnMut(Contribution),
    ) {
        for (i, addition) in diff.additions.iter().enumerate().skip(self.next_addition) {
            if addition.position >= range.end {
                break;
            }
            // Points before this function cannot belong to any later one.
            self.next_addition = i + 1;
            if addition.position < range.start {
                continue;
            }
            let length = addition.lines();
            if length > 0 {
                emit(Contribution::Added { index: i, length });
            }
        }

        for (j, deletion) in diff.deletions.iter().enumerate().skip(self.next_deletion) {
            if deletion.start > range.end {
                break;
            }
            if deletion.end < range.start {
                self.next_deletion = j + 1;
                continue;
            }
            if let Some(overlap) = range.intersection(*deletion) {
                emit(Contribution::Deleted { overlap });
                self.next_deletion = j;
            }
        }
    }
}

/// Changed-line count of every function touched by `diff`.
///
/// `functions` describes the pre-commit file: sorted by start line and
/// non-overlapping. Functions the commit did not touch are absent.
pub fn changed_functions(functions: &[FunctionRange], diff: &FileDiff) -> ChurnCount {
    let mut churn = ChurnCount::new();
    let mut cursor = ScanCursor::default();
    for function in functions {
        cursor.attribute(function.range, diff, |contribution| {
            *churn.entry(function.name.clone()).or_insert(0) += contribution.lines();
        });
    }
    churn
}

// ── Logical units ──────────────────────────────────────────────────

/// Old and new text of the file a diff applies to.
#[derive(Debug, Clone, Copy)]
pub struct SourceTexts<'a> {
    pub old: &'a str,
    pub new: &'a str,
}

static WORD: OnceLock<Regex> = OnceLock::new();

fn word() -> &'static Regex {
    WORD.get_or_init(|| Regex::new(r"\w+").expect("static word pattern"))
}

/// Number of word tokens on the 1-based lines `range` of `lines`.
/// Lines past the end of the text count as empty.
pub fn count_units(lines: &[&str], range: LineRange) -> u64 {
    if range.is_empty() {
        return 0;
    }
    let first = usize::try_from(range.start.max(1) - 1).unwrap_or(usize::MAX);
    let last = usize::try_from(range.end.max(0))
        .unwrap_or(usize::MAX)
        .min(lines.len());
    lines.get(first..last).map_or(0, |slice| {
        slice
            .iter()
            .map(|line| word().find_iter(line).count() as u64)
            .sum()
    })
}

#[derive(Debug)]
struct UnitCounter<'a> {
    old_lines: Vec<&'a str>,
    new_lines: Vec<&'a str>,
    /// New-file span of each forward addition.
    added_spans: Vec<LineRange>,
}

impl<'a> UnitCounter<'a> {
    fn new(sources: SourceTexts<'a>, diff: &FileDiff) -> Self {
        Self {
            old_lines: sources.old.lines().collect(),
            new_lines: sources.new.lines().collect(),
            added_spans: diff.inverse().deletions,
        }
    }

    fn added(&self, index: usize) -> u64 {
        self.added_spans
            .get(index)
            .map_or(0, |span| count_units(&self.new_lines, *span))
    }

    fn removed(&self, overlap: LineRange) -> u64 {
        count_units(&self.old_lines, overlap)
    }
}

/// Like [`changed_functions`], keeping additions and deletions apart and, when
/// the file's old and new text is given, measuring them in logical units too.
pub fn changed_function_stats(
    functions: &[FunctionRange],
    diff: &FileDiff,
    sources: Option<SourceTexts<'_>>,
) -> HashMap<String, ChangeStats> {
    let units = sources.map(|s| UnitCounter::new(s, diff));
    let mut stats: HashMap<String, ChangeStats> = HashMap::new();
    let mut cursor = ScanCursor::default();

    for function in functions {
        cursor.attribute(function.range, diff, |contribution| {
            let entry = stats.entry(function.name.clone()).or_insert_with(|| {
                if units.is_some() {
                    ChangeStats::with_units(0, 0, 0, 0)
                } else {
                    ChangeStats::default()
                }
            });
            match contribution {
                Contribution::Added { index, length } => {
                    entry.adds += length;
                    if let (Some(counter), Some(total)) = (&units, entry.added_units.as_mut()) {
                        *total += counter.added(index);
                    }
                }
                Contribution::Deleted { overlap } => {
                    entry.dels += overlap.len();
                    if let (Some(counter), Some(total)) = (&units, entry.removed_units.as_mut()) {
                        *total += counter.removed(overlap);
                    }
                }
            }
        });
    }

    stats
}

// ── Tests ─────────────────────────────────────────────────────────────
