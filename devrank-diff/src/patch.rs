// Unified-diff parsing: hunk headers into old-file intervals, and hunk bodies
// into the additions and deletions of a `FileDiff`.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Addition, FileDiff, LineRange};

static STRICT_HEADER: OnceLock<Regex> = OnceLock::new();
static LENIENT_HEADER: OnceLock<Regex> = OnceLock::new();

/// `@@ -a,b +c,d @@` with every count spelled out.
fn strict_header() -> &'static Regex {
    STRICT_HEADER.get_or_init(|| {
        Regex::new(r"@@\s*-(\d+),(\d+)\s*\+(\d+),(\d+)\s*@@").expect("static hunk header pattern")
    })
}

/// `@@ -a[,b] +c[,d] @@`, counts defaulting to 1 as git writes them.
fn lenient_header() -> &'static Regex {
    LENIENT_HEADER.get_or_init(|| {
        Regex::new(r"^@@\s*-(\d+)(?:,(\d+))?\s*\+(\d+)(?:,(\d+))?\s*@@")
            .expect("static hunk header pattern")
    })
}

// ── Hunk headers ───────────────────────────────────────────────────

/// One chunk header of a unified diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: i64,
    pub old_len: i64,
    pub new_start: i64,
    pub new_len: i64,
}

impl Hunk {
    /// The lines this hunk covers in the old file.
    pub const fn old_range(&self) -> LineRange {
        LineRange::new(
            self.old_start,
            self.old_start.saturating_add(self.old_len).saturating_sub(1),
        )
    }

    /// The lines this hunk covers in the new file.
    pub const fn new_range(&self) -> LineRange {
        LineRange::new(
            self.new_start,
            self.new_start.saturating_add(self.new_len).saturating_sub(1),
        )
    }

    /// `None` when a number does not fit, or when a side's end line (plus the
    /// one-past-the-end cursor) would overflow `i64`.
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let field = |i: usize, default: Option<i64>| match caps.get(i) {
            Some(m) => m.as_str().parse::<i64>().ok(),
            None => default,
        };
        let hunk = Self {
            old_start: field(1, None)?,
            old_len: field(2, Some(1))?,
            new_start: field(3, None)?,
            new_len: field(4, Some(1))?,
        };
        hunk.old_start.checked_add(hunk.old_len)?.checked_add(1)?;
        hunk.new_start.checked_add(hunk.new_len)?.checked_add(1)?;
        Some(hunk)
    }
}

/// Every hunk header in `text` whose four numbers are all present, in the
/// order they appear. Anything that does not match, or whose line numbers
/// overflow, is skipped.
pub fn parse_hunks(text: &str) -> Vec<Hunk> {
    strict_header()
        .captures_iter(text)
        .filter_map(|caps| Hunk::from_captures(&caps))
        .collect()
}

/// Old-file interval `[old_start, old_start + old_len - 1]` of every hunk.
///
/// No ordering or overlap check is done; a patch with out-of-order headers
/// yields out-of-order intervals.
pub fn parse_hunk_intervals(text: &str) -> Vec<LineRange> {
    parse_hunks(text).iter().map(Hunk::old_range).collect()
}

// ── Hunk bodies ────────────────────────────────────────────────────

/// Parse the body of a single-file unified diff into additions and deletions.
///
/// A run of `-` lines becomes one deleted interval. A run of `+` lines becomes
/// one addition anchored at the old line it follows; when it directly follows
/// a `-` run it is anchored at the last deleted line. Lines outside a hunk
/// (file headers, `diff --git`, trailing noise) and `\ No newline` markers
/// are ignored.
pub fn parse_patch(text: &str) -> FileDiff {
    let mut walker = PatchWalker::default();
    for line in text.lines() {
        walker.feed(line);
    }
    walker.finish()
}

#[derive(Debug, Default, Clone, Copy)]
enum Run {
    #[default]
    Idle,
    Adding {
        position: i64,
        length: i64,
    },
    Deleting {
        start: i64,
    },
}

#[derive(Debug, Default)]
struct PatchWalker {
    diff: FileDiff,
    run: Run,
    /// Next old-file line to be consumed.
    cursor: i64,
    old_remaining: i64,
    new_remaining: i64,
}

impl PatchWalker {
    fn in_hunk(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with("@@") {
            self.close_run();
            self.start_hunk(line);
            return;
        }
        if !self.in_hunk() {
            return;
        }

        match line.as_bytes().first() {
            Some(b'-') => {
                match self.run {
                    Run::Deleting { .. } => {}
                    Run::Adding { .. } | Run::Idle => {
                        self.close_run();
                        self.run = Run::Deleting { start: self.cursor };
                    }
                }
                self.cursor += 1;
                self.old_remaining -= 1;
            }
            Some(b'+') => {
                match self.run {
                    Run::Adding { position, length } => {
                        self.run = Run::Adding {
                            position,
                            length: length + 1,
                        };
                    }
                    Run::Deleting { .. } | Run::Idle => {
                        self.close_run();
                        self.run = Run::Adding {
                            position: self.cursor - 1,
                            length: 1,
                        };
                    }
                }
                self.new_remaining -= 1;
            }
            Some(b'\\') => {}
            _ => {
                self.close_run();
                self.cursor += 1;
                self.old_remaining -= 1;
                self.new_remaining -= 1;
            }
        }

        if !self.in_hunk() {
            self.close_run();
        }
    }

    fn start_hunk(&mut self, line: &str) {
        match lenient_header()
            .captures(line)
            .and_then(|caps| Hunk::from_captures(&caps))
        {
            Some(hunk) => {
                trace!(?hunk, "hunk header");
                // A zero-length old side names the line the insertion follows.
                self.cursor = if hunk.old_len == 0 {
                    hunk.old_start + 1
                } else {
                    hunk.old_start.max(1)
                };
                self.old_remaining = hunk.old_len;
                self.new_remaining = hunk.new_len;
            }
            None => {
                trace!(line, "unrecognised hunk header, skipping hunk");
                self.old_remaining = 0;
                self.new_remaining = 0;
            }
        }
    }

    fn close_run(&mut self) {
        match std::mem::take(&mut self.run) {
            Run::Idle => {}
            Run::Adding { position, length } => {
                self.diff.additions.push(Addition::new(position, length));
            }
            Run::Deleting { start } => {
                self.diff
                    .deletions
                    .push(LineRange::new(start, self.cursor - 1));
            }
        }
    }

    fn finish(mut self) -> FileDiff {
        self.close_run();
        self.diff
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
