// Diff inversion: re-express one commit's change in the new file's coordinates,
// so history can be walked in the opposite direction.
//
// Inserted lines of the forward diff become deleted intervals of the inverse
// and vice versa; the total number of lines moved is conserved.

use crate::{Addition, FileDiff, LineRange};

impl FileDiff {
    /// The diff that turns the new version of the file back into the old one.
    pub fn inverse(&self) -> FileDiff {
        inverse_diff(&self.additions, &self.deletions)
    }
}

/// Invert a forward diff given as sorted additions and sorted, disjoint
/// deletions in old-file coordinates.
///
/// Both sequences are merged by position; an addition goes first only when it
/// sits strictly before the next deletion's start. A running `shift` tracks
/// how far new-file line numbers have drifted from old-file ones:
///
/// * addition `(p, n)` becomes deletion `[shift + p + 1, shift + p + n]`, then `shift += n`;
/// * deletion `[s, e]` becomes addition `(shift + s - 1, e - s + 1)`, then `shift -= e - s + 1`.
///
/// The i-th deletion of the result is therefore where the i-th forward
/// addition landed in the new file.
pub fn inverse_diff(additions: &[Addition], deletions: &[LineRange]) -> FileDiff {
    let mut inverse = FileDiff {
        additions: Vec::with_capacity(deletions.len()),
        deletions: Vec::with_capacity(additions.len()),
    };
    let mut shift = 0_i64;
    let mut adds = additions.iter().peekable();
    let mut dels = deletions.iter().peekable();

    loop {
        let addition_first = match (adds.peek(), dels.peek()) {
            (Some(a), Some(d)) => a.position < d.start,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        if addition_first {
            let Some(a) = adds.next() else { break };
            inverse.deletions.push(LineRange::new(
                shift + a.position + 1,
                shift + a.position + a.length,
            ));
            shift += a.length;
        } else {
            let Some(d) = dels.next() else { break };
            let removed = d.end - d.start + 1;
            inverse
                .additions
                .push(Addition::new(shift + d.start - 1, removed));
            shift -= removed;
        }
    }

    inverse
}

// ── Tests ─────────────────────────────────────────────────────────────
