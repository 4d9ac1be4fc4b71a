// Integration test utilities: scripted commit histories over a toy language.
//
// Toy source files look like
//
//     fn main
//         call parse
//     end
//
// A function spans from its `fn` line to its `end` line; `call x` inside a
// function is a call site.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use devrank_core::config::DevRankConfig;
use devrank_core::graph::CallCommitGraph;
use devrank_core::pipeline::{ReplayStats, replay_history};
use devrank_core::server::{CallSite, CommitRef, FileChange, FileFilter, PatchGraphServer, SeekingMode};
use devrank_core::types::CommitInfo;
use devrank_diff::FunctionRange;
use similar::TextDiff;

// ── Toy extractor ────────────────────────────────────────────────

/// Function spans of a toy source file, in file order.
pub fn toy_functions(source: &str) -> Vec<FunctionRange> {
    let mut functions = Vec::new();
    let mut open: Option<(String, i64)> = None;
    for (line_no, line) in (1_i64..).zip(source.lines()) {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("fn ") {
            open = Some((name.trim().to_string(), line_no));
        } else if line == "end" {
            if let Some((name, start)) = open.take() {
                functions.push(FunctionRange::new(name, start, line_no));
            }
        }
    }
    functions
}

/// Call sites of a toy source file.
pub fn toy_calls(source: &str) -> Vec<CallSite> {
    let mut calls = Vec::new();
    let mut current: Option<&str> = None;
    for line in source.lines().map(str::trim) {
        if let Some(name) = line.strip_prefix("fn ") {
            current = Some(name.trim());
        } else if line == "end" {
            current = None;
        } else if let (Some(caller), Some(callee)) = (current, line.strip_prefix("call ")) {
            calls.push(CallSite {
                caller: caller.to_string(),
                callee: callee.trim().to_string(),
            });
        }
    }
    calls
}

/// Unified diff between two versions of a file, three lines of context.
pub fn unified_patch(path: &str, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

/// The change record an extractor would produce for one toy file.
///
/// `None` on either side means the file does not exist there.
pub fn toy_change(path: &str, old: Option<&str>, new: Option<&str>, with_sources: bool) -> FileChange {
    let old_text = old.unwrap_or_default();
    let new_text = new.unwrap_or_default();
    FileChange {
        old_path: old.map(|_| path.to_string()),
        new_path: new.map(|_| path.to_string()),
        patch: unified_patch(path, old_text, new_text),
        functions: toy_functions(old_text),
        new_functions: toy_functions(new_text),
        old_source: with_sources.then(|| old_text.to_string()),
        new_source: with_sources.then(|| new_text.to_string()),
        calls: toy_calls(new_text),
    }
}

// ── History builder ──────────────────────────────────────────────

/// Scripted history: each commit lists the files it rewrites.
#[derive(Debug, Default)]
pub struct HistoryBuilder {
    files: BTreeMap<String, String>,
    commits: Vec<CommitRef>,
    with_sources: bool,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach file contents to every change so logical units get counted.
    #[must_use]
    pub fn with_sources(mut self) -> Self {
        self.with_sources = true;
        self
    }

    /// A normal commit. Each edit is `(path, new contents)`; `None` deletes.
    #[must_use]
    pub fn commit(self, sha: &str, author: &str, edits: &[(&str, Option<&str>)]) -> Self {
        self.push(sha, author, SeekingMode::NormalForward, edits)
    }

    /// A merge commit: edges follow the edits, history does not.
    #[must_use]
    pub fn merge(self, sha: &str, author: &str, edits: &[(&str, Option<&str>)]) -> Self {
        self.push(sha, author, SeekingMode::MergeCommit, edits)
    }

    /// A step back to a parent; file contents stay as they are.
    #[must_use]
    pub fn rewind(mut self, sha: &str) -> Self {
        self.commits.push(CommitRef {
            info: CommitInfo::new(sha, "", "", ""),
            seeking_mode: SeekingMode::Rewind,
            changes: Vec::new(),
        });
        self
    }

    fn push(
        mut self,
        sha: &str,
        author: &str,
        seeking_mode: SeekingMode,
        edits: &[(&str, Option<&str>)],
    ) -> Self {
        let changes = edits
            .iter()
            .map(|&(path, new)| {
                let old = match new {
                    Some(text) => self.files.insert(path.to_string(), text.to_string()),
                    None => self.files.remove(path),
                };
                toy_change(path, old.as_deref(), new, self.with_sources)
            })
            .collect();
        self.commits.push(CommitRef {
            info: CommitInfo::new(sha, author, format!("{author}@example.org"), format!("commit {sha}")),
            seeking_mode,
            changes,
        });
        self
    }

    pub fn build(self) -> Vec<CommitRef> {
        self.commits
    }
}

// ── Replay helpers ───────────────────────────────────────────────

/// Replay `commits` from an empty graph with the default config's filter.
pub async fn replay(commits: &[CommitRef]) -> anyhow::Result<(CallCommitGraph, ReplayStats)> {
    let filter = FileFilter::from_section(&DevRankConfig::default().filter)?;
    let mut server = PatchGraphServer::new(filter);
    let stats = replay_history(&mut server, commits).await?;
    Ok((server.into_graph(), stats))
}

/// A scratch directory holding `history.json` for `commits`.
#[derive(Debug)]
pub struct HistoryFile {
    pub dir: tempfile::TempDir,
}

impl HistoryFile {
    pub fn write(commits: &[CommitRef]) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("history.json"), serde_json::to_string_pretty(commits)?)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("history.json")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

// ── Fixtures ─────────────────────────────────────────────────────

pub const APP_V1: &str = "\
fn main
    call parse
end
fn parse
    read
end
";

/// `check` prepended, `parse` now calls it.
pub const APP_V2: &str = "\
fn check
    ok
end
fn main
    call parse
end
fn parse
    read
    call check
end
";

/// One line of `check` rewritten.
pub const APP_V3: &str = "\
fn check
    fine
end
fn main
    call parse
end
fn parse
    read
    call check
end
";

/// Three commits by two authors over `src/app.c`.
pub fn three_commit_history() -> HistoryBuilder {
    HistoryBuilder::new()
        .commit("c1", "koala", &[("src/app.c", Some(APP_V1))])
        .commit("c2", "beaver", &[("src/app.c", Some(APP_V2))])
        .commit("c3", "koala", &[("src/app.c", Some(APP_V3))])
}
