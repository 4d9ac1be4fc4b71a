// Graph servers: build the call-commit graph commit by commit.

use std::collections::HashMap;

use async_trait::async_trait;
use devrank_diff::{
    ChangeStats, FileDiff, FunctionRange, SourceTexts, changed_function_stats, parse_patch,
    validate_function_ranges,
};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::FilterSection;
use crate::error::ConfigError;
use crate::graph::CallCommitGraph;
use crate::types::CommitInfo;

// ── Commit input ───────────────────────────────────────────────────

/// How the replay reached the current commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekingMode {
    /// Analyzing this commit: edges and history are updated.
    #[default]
    NormalForward,
    /// Analyzing a merge commit: edges are updated, history is not.
    MergeCommit,
    /// Stepping back to a parent before analyzing a child: nothing changes.
    Rewind,
}

impl SeekingMode {
    pub const fn updates_edges(self) -> bool {
        matches!(self, Self::NormalForward | Self::MergeCommit)
    }

    pub const fn updates_history(self) -> bool {
        matches!(self, Self::NormalForward)
    }
}

/// A call observed in the new version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: String,
    pub callee: String,
}

/// One file's change in a commit, with the structure an extractor already
/// pulled out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path before the commit; absent for a created file.
    #[serde(default)]
    pub old_path: Option<String>,
    /// Path after the commit; absent for a deleted file.
    #[serde(default)]
    pub new_path: Option<String>,
    /// Unified diff of this file.
    #[serde(default)]
    pub patch: String,
    /// Function spans in the old version, ascending.
    #[serde(default)]
    pub functions: Vec<FunctionRange>,
    /// Function spans in the new version, ascending.
    #[serde(default)]
    pub new_functions: Vec<FunctionRange>,
    #[serde(default)]
    pub old_source: Option<String>,
    #[serde(default)]
    pub new_source: Option<String>,
    #[serde(default)]
    pub calls: Vec<CallSite>,
}

impl FileChange {
    /// The path the file is known by after the commit.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }

    fn sources(&self) -> Option<SourceTexts<'_>> {
        Some(SourceTexts {
            old: self.old_source.as_deref()?,
            new: self.new_source.as_deref()?,
        })
    }

    fn reversed_sources(&self) -> Option<SourceTexts<'_>> {
        self.sources().map(|s| SourceTexts {
            old: s.new,
            new: s.old,
        })
    }
}

/// A commit to feed to a [`GraphServer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub info: CommitInfo,
    #[serde(default)]
    pub seeking_mode: SeekingMode,
    #[serde(default)]
    pub changes: Vec<FileChange>,
}

/// What one `update_graph` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitUpdate {
    pub files_applied: usize,
    pub files_skipped: usize,
    pub functions_touched: usize,
    pub edges_added: usize,
}

// ── Server trait ───────────────────────────────────────────────────

/// A source of call-commit graph updates.
///
/// Implementations decide where file structure comes from; callers only hand
/// over commits in replay order.
#[async_trait]
pub trait GraphServer: Send {
    /// Apply one commit to the graph.
    async fn update_graph(&mut self, commit: &CommitRef) -> crate::error::Result<CommitUpdate>;
}

// ── File filter ────────────────────────────────────────────────────

/// Glob include/exclude filter over repository-relative paths.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    /// A filter that accepts every path.
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn from_section(section: &FilterSection) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile(&section.include_patterns)?,
            exclude: compile(&section.exclude_patterns)?,
        })
    }

    /// Included (or no include patterns at all) and not excluded.
    pub fn matches(&self, path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(path));
        included && !self.exclude.iter().any(|p| p.matches(path))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| ConfigError::Invalid(format!("bad glob pattern {p:?}: {e}")))
        })
        .collect()
}

// ── Patch-fed server ───────────────────────────────────────────────

/// In-memory [`GraphServer`] fed with already-extracted patches, function
/// spans and call sites.
#[derive(Debug, Default)]
pub struct PatchGraphServer {
    graph: CallCommitGraph,
    filter: FileFilter,
}

impl PatchGraphServer {
    pub fn new(filter: FileFilter) -> Self {
        Self {
            graph: CallCommitGraph::new(),
            filter,
        }
    }

    /// Continue building on an existing graph.
    pub fn with_graph(graph: CallCommitGraph, filter: FileFilter) -> Self {
        Self { graph, filter }
    }

    pub fn graph(&self) -> &CallCommitGraph {
        &self.graph
    }

    pub fn into_graph(self) -> CallCommitGraph {
        self.graph
    }

    fn wanted(&self, change: &FileChange) -> bool {
        [change.old_path.as_deref(), change.new_path.as_deref()]
            .into_iter()
            .flatten()
            .any(|path| self.filter.matches(path))
    }

    fn apply_change(
        &mut self,
        change: &FileChange,
        mode: SeekingMode,
        update: &mut CommitUpdate,
    ) -> crate::error::Result<()> {
        let path = change.path().unwrap_or_default().to_string();
        let diff = parse_patch(&change.patch);
        diff.validate()?;
        validate_function_ranges(&change.functions)?;
        validate_function_ranges(&change.new_functions)?;

        for function in change.new_functions.iter().chain(&change.functions) {
            self.graph.add_node(&function.name, [path.as_str()]);
        }

        if mode.updates_history() {
            let stats = function_stats(change, &diff);
            update.functions_touched += stats.len();
            for (name, stats) in &stats {
                self.graph.update_node_history(name, stats)?;
            }
        }

        if mode.updates_edges() {
            for call in &change.calls {
                if !self.graph.contains(&call.caller) {
                    self.graph.add_node(&call.caller, [path.as_str()]);
                }
                if !self.graph.contains(&call.callee) {
                    self.graph.add_node(&call.callee, Vec::<String>::new());
                }
                self.graph.add_edge(&call.caller, &call.callee)?;
                update.edges_added += 1;
            }
        }

        trace!(
            path = %path,
            additions = diff.additions.len(),
            deletions = diff.deletions.len(),
            "Applied file change"
        );
        Ok(())
    }
}

/// Per-function stats of one file change.
///
/// Functions of the old version are attributed directly. Functions of the new
/// version are attributed through the inverse diff, whose deletions are the
/// added lines in new-file coordinates; those stats only fill in functions
/// the forward pass did not touch.
fn function_stats(change: &FileChange, diff: &FileDiff) -> HashMap<String, ChangeStats> {
    let mut stats = changed_function_stats(&change.functions, diff, change.sources());
    if change.new_functions.is_empty() {
        return stats;
    }

    let inverse = diff.inverse();
    let backward =
        changed_function_stats(&change.new_functions, &inverse, change.reversed_sources());
    for (name, reversed) in backward {
        stats.entry(name).or_insert(ChangeStats {
            adds: reversed.dels,
            dels: reversed.adds,
            added_units: reversed.removed_units,
            removed_units: reversed.added_units,
        });
    }
    stats
}

#[async_trait]
impl GraphServer for PatchGraphServer {
    async fn update_graph(&mut self, commit: &CommitRef) -> crate::error::Result<CommitUpdate> {
        let mut update = CommitUpdate::default();
        if commit.seeking_mode == SeekingMode::Rewind {
            debug!(commit = %commit.info.hexsha, "Rewind, graph untouched");
            return Ok(update);
        }

        self.graph.add_commit(commit.info.clone());
        for change in &commit.changes {
            if !self.wanted(change) {
                update.files_skipped += 1;
                continue;
            }
            self.apply_change(change, commit.seeking_mode, &mut update)?;
            update.files_applied += 1;
        }

        debug!(
            commit = %commit.info.hexsha,
            mode = ?commit.seeking_mode,
            files = update.files_applied,
            skipped = update.files_skipped,
            functions = update.functions_touched,
            "Updated graph"
        );
        Ok(update)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
