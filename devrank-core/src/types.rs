use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use devrank_diff::ChangeStats;

// ── Commit identity ────────────────────────────────────────────────

/// A commit's hexsha.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CommitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Metadata of a commit registered in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hexsha: CommitId,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Utc>>,
}

impl CommitInfo {
    pub fn new(
        hexsha: impl Into<CommitId>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hexsha: hexsha.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            message: message.into(),
            committed_at: None,
        }
    }
}

// ── History ────────────────────────────────────────────────────────

/// Per-commit change record of one function.
pub type NodeHistory = BTreeMap<CommitId, ChangeStats>;

/// Commits excluded from every dev-eq and complexity sum.
pub type Blacklist = HashSet<CommitId>;

/// Per-commit dev-eq: logical units when both sides were measured, else
/// changed lines.
pub fn entry_dev_eq(stats: &ChangeStats) -> u64 {
    stats.unit_churn().unwrap_or_else(|| stats.line_churn())
}
