// Call-commit graph: functions, their call edges, and per-commit edit history.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::types::{Blacklist, ChangeStats, CommitId, CommitInfo, NodeHistory, entry_dev_eq};

/// A function tracked across history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    #[serde(default)]
    pub files: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub history: NodeHistory,
}

impl FunctionNode {
    fn new(name: String) -> Self {
        Self {
            name,
            files: BTreeSet::new(),
            history: NodeHistory::new(),
        }
    }
}

/// A call from one function to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Commit that was current when the edge was (last) added.
    pub added_by: Option<CommitId>,
}

/// Stores every function's call relationships and edit history across
/// commits.
///
/// Nodes keep insertion order; commits keep registration order.
#[derive(Debug, Clone, Default)]
pub struct CallCommitGraph {
    graph: DiGraph<FunctionNode, CallEdge>,
    index: HashMap<String, NodeIndex>,
    commits: Vec<CommitInfo>,
    current: Option<CommitId>,
}

impl CallCommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Commits ────────────────────────────────────────────────────

    /// Register a commit and make it current. Re-registering a hexsha
    /// replaces its metadata in place.
    pub fn add_commit(&mut self, info: CommitInfo) {
        let id = info.hexsha.clone();
        match self.commits.iter_mut().find(|c| c.hexsha == id) {
            Some(existing) => *existing = info,
            None => self.commits.push(info),
        }
        self.current = Some(id);
    }

    pub fn current_commit(&self) -> Option<&CommitId> {
        self.current.as_ref()
    }

    pub fn commits(&self) -> &[CommitInfo] {
        &self.commits
    }

    pub fn commit(&self, id: &CommitId) -> Option<&CommitInfo> {
        self.commits.iter().find(|c| &c.hexsha == id)
    }

    // ── Nodes and edges ────────────────────────────────────────────

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a function node, or merge `files` into it if it already exists.
    pub fn add_node<I, S>(&mut self, name: &str, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idx = self.intern(name);
        self.graph[idx].files.extend(files.into_iter().map(Into::into));
    }

    fn intern(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(FunctionNode::new(name.to_string()));
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    pub fn node(&self, name: &str) -> Option<&FunctionNode> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.graph.node_weights()
    }

    /// `(caller, callee, edge)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &CallEdge)> {
        self.graph.edge_indices().filter_map(move |e| {
            let (src, tgt) = self.graph.edge_endpoints(e)?;
            Some((
                self.graph[src].name.as_str(),
                self.graph[tgt].name.as_str(),
                &self.graph[e],
            ))
        })
    }

    /// The underlying petgraph, for the rank computations.
    pub fn digraph(&self) -> &DiGraph<FunctionNode, CallEdge> {
        &self.graph
    }

    /// Add a call edge. Both ends must already exist; adding an existing
    /// edge again only re-stamps it with the current commit.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        let src = self.lookup(source)?;
        let tgt = self.lookup(target)?;
        let edge = CallEdge {
            added_by: self.current.clone(),
        };
        self.graph.update_edge(src, tgt, edge);
        Ok(())
    }

    pub fn files(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.node(name).map(|n| &n.files)
    }

    /// Replace a node's file set.
    pub fn update_node_files<I, S>(&mut self, name: &str, files: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idx = self.lookup(name)?;
        self.graph[idx].files = files.into_iter().map(Into::into).collect();
        Ok(())
    }

    // ── History ────────────────────────────────────────────────────

    /// Record what the current commit did to `name`. A second update from the
    /// same commit sums into the existing entry.
    pub fn update_node_history(&mut self, name: &str, stats: &ChangeStats) -> Result<(), GraphError> {
        let commit = self.current.clone().ok_or(GraphError::NoCurrentCommit)?;
        let idx = self.lookup(name)?;
        self.graph[idx]
            .history
            .entry(commit)
            .and_modify(|entry| entry.merge(stats))
            .or_insert(*stats);
        Ok(())
    }

    /// Dev-eq of each non-blacklisted commit in `name`'s history.
    /// Functions without history (built-ins, dependencies) give an empty map.
    pub fn node_commits_dev_eq(
        &self,
        name: &str,
        blacklist: &Blacklist,
    ) -> Result<BTreeMap<CommitId, u64>, GraphError> {
        let idx = self.lookup(name)?;
        Ok(commits_dev_eq_of(&self.graph[idx], blacklist))
    }

    /// Total dev-eq of a node, floored at 1 so it can be used as a divisor.
    pub fn node_dev_eq(&self, name: &str, blacklist: &Blacklist) -> Result<u64, GraphError> {
        let idx = self.lookup(name)?;
        Ok(node_dev_eq_of(&self.graph[idx], blacklist))
    }

    /// Overall dev-eq of every registered commit. Commits with no recorded
    /// change, or blacklisted ones, are present with 0.
    pub fn commits_dev_eq(&self, blacklist: &Blacklist) -> BTreeMap<CommitId, u64> {
        let mut totals: BTreeMap<CommitId, u64> = self
            .commits
            .iter()
            .map(|c| (c.hexsha.clone(), 0))
            .collect();
        for node in self.nodes() {
            for (commit, dev_eq) in commits_dev_eq_of(node, blacklist) {
                *totals.entry(commit).or_insert(0) += dev_eq;
            }
        }
        totals
    }

    // ── Serialization ──────────────────────────────────────────────

    pub fn to_data(&self) -> GraphData {
        GraphData {
            commits: self.commits.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|(source, target, edge)| EdgeData {
                    source: source.to_string(),
                    target: target.to_string(),
                    added_by: edge.added_by.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a graph from node-link data. No commit is current afterwards.
    pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for info in data.commits {
            graph.add_commit(info);
        }
        graph.current = None;

        for node in data.nodes {
            if let Some(commit) = node.history.keys().find(|c| graph.commit(c).is_none()) {
                return Err(GraphError::UnknownCommit(commit.clone()));
            }
            let idx = graph.intern(&node.name);
            let existing = &mut graph.graph[idx];
            existing.files.extend(node.files);
            for (commit, stats) in node.history {
                existing
                    .history
                    .entry(commit)
                    .and_modify(|entry| entry.merge(&stats))
                    .or_insert(stats);
            }
        }

        for edge in data.edges {
            if let Some(commit) = edge.added_by.as_ref() {
                if graph.commit(commit).is_none() {
                    return Err(GraphError::UnknownCommit(commit.clone()));
                }
            }
            let src = graph.lookup(&edge.source)?;
            let tgt = graph.lookup(&edge.target)?;
            graph.graph.update_edge(
                src,
                tgt,
                CallEdge {
                    added_by: edge.added_by,
                },
            );
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            commits = graph.commits.len(),
            "Loaded call-commit graph"
        );
        Ok(graph)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }

    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        let data: GraphData = serde_json::from_str(text)?;
        Ok(Self::from_data(data)?)
    }
}

pub(crate) fn commits_dev_eq_of(node: &FunctionNode, blacklist: &Blacklist) -> BTreeMap<CommitId, u64> {
    node.history
        .iter()
        .filter(|(commit, _)| !blacklist.contains(*commit))
        .map(|(commit, stats)| (commit.clone(), entry_dev_eq(stats)))
        .collect()
}

pub(crate) fn node_dev_eq_of(node: &FunctionNode, blacklist: &Blacklist) -> u64 {
    commits_dev_eq_of(node, blacklist).values().sum::<u64>().max(1)
}

// ── Node-link form ─────────────────────────────────────────────────

/// Serializable form of a [`CallCommitGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub commits: Vec<CommitInfo>,
    #[serde(default)]
    pub nodes: Vec<FunctionNode>,
    #[serde(default)]
    pub edges: Vec<EdgeData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<CommitId>,
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, email: &str) -> CommitInfo {
        CommitInfo::new(sha, "dev", email, format!("commit {sha}"))
    }

    fn none() -> Blacklist {
        Blacklist::new()
    }

    #[test]
    fn add_node_is_idempotent_and_merges_files() {
        let mut g = CallCommitGraph::new();
        g.add_node("f", ["a.c"]);
        g.add_node("f", ["b.c"]);
        assert_eq!(g.node_count(), 1);
        let files: Vec<_> = g.files("f").unwrap().iter().cloned().collect();
        assert_eq!(files, vec!["a.c", "b.c"]);

        g.update_node_files("f", ["c.c"]).unwrap();
        assert_eq!(g.files("f").unwrap().len(), 1);
    }

    #[test]
    fn edge_requires_both_ends() {
        let mut g = CallCommitGraph::new();
        g.add_node("caller", Vec::<String>::new());
        assert_eq!(
            g.add_edge("caller", "callee"),
            Err(GraphError::UnknownNode("callee".into()))
        );
        assert_eq!(
            g.add_edge("ghost", "caller"),
            Err(GraphError::UnknownNode("ghost".into()))
        );
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_edges_collapse_and_restamp() {
        let mut g = CallCommitGraph::new();
        g.add_commit(commit("c1", "a@x"));
        g.add_node("f", ["f.c"]);
        g.add_node("g", ["f.c"]);
        g.add_edge("f", "g").unwrap();
        g.add_commit(commit("c2", "a@x"));
        g.add_edge("f", "g").unwrap();

        assert_eq!(g.edge_count(), 1);
        let (_, _, edge) = g.edges().next().unwrap();
        assert_eq!(edge.added_by, Some(CommitId::from("c2")));
    }

    #[test]
    fn history_needs_a_current_commit() {
        let mut g = CallCommitGraph::new();
        g.add_node("f", ["f.c"]);
        assert_eq!(
            g.update_node_history("f", &ChangeStats::lines(1, 0)),
            Err(GraphError::NoCurrentCommit)
        );
    }

    #[test]
    fn same_commit_updates_sum() {
        let mut g = CallCommitGraph::new();
        g.add_commit(commit("c1", "a@x"));
        g.add_node("f", ["f.c"]);
        g.update_node_history("f", &ChangeStats::lines(3, 1)).unwrap();
        g.update_node_history("f", &ChangeStats::lines(2, 2)).unwrap();

        let history = &g.node("f").unwrap().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[&CommitId::from("c1")], ChangeStats::lines(5, 3));
    }

    #[test]
    fn dev_eq_prefers_units_and_floors_at_one() {
        let mut g = CallCommitGraph::new();
        g.add_commit(commit("c1", "a@x"));
        g.add_node("f", ["f.c"]);
        g.add_node("builtin", Vec::<String>::new());
        g.update_node_history("f", &ChangeStats::with_units(3, 1, 10, 4))
            .unwrap();
        g.add_commit(commit("c2", "b@x"));
        g.update_node_history("f", &ChangeStats::lines(2, 0)).unwrap();

        let per_commit = g.node_commits_dev_eq("f", &none()).unwrap();
        assert_eq!(per_commit[&CommitId::from("c1")], 14);
        assert_eq!(per_commit[&CommitId::from("c2")], 2);
        assert_eq!(g.node_dev_eq("f", &none()).unwrap(), 16);

        assert!(g.node_commits_dev_eq("builtin", &none()).unwrap().is_empty());
        assert_eq!(g.node_dev_eq("builtin", &none()).unwrap(), 1);
        assert!(g.node_dev_eq("ghost", &none()).is_err());
    }

    #[test]
    fn commits_dev_eq_lists_every_commit() {
        let mut g = CallCommitGraph::new();
        g.add_commit(commit("c1", "a@x"));
        g.add_node("f", ["f.c"]);
        g.add_node("g", ["g.c"]);
        g.update_node_history("f", &ChangeStats::lines(4, 0)).unwrap();
        g.update_node_history("g", &ChangeStats::lines(0, 3)).unwrap();
        g.add_commit(commit("c2", "a@x"));
        g.add_commit(commit("c3", "a@x"));
        g.update_node_history("g", &ChangeStats::lines(1, 0)).unwrap();

        let totals = g.commits_dev_eq(&none());
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[&CommitId::from("c1")], 7);
        assert_eq!(totals[&CommitId::from("c2")], 0);
        assert_eq!(totals[&CommitId::from("c3")], 1);

        let blacklist: Blacklist = [CommitId::from("c1")].into_iter().collect();
        let filtered = g.commits_dev_eq(&blacklist);
        assert_eq!(filtered[&CommitId::from("c1")], 0);
        assert_eq!(filtered[&CommitId::from("c3")], 1);
    }

    #[test]
    fn re_adding_a_commit_replaces_metadata() {
        let mut g = CallCommitGraph::new();
        g.add_commit(commit("c1", "old@x"));
        g.add_commit(commit("c2", "b@x"));
        g.add_commit(commit("c1", "new@x"));
        assert_eq!(g.commits().len(), 2);
        assert_eq!(g.commits()[0].author_email, "new@x");
        assert_eq!(g.current_commit(), Some(&CommitId::from("c1")));
    }

    #[test]
    fn node_link_json_shape() {
        let mut g = CallCommitGraph::new();
        g.add_commit(CommitInfo::new("c1", "koala", "koala@example.org", "first"));
        g.add_node("f1", ["a.c"]);
        g.add_node("f2", ["b.c"]);
        g.update_node_history("f1", &ChangeStats::lines(3, 1)).unwrap();
        g.add_edge("f1", "f2").unwrap();

        insta::assert_json_snapshot!(g.to_data(), @r#"
        {
          "commits": [
            {
              "hexsha": "c1",
              "author_name": "koala",
              "author_email": "koala@example.org",
              "message": "first"
            }
          ],
          "nodes": [
            {
              "name": "f1",
              "files": [
                "a.c"
              ],
              "history": {
                "c1": {
                  "adds": 3,
                  "dels": 1
                }
              }
            },
            {
              "name": "f2",
              "files": [
                "b.c"
              ]
            }
          ],
          "edges": [
            {
              "source": "f1",
              "target": "f2",
              "added_by": "c1"
            }
          ]
        }
        "#);

        let restored = CallCommitGraph::from_json(&g.to_json().unwrap()).unwrap();
        assert_eq!(restored.to_data(), g.to_data());
        assert_eq!(restored.current_commit(), None);
    }

    #[test]
    fn from_data_rejects_dangling_references() {
        let data = GraphData {
            commits: vec![],
            nodes: vec![FunctionNode::new("f".into())],
            edges: vec![EdgeData {
                source: "f".into(),
                target: "g".into(),
                added_by: None,
            }],
        };
        assert_eq!(
            CallCommitGraph::from_data(data).unwrap_err(),
            GraphError::UnknownNode("g".into())
        );

        let mut node = FunctionNode::new("f".into());
        node.history.insert("c9".into(), ChangeStats::lines(1, 1));
        let data = GraphData {
            commits: vec![],
            nodes: vec![node],
            edges: vec![],
        };
        assert_eq!(
            CallCommitGraph::from_data(data).unwrap_err(),
            GraphError::UnknownCommit("c9".into())
        );
    }
}
