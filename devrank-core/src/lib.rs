//! devrank core library: call-commit graph, analyzers, and history replay.
//!
//! A [`graph::CallCommitGraph`] is built commit by commit through a
//! [`server::GraphServer`] (see [`pipeline::replay_history`]); the analyzers
//! in [`analyze`] then turn it into a complexity figure and per-function,
//! per-commit and per-developer rankings.

pub mod analyze;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod pipeline;
pub mod score;
pub mod server;
pub mod types;
