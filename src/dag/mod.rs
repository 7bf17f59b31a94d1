// src/dag/mod.rs

//! Project dependency graph.
//!
//! - [`graph`] holds the interned project nodes, their CI configuration and
//!   the traversal orders the attributor and job deriver rely on.

pub mod graph;

pub use graph::{normalize_path, CiConfig, NodeId, ProjectGraph, ProjectNode};
