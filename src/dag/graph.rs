// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::model::ConfigFile;
use crate::jobs::model::JobConfig;

/// Index of a node inside a [`ProjectGraph`].
pub type NodeId = usize;

/// CI configuration of a project: its job definitions in declared order.
#[derive(Debug, Clone)]
pub struct CiConfig {
    pub jobs: Vec<JobConfig>,
}

/// A project in the monorepo.
#[derive(Debug, Clone)]
pub struct ProjectNode {
    pub name: String,
    /// Repository-relative directory, empty for the monorepo root project.
    pub path: String,
    pub ci_config: Option<CiConfig>,
    /// Direct dependencies, in walk order.
    pub dependencies: Vec<NodeId>,
}

impl ProjectNode {
    /// Number of path segments; `0` for an empty path.
    pub fn path_depth(&self) -> usize {
        if self.path.is_empty() {
            0
        } else {
            self.path.split('/').count()
        }
    }
}

/// Project dependency graph.
///
/// Nodes are interned by name and refer to their dependencies by id, so a
/// project reachable through several parents exists once. We already
/// validate acyclicity in `config::validate`.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    nodes: Vec<ProjectNode>,
    index: HashMap<String, NodeId>,
    root: NodeId,
}

impl ProjectGraph {
    /// Build the graph from a validated [`ConfigFile`].
    ///
    /// Assumes that:
    /// - all dependency references are valid
    /// - there are no cycles
    /// - the root project exists
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let index: HashMap<String, NodeId> = cfg
            .projects()
            .keys()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();

        let nodes = cfg
            .projects()
            .iter()
            .map(|(name, project)| ProjectNode {
                name: name.clone(),
                path: normalize_path(&project.path),
                ci_config: if project.jobs.is_empty() {
                    None
                } else {
                    Some(CiConfig {
                        jobs: project.jobs.clone(),
                    })
                },
                dependencies: project
                    .dependencies
                    .iter()
                    .filter_map(|dep| index.get(dep).copied())
                    .collect(),
            })
            .collect();

        let root = index.get(cfg.root()).copied().unwrap_or_default();

        Self { nodes, index, root }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &ProjectNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: NodeId) -> &ProjectNode {
        &self.nodes[id]
    }

    /// Look up a project by name.
    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        self.index.get(name).map(|&id| &self.nodes[id])
    }

    /// Immediate dependencies of a project.
    pub fn dependencies_of(&self, id: NodeId) -> impl Iterator<Item = &ProjectNode> {
        self.nodes[id].dependencies.iter().map(|&dep| &self.nodes[dep])
    }

    /// Breadth-first order from the root, visiting every reachable project
    /// once.
    pub fn bfs(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([self.root]);

        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id];
            if !visited.insert(node.name.as_str()) {
                continue;
            }
            order.push(id);
            queue.extend(node.dependencies.iter().copied());
        }

        order
    }

    /// Reachable projects ordered by path depth, deepest first.
    ///
    /// Ties keep breadth-first order; empty paths come last. Matching in this
    /// order lets nested projects claim their files before their ancestors.
    pub fn by_path_depth(&self) -> Vec<NodeId> {
        let mut order = self.bfs();
        order.sort_by_key(|&id| std::cmp::Reverse(self.nodes[id].path_depth()));
        order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Strip a leading `./` and trailing `/` so prefix matching is uniform.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.trim_end_matches('/');
    if path == "." {
        String::new()
    } else {
        path.to_string()
    }
}
