//! Dependency graph over surviving build units
//!
//! Edges point from a depended-upon node to its dependents ("build me, then
//! build these"). Adjacency is index-based over a single node arena, so the
//! relation stays non-owning; the graph lives for one scheduling run.

use crate::compat::EvaluatedUnit;
use crate::evaluator::ProjectMetadata;
use crate::unit::BuildUnit;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub(crate) type NodeId = usize;

#[derive(Debug)]
pub(crate) struct ProjectNode {
    pub(crate) unit: BuildUnit,
    pub(crate) metadata: ProjectMetadata,
    /// Nodes that must build after this one
    pub(crate) dependents: BTreeSet<NodeId>,
}

impl ProjectNode {
    /// True when this node declares anything that must build before it
    pub(crate) fn has_unresolved_dependencies(&self) -> bool {
        !self.unit.depends_on().is_empty() || !self.metadata.project_references.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ProjectGraph {
    nodes: Vec<ProjectNode>,
    by_identity: HashMap<PathBuf, NodeId>,
    /// Lowercased short name -> candidate nodes, built once after filtering
    /// and queried immutably during resolution
    by_name: HashMap<String, Vec<NodeId>>,
}

impl ProjectGraph {
    pub(crate) fn build(survivors: Vec<EvaluatedUnit>) -> Self {
        let mut graph = Self::default();

        for candidate in survivors {
            let id = graph.nodes.len();
            graph
                .by_identity
                .insert(candidate.unit.identity().to_path_buf(), id);
            graph
                .by_name
                .entry(candidate.unit.name().to_ascii_lowercase())
                .or_default()
                .push(id);
            graph.nodes.push(ProjectNode {
                unit: candidate.unit,
                metadata: candidate.metadata,
                dependents: BTreeSet::new(),
            });
        }

        graph
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &ProjectNode {
        &self.nodes[id]
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &ProjectNode)> {
        self.nodes.iter().enumerate()
    }

    /// Record that `dependent` must build after `target`
    pub(crate) fn add_dependent(&mut self, target: NodeId, dependent: NodeId) {
        self.nodes[target].dependents.insert(dependent);
    }

    /// Exact identity lookup
    pub(crate) fn find_by_identity(&self, identity: &Path) -> Option<NodeId> {
        self.by_identity.get(identity).copied()
    }

    /// Case-insensitive short-name lookup
    pub(crate) fn find_by_name(&self, name: &str) -> &[NodeId] {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Case-insensitive suffix match of identities against a path fragment.
    ///
    /// The match must start at a path component boundary, so `Lib.proj` does
    /// not match `OtherLib.proj`.
    pub(crate) fn find_by_identity_suffix(&self, fragment: &str) -> Vec<NodeId> {
        let needle = fragment.replace('\\', "/").to_ascii_lowercase();

        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                let identity = node
                    .unit
                    .identity()
                    .to_string_lossy()
                    .replace('\\', "/")
                    .to_ascii_lowercase();
                if !identity.ends_with(&needle) {
                    return false;
                }
                let boundary = identity.len() - needle.len();
                boundary == 0 || identity.as_bytes()[boundary - 1] == b'/'
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Look for a cycle among `candidates`, following dependent edges only
    /// through that set. Returns a node on the first cycle found.
    pub(crate) fn find_cycle_among(&self, candidates: &BTreeSet<NodeId>) -> Option<NodeId> {
        let mut visited = BTreeSet::new();
        let mut stack = BTreeSet::new();

        for &start in candidates {
            if let Some(found) = self.dfs_find_cycle(start, candidates, &mut visited, &mut stack) {
                return Some(found);
            }
        }

        None
    }

    fn dfs_find_cycle(
        &self,
        id: NodeId,
        candidates: &BTreeSet<NodeId>,
        visited: &mut BTreeSet<NodeId>,
        stack: &mut BTreeSet<NodeId>,
    ) -> Option<NodeId> {
        if stack.contains(&id) {
            return Some(id);
        }
        if !visited.insert(id) {
            return None;
        }

        stack.insert(id);
        for &dependent in &self.nodes[id].dependents {
            if !candidates.contains(&dependent) {
                continue;
            }
            if let Some(found) = self.dfs_find_cycle(dependent, candidates, visited, stack) {
                return Some(found);
            }
        }
        stack.remove(&id);

        None
    }
}
