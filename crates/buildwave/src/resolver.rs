//! Reference resolution
//!
//! Turns raw `DependsOn` expressions and evaluator-reported project
//! references into dependent edges between surviving nodes. Every
//! declaration of every node is attempted even after failures, so a single
//! run surfaces the complete set of broken declarations.

use crate::error::ResolveError;
use crate::graph::{NodeId, ProjectGraph};
use std::path::{Component, Path, PathBuf};
use tracing::error;

enum Lookup {
    Found(NodeId),
    NotFound,
    Ambiguous,
}

pub(crate) struct ReferenceResolver {
    /// Directory relative `DependsOn` paths are resolved against
    base_dir: PathBuf,
}

impl ReferenceResolver {
    pub(crate) fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve every declaration of every node, adding dependent edges.
    ///
    /// Returns the accumulated failures; any non-empty result is fatal for
    /// the run, but edges added before a failure are harmless because the
    /// caller discards the graph.
    pub(crate) fn resolve(&self, graph: &mut ProjectGraph) -> Vec<ResolveError> {
        let mut errors = Vec::new();

        for id in 0..graph.len() {
            for expression in graph.node(id).unit.depends_on().to_vec() {
                match self.resolve_expression(graph, &expression) {
                    Lookup::Found(target) => graph.add_dependent(target, id),
                    Lookup::NotFound => {
                        let failure = ResolveError::DependencyNotFound {
                            dependent: graph.node(id).unit.name().to_string(),
                            expression,
                        };
                        error!(%failure, "failed to resolve dependency declaration");
                        errors.push(failure);
                    }
                    Lookup::Ambiguous => {
                        let failure = ResolveError::AmbiguousDependency {
                            dependent: graph.node(id).unit.name().to_string(),
                            expression,
                        };
                        error!(%failure, "failed to resolve dependency declaration");
                        errors.push(failure);
                    }
                }
            }
        }

        for id in 0..graph.len() {
            for reference in graph.node(id).metadata.project_references.to_vec() {
                match graph.find_by_identity(&reference) {
                    Some(target) => graph.add_dependent(target, id),
                    None => {
                        let failure = ResolveError::UnresolvedReference {
                            dependent: graph.node(id).unit.name().to_string(),
                            reference,
                        };
                        error!(%failure, "failed to resolve project reference");
                        errors.push(failure);
                    }
                }
            }
        }

        errors
    }

    /// Resolve one raw `DependsOn` expression.
    ///
    /// Bare names match the short-name table; absolute paths match identity
    /// exactly; relative paths are resolved against the base directory and,
    /// when they carry an extension, fall back to an identity suffix match.
    fn resolve_expression(&self, graph: &ProjectGraph, expression: &str) -> Lookup {
        let path = Path::new(expression);
        let has_separator = expression.contains('/') || expression.contains('\\');
        let has_extension = path.extension().is_some();

        if !has_separator && !has_extension {
            return match graph.find_by_name(expression) {
                [] => Lookup::NotFound,
                [target] => Lookup::Found(*target),
                _ => Lookup::Ambiguous,
            };
        }

        if path.is_absolute() {
            return match graph.find_by_identity(&normalize_path(path)) {
                Some(target) => Lookup::Found(target),
                None => Lookup::NotFound,
            };
        }

        let joined = normalize_path(&self.base_dir.join(path));
        if let Some(target) = graph.find_by_identity(&joined) {
            return Lookup::Found(target);
        }

        if has_extension {
            return match graph.find_by_identity_suffix(expression).as_slice() {
                [] => Lookup::NotFound,
                [target] => Lookup::Found(*target),
                _ => Lookup::Ambiguous,
            };
        }

        Lookup::NotFound
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Never touches the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}
