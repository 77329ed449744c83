//! Wave-based build order scheduling
//!
//! Ties the pipeline together: evaluate and filter units, resolve reference
//! edges, then level the graph into waves. Within a wave every prerequisite
//! has completed in an earlier wave, so a caller may build wave members in
//! parallel.

use crate::compat;
use crate::error::{ScheduleError, ScheduleResult};
use crate::evaluator::ProjectEvaluator;
use crate::graph::{NodeId, ProjectGraph, ProjectNode};
use crate::resolver::ReferenceResolver;
use crate::unit::BuildUnit;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::debug;

/// Scheduling options
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    /// Directory relative `DependsOn` paths are resolved against
    pub base_dir: PathBuf,
    /// Order by declared project references in addition to explicit
    /// `DependsOn` edges
    pub follow_project_references: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            follow_project_references: false,
        }
    }
}

impl ScheduleOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_project_references(mut self, enabled: bool) -> Self {
        self.follow_project_references = enabled;
        self
    }
}

/// One scheduled project, ready to hand to the outer build driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledProject {
    /// Identity of the input unit this entry was produced from
    pub identity: PathBuf,
    /// `Configuration=<cfg>;Platform=<plat>` for the project's own build
    pub properties: String,
    /// `AdditionalProperties` passthrough
    pub additional_properties: String,
    /// Wave index, rendered the way the build engine expects it
    pub build_order: String,
}

/// Complete schedule for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSchedule {
    /// Projects in build order; waves are contiguous runs of equal
    /// `build_order`
    pub projects: Vec<ScheduledProject>,
    /// True when the dependency-aware leveled traversal produced the order,
    /// false for the single-wave fast path
    pub leveled: bool,
}

/// Computes dependency-respecting build schedules.
///
/// One call to [`BuildScheduler::schedule`] builds one graph, levels it, and
/// discards it; nothing persists across runs.
pub struct BuildScheduler<'e> {
    evaluator: &'e dyn ProjectEvaluator,
    options: ScheduleOptions,
}

impl<'e> BuildScheduler<'e> {
    pub fn new(evaluator: &'e dyn ProjectEvaluator) -> Self {
        Self {
            evaluator,
            options: ScheduleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScheduleOptions) -> Self {
        self.options = options;
        self
    }

    /// Compute the schedule for an ordered list of units.
    ///
    /// Either returns a complete, correctly ordered schedule or no schedule
    /// at all; there is no partial output.
    pub fn schedule(&self, units: Vec<BuildUnit>) -> ScheduleResult<BuildSchedule> {
        let units = dedup_by_identity(units);

        // Any DependsOn anywhere in the input forces reference ordering for
        // the whole run.
        let follow_references = self.options.follow_project_references
            || units.iter().any(|unit| !unit.depends_on().is_empty());

        let survivors = compat::evaluate_and_filter(units, self.evaluator, follow_references)?;
        let mut graph = ProjectGraph::build(survivors);

        if follow_references {
            let errors = ReferenceResolver::new(&self.options.base_dir).resolve(&mut graph);
            if !errors.is_empty() {
                return Err(ScheduleError::Resolution { errors });
            }
        }

        let needs_leveling = graph
            .nodes()
            .any(|(_, node)| node.has_unresolved_dependencies());
        if needs_leveling {
            leveled_schedule(&graph)
        } else {
            Ok(single_wave_schedule(&graph))
        }
    }
}

/// Fast path: nothing declares a dependency, so everything builds in wave 0
/// ordered by input position.
fn single_wave_schedule(graph: &ProjectGraph) -> BuildSchedule {
    let mut ids: Vec<NodeId> = graph.nodes().map(|(id, _)| id).collect();
    ids.sort_by_key(|&id| graph.node(id).unit.original_order());

    BuildSchedule {
        projects: ids
            .into_iter()
            .map(|id| scheduled_project(graph.node(id), 0))
            .collect(),
        leveled: false,
    }
}

/// General path: breadth-first leveling over dependent edges.
fn leveled_schedule(graph: &ProjectGraph) -> ScheduleResult<BuildSchedule> {
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(graph.len());
    let mut projects = Vec::with_capacity(graph.len());

    let mut wave: BTreeSet<NodeId> = graph
        .nodes()
        .filter(|(_, node)| !node.has_unresolved_dependencies())
        .map(|(id, _)| id)
        .collect();
    let mut build_order = 0u32;

    while !wave.is_empty() {
        // A node reappearing in a later wave means traversal looped back.
        for &id in &wave {
            if !visited.insert(id) {
                return Err(ScheduleError::CyclicDependency(
                    graph.node(id).unit.name().to_string(),
                ));
            }
        }

        let mut emitted: Vec<NodeId> = wave.iter().copied().collect();
        emitted.sort_by_key(|&id| graph.node(id).unit.original_order());
        debug!(wave = build_order, projects = emitted.len(), "emitting build wave");
        projects.extend(
            emitted
                .iter()
                .map(|&id| scheduled_project(graph.node(id), build_order)),
        );

        // Next wave: deduplicated union of the emitted nodes' dependents.
        let mut next = BTreeSet::new();
        for &id in &wave {
            next.extend(graph.node(id).dependents.iter().copied());
        }
        wave = next;
        build_order += 1;
    }

    if visited.len() != graph.len() {
        let unreached: BTreeSet<NodeId> = graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| !visited.contains(id))
            .collect();

        // Units left behind normally mean their prerequisites loop back on
        // each other without ever becoming buildable.
        if let Some(on_cycle) = graph.find_cycle_among(&unreached) {
            return Err(ScheduleError::CyclicDependency(
                graph.node(on_cycle).unit.name().to_string(),
            ));
        }

        // Invariant violation: the graph resolved cleanly and contains no
        // cycle, yet traversal missed units.
        return Err(ScheduleError::InconsistentGraph {
            units: unreached
                .into_iter()
                .map(|id| graph.node(id).unit.name().to_string())
                .collect(),
        });
    }

    Ok(BuildSchedule {
        projects,
        leveled: true,
    })
}

fn scheduled_project(node: &ProjectNode, build_order: u32) -> ScheduledProject {
    let unit = &node.unit;
    ScheduledProject {
        identity: unit.identity().to_path_buf(),
        properties: format!(
            "Configuration={};Platform={}",
            unit.active_configuration(),
            unit.active_platform()
        ),
        additional_properties: unit.additional_properties().to_string(),
        build_order: build_order.to_string(),
    }
}

/// Drop duplicate identities; the first descriptor wins.
fn dedup_by_identity(units: Vec<BuildUnit>) -> Vec<BuildUnit> {
    let mut seen = HashSet::new();
    units
        .into_iter()
        .filter(|unit| {
            let fresh = seen.insert(unit.identity().to_path_buf());
            if !fresh {
                debug!(project = %unit.name(), "dropping duplicate project identity");
            }
            fresh
        })
        .collect()
}
