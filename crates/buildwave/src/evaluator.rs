//! Project evaluation boundary
//!
//! The scheduler never loads project files itself. It asks a
//! [`ProjectEvaluator`] for the facts it needs about each unit: whether the
//! project is SDK-style, which configurations and platforms it supports,
//! whether it declares an output path, and (when reference ordering is on)
//! its declared project references. Implementations may evaluate eagerly,
//! lazily, or serve pre-computed batch results; all evaluations complete
//! before compatibility filtering starts.

use crate::error::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Parameters for a single project evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationRequest<'a> {
    /// Project identity (absolute path)
    pub identity: &'a Path,
    /// Active configuration
    pub configuration: &'a str,
    /// Active platform
    pub platform: &'a str,
    /// Global property bag: Configuration and Platform, then the unit's
    /// `AdditionalProperties` overrides on top
    pub properties: BTreeMap<String, String>,
    /// Whether declared project references should be collected
    pub include_references: bool,
}

/// Facts about a project, as reported by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// True for SDK-style projects, which declare their configuration support
    pub sdk_style: bool,
    /// Configurations the project declares support for
    pub configurations: Vec<String>,
    /// Platforms the project declares support for
    pub platforms: Vec<String>,
    /// Whether the project declares an output path; the compatibility signal
    /// for legacy projects
    pub declares_output_path: bool,
    /// Identities of projects this one references
    pub project_references: Vec<PathBuf>,
}

impl ProjectMetadata {
    /// An SDK-style project supporting the given configurations and platforms
    pub fn sdk(
        configurations: impl IntoIterator<Item = impl Into<String>>,
        platforms: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            sdk_style: true,
            configurations: configurations.into_iter().map(Into::into).collect(),
            platforms: platforms.into_iter().map(Into::into).collect(),
            declares_output_path: true,
            ..Self::default()
        }
    }

    /// A legacy project; buildable as long as it declares an output path
    pub fn legacy(declares_output_path: bool) -> Self {
        Self {
            declares_output_path,
            ..Self::default()
        }
    }

    /// Attach declared project references
    pub fn with_references(
        mut self,
        references: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.project_references = references.into_iter().map(Into::into).collect();
        self
    }
}

/// Supplies project facts to the scheduler.
pub trait ProjectEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> ScheduleResult<ProjectMetadata>;
}

/// Evaluator backed by pre-computed facts, keyed by project identity.
///
/// Useful when evaluation ran in a separate batch step, and as a
/// deterministic fake in tests.
#[derive(Debug, Default)]
pub struct StaticEvaluator {
    facts: HashMap<PathBuf, ProjectMetadata>,
}

impl StaticEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register facts for a project identity
    pub fn insert(&mut self, identity: impl Into<PathBuf>, metadata: ProjectMetadata) {
        self.facts.insert(identity.into(), metadata);
    }

    /// Builder-style [`StaticEvaluator::insert`]
    pub fn with(mut self, identity: impl Into<PathBuf>, metadata: ProjectMetadata) -> Self {
        self.insert(identity, metadata);
        self
    }
}

impl ProjectEvaluator for StaticEvaluator {
    fn evaluate(&self, request: &EvaluationRequest<'_>) -> ScheduleResult<ProjectMetadata> {
        let mut metadata = self
            .facts
            .get(request.identity)
            .cloned()
            .ok_or_else(|| {
                ScheduleError::evaluation(
                    request.identity.display().to_string(),
                    "no pre-computed facts for this project",
                )
            })?;

        // References are only collected when the run asked for them.
        if !request.include_references {
            metadata.project_references.clear();
        }

        Ok(metadata)
    }
}
