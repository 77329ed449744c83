//! Scheduling error types
use std::path::PathBuf;
use thiserror::Error;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// A single dependency declaration that could not be resolved.
///
/// Resolution runs over every declaration of every surviving project before
/// the run is aborted, so one failed run reports the complete set of broken
/// declarations rather than just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("project '{dependent}' depends on '{expression}', which was not found among buildable projects")]
    DependencyNotFound {
        dependent: String,
        expression: String,
    },

    #[error("project '{dependent}' depends on '{expression}', which matches more than one project; specify an unambiguous project path")]
    AmbiguousDependency {
        dependent: String,
        expression: String,
    },

    #[error("project reference '{}' of project '{dependent}' was not found among buildable projects", .reference.display())]
    UnresolvedReference {
        dependent: String,
        reference: PathBuf,
    },
}

#[derive(Debug, PartialEq, Error)]
pub enum ScheduleError {
    #[error("failed to evaluate project '{unit}': {reason}")]
    Evaluation { unit: String, reason: String },

    #[error("{} dependency declaration(s) could not be resolved", .errors.len())]
    Resolution { errors: Vec<ResolveError> },

    #[error("cyclic dependency detected for project '{0}'")]
    CyclicDependency(String),

    #[error("projects were never scheduled despite a resolved graph: {}", .units.join(", "))]
    InconsistentGraph { units: Vec<String> },
}

impl ScheduleError {
    /// Create an evaluation error
    pub fn evaluation(unit: impl Into<String>, reason: impl ToString) -> Self {
        Self::Evaluation {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}
