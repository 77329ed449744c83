//! Build unit descriptors and raw metadata parsing
//!
//! A [`BuildUnit`] is one project-like entry of the solution build: its
//! identity path, the configuration/platform it was requested under, and the
//! raw `DependsOn` / `AdditionalProperties` metadata strings declared for it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A project-like build unit participating in a solution build.
///
/// The `identity` is the unique key for the whole scheduling run; two
/// descriptors with the same identity are the same unit. Everything else is
/// carried along to parameterize that unit's own build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildUnit {
    identity: PathBuf,
    original_order: usize,
    name: String,
    active_configuration: String,
    active_platform: String,
    additional_properties: String,
    depends_on: Vec<String>,
}

impl BuildUnit {
    /// Create a unit from its identity path and position in the input list.
    ///
    /// The short name defaults to the identity's file stem; override it with
    /// [`BuildUnit::with_name`] when the solution supplies a display name.
    pub fn new(identity: impl Into<PathBuf>, original_order: usize) -> Self {
        let identity = identity.into();
        let name = identity
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            identity,
            original_order,
            name,
            active_configuration: String::new(),
            active_platform: String::new(),
            additional_properties: String::new(),
            depends_on: Vec::new(),
        }
    }

    /// Override the short name used for symbolic dependency matching
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the configuration this unit is requested to build under
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.active_configuration = configuration.into();
        self
    }

    /// Set the platform this unit is requested to build under
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.active_platform = platform.into();
        self
    }

    /// Set the raw semicolon-separated `Key=Value` property overrides
    pub fn with_additional_properties(mut self, properties: impl Into<String>) -> Self {
        self.additional_properties = properties.into();
        self
    }

    /// Parse a raw semicolon-separated `DependsOn` declaration.
    ///
    /// Entries are trimmed, empty entries discarded, order preserved.
    pub fn with_depends_on(mut self, depends_on: &str) -> Self {
        self.depends_on = split_metadata_list(depends_on);
        self
    }

    /// Canonical absolute path identifying this unit
    pub fn identity(&self) -> &Path {
        &self.identity
    }

    /// Position in the input list; a stable tie-break, never an ordering edge
    pub fn original_order(&self) -> usize {
        self.original_order
    }

    /// Short name used for symbolic dependency matching; not unique
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active_configuration(&self) -> &str {
        &self.active_configuration
    }

    pub fn active_platform(&self) -> &str {
        &self.active_platform
    }

    /// Raw `AdditionalProperties` string, passed through to the output
    pub fn additional_properties(&self) -> &str {
        &self.additional_properties
    }

    /// Raw dependency expressions, in declaration order
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Key/value pairs parsed out of `AdditionalProperties`.
    ///
    /// Entries without a `=` map to an empty value.
    pub fn additional_property_pairs(&self) -> Vec<(String, String)> {
        split_metadata_list(&self.additional_properties)
            .into_iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (entry, String::new()),
            })
            .collect()
    }
}

/// Split a semicolon-separated metadata list, trimming entries and
/// discarding empty ones.
pub(crate) fn split_metadata_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_file_stem() {
        let unit = BuildUnit::new("/sol/src/Lib/Lib.proj", 0);
        assert_eq!(unit.name(), "Lib");
    }

    #[test]
    fn test_with_name_overrides_stem() {
        let unit = BuildUnit::new("/sol/src/Lib/Lib.proj", 0).with_name("Library");
        assert_eq!(unit.name(), "Library");
    }

    #[test]
    fn test_depends_on_trims_and_drops_empty_entries() {
        let unit = BuildUnit::new("/sol/App.proj", 0).with_depends_on(" Core ; ;Utils; ");
        assert_eq!(unit.depends_on(), ["Core", "Utils"]);
    }

    #[test]
    fn test_depends_on_preserves_order() {
        let unit = BuildUnit::new("/sol/App.proj", 0).with_depends_on("B;A;C");
        assert_eq!(unit.depends_on(), ["B", "A", "C"]);
    }

    #[test]
    fn test_additional_property_pairs() {
        let unit = BuildUnit::new("/sol/App.proj", 0)
            .with_additional_properties("WarnLevel=4; DefineConstants=TRACE ;Bare");
        assert_eq!(
            unit.additional_property_pairs(),
            vec![
                ("WarnLevel".to_string(), "4".to_string()),
                ("DefineConstants".to_string(), "TRACE".to_string()),
                ("Bare".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_additional_property_pairs_empty() {
        let unit = BuildUnit::new("/sol/App.proj", 0);
        assert!(unit.additional_property_pairs().is_empty());
    }

    #[test]
    fn test_split_metadata_list_all_empty() {
        assert!(split_metadata_list(" ; ;; ").is_empty());
    }
}
