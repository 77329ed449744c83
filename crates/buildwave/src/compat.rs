//! Configuration/platform compatibility filtering
//!
//! Every unit is evaluated before any edge resolution starts; units that
//! cannot build under their active configuration/platform are dropped here
//! and can never be a dependency target afterwards.

use crate::error::ScheduleResult;
use crate::evaluator::{EvaluationRequest, ProjectEvaluator, ProjectMetadata};
use crate::unit::BuildUnit;
use std::collections::BTreeMap;
use tracing::info;

/// A unit paired with its evaluator facts.
#[derive(Debug, Clone)]
pub(crate) struct EvaluatedUnit {
    pub(crate) unit: BuildUnit,
    pub(crate) metadata: ProjectMetadata,
}

/// Evaluate every unit, then drop the incompatible ones.
///
/// Skips are informational, not errors: the unit is logged and removed. A
/// surviving unit that depended on a skipped one surfaces later as an
/// unresolved dependency.
pub(crate) fn evaluate_and_filter(
    units: Vec<BuildUnit>,
    evaluator: &dyn ProjectEvaluator,
    include_references: bool,
) -> ScheduleResult<Vec<EvaluatedUnit>> {
    // All evaluations complete before the first unit is filtered.
    let mut evaluated = Vec::with_capacity(units.len());
    for unit in units {
        let request = EvaluationRequest {
            identity: unit.identity(),
            configuration: unit.active_configuration(),
            platform: unit.active_platform(),
            properties: global_properties(&unit),
            include_references,
        };
        let metadata = evaluator.evaluate(&request)?;
        evaluated.push(EvaluatedUnit { unit, metadata });
    }

    let mut survivors = Vec::with_capacity(evaluated.len());
    for candidate in evaluated {
        if should_skip(&candidate.unit, &candidate.metadata) {
            info!(
                project = %candidate.unit.name(),
                "skipped project due to unsupported configuration or platform"
            );
        } else {
            survivors.push(candidate);
        }
    }

    Ok(survivors)
}

/// Decide whether a unit is buildable under its active configuration/platform.
///
/// Legacy projects declare no configuration list; they are assumed buildable
/// unless they have no output path at all. SDK-style projects must list the
/// active configuration and platform, compared case-insensitively.
pub(crate) fn should_skip(unit: &BuildUnit, metadata: &ProjectMetadata) -> bool {
    if !metadata.sdk_style {
        return !metadata.declares_output_path;
    }

    !contains_ignore_case(&metadata.configurations, unit.active_configuration())
        || !contains_ignore_case(&metadata.platforms, unit.active_platform())
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    values.iter().any(|value| value.eq_ignore_ascii_case(needle))
}

/// Property bag handed to the evaluator: the active pair first, then the
/// unit's `AdditionalProperties` overrides on top (later keys win).
fn global_properties(unit: &BuildUnit) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert(
        "Configuration".to_string(),
        unit.active_configuration().to_string(),
    );
    properties.insert("Platform".to_string(), unit.active_platform().to_string());

    for (key, value) in unit.additional_property_pairs() {
        properties.insert(key, value);
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sdk_unit(configuration: &str, platform: &str) -> BuildUnit {
        BuildUnit::new("/sol/Lib.proj", 0)
            .with_configuration(configuration)
            .with_platform(platform)
    }

    #[rstest]
    #[case("Debug", "AnyCPU", false)]
    #[case("debug", "anycpu", false)]
    #[case("Release", "AnyCPU", true)]
    #[case("Debug", "x64", true)]
    fn test_sdk_skip_rule(
        #[case] configuration: &str,
        #[case] platform: &str,
        #[case] expected: bool,
    ) {
        let metadata = ProjectMetadata::sdk(["Debug"], ["AnyCPU"]);
        assert_eq!(should_skip(&sdk_unit(configuration, platform), &metadata), expected);
    }

    #[rstest]
    #[case(true, false)]
    #[case(false, true)]
    fn test_legacy_skip_keyed_off_output_path(
        #[case] declares_output_path: bool,
        #[case] expected: bool,
    ) {
        // Legacy projects skip only when they have literally no output.
        let metadata = ProjectMetadata::legacy(declares_output_path);
        assert_eq!(should_skip(&sdk_unit("Debug", "AnyCPU"), &metadata), expected);
    }

    #[test]
    fn test_global_properties_overrides_win() {
        let unit = sdk_unit("Debug", "AnyCPU")
            .with_additional_properties("Platform=x86;WarnLevel=4");

        let properties = global_properties(&unit);
        assert_eq!(properties["Configuration"], "Debug");
        assert_eq!(properties["Platform"], "x86");
        assert_eq!(properties["WarnLevel"], "4");
    }

    #[test]
    fn test_filter_removes_skipped_units() {
        use crate::evaluator::StaticEvaluator;

        let evaluator = StaticEvaluator::new()
            .with("/sol/Keep.proj", ProjectMetadata::sdk(["Debug"], ["AnyCPU"]))
            .with("/sol/Drop.proj", ProjectMetadata::sdk(["Release"], ["AnyCPU"]));

        let units = vec![
            BuildUnit::new("/sol/Keep.proj", 0)
                .with_configuration("Debug")
                .with_platform("AnyCPU"),
            BuildUnit::new("/sol/Drop.proj", 1)
                .with_configuration("Debug")
                .with_platform("AnyCPU"),
        ];

        let survivors = evaluate_and_filter(units, &evaluator, false).unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].unit.name(), "Keep");
    }
}
