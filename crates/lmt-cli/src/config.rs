//! Experiment file: arena geometry plus analysis defaults.

use std::{collections::BTreeMap, path::Path};

use lmt_analysis::{
    heading::HeadingConfig,
    occupancy::OccupancyConfig,
    orientation::{OrientationConfig, TargetPoint},
    press,
    role::RoleSelection,
    transition::TransitionConfig,
    zone::{Zone, ZoneRegistry},
};
use serde::Deserialize;

use crate::util;

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// Ordered zones; the first containing zone wins.
    pub zones: ZoneRegistry,
    #[serde(default)]
    pub targets: Vec<TargetPoint>,
    /// Where an individual must be to be credited with a lever press.
    #[serde(default = "press::default_lever_zone")]
    pub lever_zone: Zone,
    /// Named role selections, e.g. `"male": ["1", "3"]`.
    #[serde(default)]
    pub role_groups: BTreeMap<String, Vec<String>>,
    /// Labels handed out in tag order when no role table is given.
    #[serde(default = "default_positional_roles")]
    pub positional_roles: Vec<String>,
    #[serde(default)]
    pub transition: TransitionConfig,
    #[serde(default)]
    pub occupancy: OccupancyConfig,
    #[serde(default)]
    pub orientation: OrientationConfig,
    #[serde(default)]
    pub heading: HeadingConfig,
}

fn default_positional_roles() -> Vec<String> {
    vec!["1".to_owned(), "3".to_owned()]
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = util::read_json_file::<Self, _>("experiment", path)?;
        tracing::debug!(
            path = %path.display(),
            zones = config.zones.len(),
            targets = config.targets.len(),
            "loaded experiment config"
        );
        Ok(config)
    }

    pub fn role_selection(&self, name: &str) -> RoleSelection {
        RoleSelection::resolve(name, &self.role_groups)
    }
}

#[cfg(test)]
mod tests {
    use lmt_analysis::zone::ZoneId;

    use super::*;

    #[test]
    fn test_sample_config() {
        let config: ExperimentConfig =
            serde_json::from_str(include_str!("../../../config/experiment.json")).unwrap();
        assert_eq!(config.zones.len(), 3);
        assert_eq!(config.zones.classify(100.0, 100.0), Some(&ZoneId::new("A")));
        assert_eq!(config.zones.classify(256.0, 100.0), None);
        assert_eq!(
            TargetPoint::find(&config.targets, "lever").unwrap(),
            &TargetPoint::new("lever", 250.0, 350.0)
        );
        assert_eq!(config.role_selection("male"), RoleSelection::new(["1", "3"]));
        assert_eq!(config.transition, TransitionConfig::default());
        assert!(config.lever_zone.contains(215.0, 385.0));
        assert!(!config.lever_zone.contains(214.0, 350.0));
    }

    #[test]
    fn test_minimal_config() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{"zones": [{"name": "A", "min_x": 0, "min_y": 0, "max_x": 1, "max_y": 1}]}"#,
        )
        .unwrap();
        assert_eq!(config.positional_roles, ["1", "3"]);
        assert!(config.targets.is_empty());
        assert_eq!(config.heading.offsets, [-2_000, 0, 2_000]);
        assert_eq!(config.lever_zone, press::default_lever_zone());
    }

    #[test]
    fn test_overlapping_zones_are_rejected() {
        let result = serde_json::from_str::<ExperimentConfig>(
            r#"{"zones": [
                {"name": "A", "min_x": 0, "min_y": 0, "max_x": 2, "max_y": 2},
                {"name": "B", "min_x": 1, "min_y": 1, "max_x": 3, "max_y": 3}
            ]}"#,
        );
        assert!(result.is_err());
    }
}
