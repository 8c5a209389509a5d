//! Heading of selected individuals relative to a target point
//!
//! For every press by a selected individual, every other selected individual
//! is sampled at `press + delay_ms`. The sample angle is the counter-clockwise
//! angle in `[0, 2π)` from the individual's heading (mass to front point) to
//! the direction of the target (mass to target). Samples are grouped by the
//! zone holding the center of mass and binned into an angular histogram. The
//! same is done for a seeded random sample of rows over all individuals.
//!
//! A sample needs all four coordinates present and non-negative, a center of
//! mass inside a zone, and non-zero heading and target vectors.

use lmt_stats::histogram::Histogram;
use lmt_table::{Tag, WideRow, WideTable};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfigError,
    align::{AlignMode, EventAligner},
    baseline::BaselineConfig,
    batch::{Trial, map_trials},
    exclusion::{Exclusion, ExclusionTally},
    occupancy::{Comparison, ZoneDistribution},
    role::{RoleSelection, RoleTable},
    sampling::{selected_tags, state_at, table_events, valid_mass_and_front},
    zone::{ZoneId, ZoneRegistry},
};

/// A named point of interest in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl TargetPoint {
    #[must_use]
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    /// Looks up a target by name, ignoring ASCII case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_analysis::orientation::TargetPoint;
    /// let targets = [TargetPoint::new("lever", 250.0, 350.0)];
    /// assert_eq!(TargetPoint::find(&targets, "LEVER")?.x, 250.0);
    /// assert!(TargetPoint::find(&targets, "door").is_err());
    /// # Ok::<(), lmt_analysis::AnalysisConfigError>(())
    /// ```
    pub fn find<'a>(
        targets: &'a [TargetPoint],
        name: &str,
    ) -> Result<&'a TargetPoint, AnalysisConfigError> {
        targets
            .iter()
            .find(|target| target.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AnalysisConfigError::UnknownTarget {
                target: name.to_owned(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    pub delay_ms: i64,
    /// Angular histogram bins over `[0, 2π)`.
    pub bins: usize,
    pub mode: AlignMode,
    pub baseline: BaselineConfig,
    pub alpha: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            bins: 12,
            mode: AlignMode::Exact,
            baseline: BaselineConfig::default(),
            alpha: 0.05,
        }
    }
}

/// Angular histograms of one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneOrientation {
    pub zone: ZoneId,
    pub post: Histogram,
    pub random: Histogram,
    /// `None` when the zone has no post-event samples.
    pub post_fractions: Option<Vec<f64>>,
    pub random_fractions: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrientationReport {
    pub selection: String,
    pub subjects: Vec<Tag>,
    pub target: TargetPoint,
    pub events: usize,
    pub by_zone: Vec<ZoneOrientation>,
    /// Zones of the samples that produced an angle.
    pub post: ZoneDistribution,
    pub random: ZoneDistribution,
    pub comparison: Option<Comparison>,
    pub insufficient_data: bool,
    pub exclusions: ExclusionTally,
    pub baseline_exclusions: ExclusionTally,
}

#[derive(Debug, Clone, Default)]
struct TrialAngles {
    events: usize,
    by_zone: Vec<Vec<f64>>,
    exclusions: ExclusionTally,
}

#[derive(Debug, Clone)]
pub struct OrientationAnalysis<'z> {
    config: OrientationConfig,
    zones: &'z ZoneRegistry,
    target: TargetPoint,
}

impl<'z> OrientationAnalysis<'z> {
    pub fn new(
        config: OrientationConfig,
        zones: &'z ZoneRegistry,
        target: TargetPoint,
    ) -> Result<Self, AnalysisConfigError> {
        if config.bins == 0 {
            return Err(AnalysisConfigError::ZeroBins);
        }
        config.baseline.validate()?;
        Ok(Self {
            config,
            zones,
            target,
        })
    }

    #[must_use]
    pub fn config(&self) -> &OrientationConfig {
        &self.config
    }

    pub fn run(
        &self,
        trials: &[Trial],
        roles: &RoleTable,
        selection: &RoleSelection,
    ) -> Result<OrientationReport, AnalysisConfigError> {
        let subjects = selected_tags(trials, roles, selection)?;

        let mut post = vec![Vec::new(); self.zones.len()];
        let mut events = 0;
        let mut exclusions = ExclusionTally::new();
        for partial in map_trials(trials, |trial| self.trial_angles(trial, &subjects)) {
            events += partial.events;
            for (angles, more) in post.iter_mut().zip(partial.by_zone) {
                angles.extend(more);
            }
            exclusions.merge(&partial.exclusions);
        }

        let tables = trials
            .iter()
            .map(|trial| trial.table.clone())
            .collect::<Vec<_>>();
        let combined = WideTable::concat(&tables);
        let mut baseline_exclusions = ExclusionTally::new();
        let random = self.baseline_angles(&combined, &mut baseline_exclusions);

        let by_zone = self
            .zones
            .ids()
            .zip(post.iter().zip(&random))
            .map(|(zone, (post, random))| {
                let post = Histogram::angular(post.iter().copied(), self.config.bins);
                let random = Histogram::angular(random.iter().copied(), self.config.bins);
                ZoneOrientation {
                    zone: zone.clone(),
                    post_fractions: post.fractions(),
                    random_fractions: random.fractions(),
                    post,
                    random,
                }
            })
            .collect();

        let post = ZoneDistribution::from_counts(post.iter().map(Vec::len).collect());
        let random = ZoneDistribution::from_counts(random.iter().map(Vec::len).collect());
        let insufficient_data = post.is_empty() || random.is_empty();
        let comparison = if insufficient_data {
            tracing::warn!(
                post = post.total(),
                random = random.total(),
                "insufficient data for orientation comparison"
            );
            None
        } else {
            Comparison::between(("post", &post), ("random", &random), self.config.alpha)
        };

        tracing::info!(
            trials = trials.len(),
            target = %self.target.name,
            events,
            post = post.total(),
            random = random.total(),
            excluded = exclusions.total(),
            "orientation analysis finished"
        );
        Ok(OrientationReport {
            selection: selection.to_string(),
            subjects,
            target: self.target.clone(),
            events,
            by_zone,
            post,
            random,
            comparison,
            insufficient_data,
            exclusions,
            baseline_exclusions,
        })
    }

    fn trial_angles(&self, trial: &Trial, subjects: &[Tag]) -> TrialAngles {
        let table = &trial.table;
        let mut partial = TrialAngles {
            by_zone: vec![Vec::new(); self.zones.len()],
            ..TrialAngles::default()
        };
        let aligner = EventAligner::new(table, self.config.mode);

        for event in table_events(table, &mut partial.exclusions) {
            if !subjects.contains(&event.actor) {
                continue;
            }
            partial.events += 1;
            let Some(row) = aligner.row_at(event.timestamp_ms.saturating_add(self.config.delay_ms))
            else {
                partial.exclusions.record(Exclusion::MissingRow);
                continue;
            };
            let others = subjects
                .iter()
                .filter(|tag| **tag != event.actor)
                .filter_map(|tag| table.tag_index(tag));
            for col in others {
                match self.sample(row, col) {
                    Ok((zone, angle)) => partial.by_zone[zone].push(angle),
                    Err(reason) => partial.exclusions.record(reason),
                }
            }
        }

        tracing::debug!(
            trial = %trial.name,
            events = partial.events,
            excluded = partial.exclusions.total(),
            "collected orientation angles"
        );
        partial
    }

    fn baseline_angles(&self, table: &WideTable, exclusions: &mut ExclusionTally) -> Vec<Vec<f64>> {
        let mut by_zone = vec![Vec::new(); self.zones.len()];
        for row in self.config.baseline.sample_rows(table) {
            for col in 0..table.tags().len() {
                match self.sample(row, col) {
                    Ok((zone, angle)) => by_zone[zone].push(angle),
                    Err(reason) => exclusions.record(reason),
                }
            }
        }
        by_zone
    }

    /// Zone of the center of mass and angle from heading to target.
    fn sample(&self, row: &WideRow, col: usize) -> Result<(usize, f64), Exclusion> {
        let ((mx, my), (fx, fy)) = valid_mass_and_front(state_at(Some(row), col)?)?;
        let zone = self.zones.classify_index(mx, my).ok_or(Exclusion::OutsideZone)?;
        let heading = (fx - mx, fy - my);
        let to_target = (self.target.x - mx, self.target.y - my);
        let angle = lmt_stats::circular::angle_between(heading, to_target)
            .ok_or(Exclusion::DegenerateVector)?;
        Ok((zone, angle))
    }
}

#[cfg(test)]
mod tests {
    use lmt_table::{Event, IndividualState};

    use super::*;
    use crate::zone::Zone;

    fn posed(mass: (f64, f64), front: (f64, f64)) -> Option<IndividualState> {
        Some(IndividualState {
            mass_x: Some(mass.0),
            mass_y: Some(mass.1),
            front_x: Some(front.0),
            front_y: Some(front.1),
            direction: None,
        })
    }

    fn zones() -> ZoneRegistry {
        ZoneRegistry::new(vec![
            Zone::new("A", (0.0, 0.0), (10.0, 10.0)),
            Zone::new("B", (20.0, 0.0), (30.0, 10.0)),
        ])
        .unwrap()
    }

    fn roles() -> RoleTable {
        RoleTable::from_csv("ID_Animal,rank\n1,1\n2,1\n", 1).unwrap()
    }

    fn trial() -> Trial {
        let tags = ["01", "02"].map(Tag::new).to_vec();
        let rows = vec![
            WideRow::new(0, vec![None, None]).unwrap(),
            // 02 faces +x, the target lies straight up: a quarter turn
            WideRow::new(1_000, vec![None, posed((5.0, 5.0), (6.0, 5.0))]).unwrap(),
            // Front point on top of the center of mass
            WideRow::new(2_000, vec![None, posed((5.0, 5.0), (5.0, 5.0))]).unwrap(),
        ];
        let mut table = WideTable::new(tags, rows).unwrap();
        table
            .attach_events(
                &[
                    Event::lever_press(0, Tag::new("01")),
                    Event::lever_press(1_000, Tag::new("01")),
                ],
                0,
            )
            .unwrap();
        Trial::new("t", table)
    }

    #[test]
    fn test_angle_to_target() {
        let zones = zones();
        let analysis = OrientationAnalysis::new(
            OrientationConfig::default(),
            &zones,
            TargetPoint::new("up", 5.0, 50.0),
        )
        .unwrap();
        let report = analysis
            .run(&[trial()], &roles(), &RoleSelection::new(["1"]))
            .unwrap();

        assert_eq!(report.events, 2);
        assert_eq!(report.post.counts, [1, 0]);
        assert_eq!(report.exclusions.count(Exclusion::DegenerateVector), 1);

        let zone_a = &report.by_zone[0];
        assert_eq!(zone_a.zone, ZoneId::new("A"));
        let fractions = zone_a.post_fractions.as_ref().unwrap();
        assert_eq!(fractions.len(), 12);
        // PI / 2 is the lower edge of the fourth bin
        assert_eq!(fractions[3], 1.0);
        assert_eq!(report.by_zone[1].post_fractions, None);

        // Baseline over every row: only the quarter-turn pose is usable
        assert_eq!(report.random.counts, [1, 0]);
        assert_eq!(report.by_zone[0].random.bins[3].count, 1);
        assert_eq!(report.baseline_exclusions.count(Exclusion::DegenerateVector), 1);
        assert!(!report.insufficient_data);
        assert!(report.comparison.is_some());
    }

    #[test]
    fn test_missing_front_point() {
        let tags = ["01", "02"].map(Tag::new).to_vec();
        let state = IndividualState {
            mass_x: Some(5.0),
            mass_y: Some(5.0),
            ..IndividualState::default()
        };
        let rows = vec![
            WideRow::new(0, vec![None, None]).unwrap(),
            WideRow::new(1_000, vec![None, Some(state)]).unwrap(),
        ];
        let mut table = WideTable::new(tags, rows).unwrap();
        table
            .attach_events(&[Event::lever_press(0, Tag::new("01"))], 0)
            .unwrap();

        let zones = zones();
        let analysis = OrientationAnalysis::new(
            OrientationConfig::default(),
            &zones,
            TargetPoint::new("up", 5.0, 50.0),
        )
        .unwrap();
        let report = analysis
            .run(&[Trial::new("t", table)], &roles(), &RoleSelection::new(["1"]))
            .unwrap();
        assert!(report.insufficient_data);
        assert_eq!(report.exclusions.count(Exclusion::MissingCoordinate), 1);
    }

    #[test]
    fn test_config_errors() {
        let zones = zones();
        let config = OrientationConfig {
            bins: 0,
            ..OrientationConfig::default()
        };
        assert_eq!(
            OrientationAnalysis::new(config, &zones, TargetPoint::new("t", 0.0, 0.0)).unwrap_err(),
            AnalysisConfigError::ZeroBins
        );
    }
}
