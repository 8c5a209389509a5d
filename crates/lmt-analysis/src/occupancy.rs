//! Zone occupancy of selected individuals around lever presses
//!
//! Subjects are the individuals whose role is in the selection. For every
//! press by a selected individual, every other selected individual is located
//! at `press + pre_ms` and at `press + post_ms`. A seeded random sample of
//! rows over all individuals gives the chance-level distribution.
//!
//! The three distributions are compared pairwise with a chi-squared test.
//! Comparisons are only reported when all three distributions hold at least
//! one sample; otherwise the report is marked as insufficient data.

use lmt_stats::{
    contingency::{ChiSquaredTest, Significance},
    proportion::{Proportion, category_proportions},
};
use lmt_table::{Tag, WideRow, WideTable};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfigError,
    align::{AlignMode, EventAligner},
    baseline::BaselineConfig,
    batch::{Trial, map_trials},
    exclusion::{Exclusion, ExclusionTally},
    role::{RoleSelection, RoleTable},
    sampling::{selected_tags, state_at, table_events, valid_mass},
    zone::{ZoneId, ZoneRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    pub pre_ms: i64,
    pub post_ms: i64,
    pub mode: AlignMode,
    pub baseline: BaselineConfig,
    /// Significance level of the chi-squared comparisons.
    pub alpha: f64,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            pre_ms: -5_000,
            post_ms: 5_000,
            mode: AlignMode::Exact,
            baseline: BaselineConfig::default(),
            alpha: 0.05,
        }
    }
}

/// Sample counts per zone, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDistribution {
    pub counts: Vec<usize>,
    pub proportions: Vec<Proportion>,
}

impl ZoneDistribution {
    #[must_use]
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let proportions = category_proportions(&counts);
        Self {
            counts,
            proportions,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Chi-squared comparison of two named distributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub first: String,
    pub second: String,
    pub test: ChiSquaredTest,
    pub significance: Significance,
}

impl Comparison {
    /// Compares two distributions over the same zones.
    ///
    /// Returns `None` (with a warning) when the table is degenerate.
    #[must_use]
    pub fn between(
        (first, a): (&str, &ZoneDistribution),
        (second, b): (&str, &ZoneDistribution),
        alpha: f64,
    ) -> Option<Self> {
        match ChiSquaredTest::compare(&a.counts, &b.counts) {
            Ok(test) => Some(Self {
                first: first.to_owned(),
                second: second.to_owned(),
                significance: test.significance(alpha),
                test,
            }),
            Err(err) => {
                tracing::warn!(first, second, %err, "skipping comparison");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyReport {
    pub selection: String,
    pub subjects: Vec<Tag>,
    pub zones: Vec<ZoneId>,
    /// Presses by selected individuals.
    pub events: usize,
    pub pre: ZoneDistribution,
    pub post: ZoneDistribution,
    pub random: ZoneDistribution,
    /// Empty when `insufficient_data` is set.
    pub comparisons: Vec<Comparison>,
    pub insufficient_data: bool,
    pub exclusions: ExclusionTally,
    pub baseline_exclusions: ExclusionTally,
}

#[derive(Debug, Clone, Default)]
struct TrialCounts {
    events: usize,
    pre: Vec<usize>,
    post: Vec<usize>,
    exclusions: ExclusionTally,
}

#[derive(Debug, Clone)]
pub struct OccupancyAnalysis<'z> {
    config: OccupancyConfig,
    zones: &'z ZoneRegistry,
}

impl<'z> OccupancyAnalysis<'z> {
    pub fn new(config: OccupancyConfig, zones: &'z ZoneRegistry) -> Result<Self, AnalysisConfigError> {
        config.baseline.validate()?;
        Ok(Self { config, zones })
    }

    #[must_use]
    pub fn config(&self) -> &OccupancyConfig {
        &self.config
    }

    pub fn run(
        &self,
        trials: &[Trial],
        roles: &RoleTable,
        selection: &RoleSelection,
    ) -> Result<OccupancyReport, AnalysisConfigError> {
        let subjects = selected_tags(trials, roles, selection)?;

        let mut pre = vec![0; self.zones.len()];
        let mut post = vec![0; self.zones.len()];
        let mut events = 0;
        let mut exclusions = ExclusionTally::new();
        for counts in map_trials(trials, |trial| self.count_trial(trial, &subjects)) {
            events += counts.events;
            add_counts(&mut pre, &counts.pre);
            add_counts(&mut post, &counts.post);
            exclusions.merge(&counts.exclusions);
        }

        let tables = trials
            .iter()
            .map(|trial| trial.table.clone())
            .collect::<Vec<_>>();
        let combined = WideTable::concat(&tables);
        let mut baseline_exclusions = ExclusionTally::new();
        let random = self.count_baseline(&combined, &mut baseline_exclusions);

        let pre = ZoneDistribution::from_counts(pre);
        let post = ZoneDistribution::from_counts(post);
        let random = ZoneDistribution::from_counts(random);
        let insufficient_data = pre.is_empty() || post.is_empty() || random.is_empty();
        let comparisons = if insufficient_data {
            tracing::warn!(
                pre = pre.total(),
                post = post.total(),
                random = random.total(),
                "insufficient data for occupancy comparisons"
            );
            Vec::new()
        } else {
            let alpha = self.config.alpha;
            [
                (("pre", &pre), ("post", &post)),
                (("pre", &pre), ("random", &random)),
                (("post", &post), ("random", &random)),
            ]
            .into_iter()
            .filter_map(|(a, b)| Comparison::between(a, b, alpha))
            .collect()
        };

        tracing::info!(
            trials = trials.len(),
            events,
            pre = pre.total(),
            post = post.total(),
            random = random.total(),
            excluded = exclusions.total(),
            "occupancy analysis finished"
        );
        Ok(OccupancyReport {
            selection: selection.to_string(),
            subjects,
            zones: self.zones.ids().cloned().collect(),
            events,
            pre,
            post,
            random,
            comparisons,
            insufficient_data,
            exclusions,
            baseline_exclusions,
        })
    }

    fn count_trial(&self, trial: &Trial, subjects: &[Tag]) -> TrialCounts {
        let table = &trial.table;
        let mut counts = TrialCounts {
            pre: vec![0; self.zones.len()],
            post: vec![0; self.zones.len()],
            ..TrialCounts::default()
        };
        let aligner = EventAligner::new(table, self.config.mode);

        for event in table_events(table, &mut counts.exclusions) {
            if !subjects.contains(&event.actor) {
                continue;
            }
            counts.events += 1;
            let others = subjects
                .iter()
                .filter(|tag| **tag != event.actor)
                .filter_map(|tag| table.tag_index(tag))
                .collect::<Vec<_>>();
            for (offset, zone_counts) in [
                (self.config.pre_ms, &mut counts.pre),
                (self.config.post_ms, &mut counts.post),
            ] {
                let row = aligner.row_at(event.timestamp_ms.saturating_add(offset));
                if row.is_none() {
                    counts.exclusions.record(Exclusion::MissingRow);
                    continue;
                }
                for &col in &others {
                    match self.locate(row, col) {
                        Ok(zone) => zone_counts[zone] += 1,
                        Err(reason) => counts.exclusions.record(reason),
                    }
                }
            }
        }

        tracing::debug!(
            trial = %trial.name,
            events = counts.events,
            excluded = counts.exclusions.total(),
            "counted occupancy"
        );
        counts
    }

    fn count_baseline(&self, table: &WideTable, exclusions: &mut ExclusionTally) -> Vec<usize> {
        let mut counts = vec![0; self.zones.len()];
        for row in self.config.baseline.sample_rows(table) {
            for col in 0..table.tags().len() {
                match self.locate(Some(row), col) {
                    Ok(zone) => counts[zone] += 1,
                    Err(reason) => exclusions.record(reason),
                }
            }
        }
        counts
    }

    fn locate(&self, row: Option<&WideRow>, col: usize) -> Result<usize, Exclusion> {
        let (x, y) = valid_mass(state_at(row, col)?)?;
        self.zones.classify_index(x, y).ok_or(Exclusion::OutsideZone)
    }
}

fn add_counts(total: &mut [usize], counts: &[usize]) {
    for (total, count) in total.iter_mut().zip(counts) {
        *total += count;
    }
}

#[cfg(test)]
mod tests {
    use lmt_table::{Event, IndividualState};

    use super::*;
    use crate::zone::Zone;

    fn at(x: f64, y: f64) -> Option<IndividualState> {
        Some(IndividualState {
            mass_x: Some(x),
            mass_y: Some(y),
            ..IndividualState::default()
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
        RoleTable::from_csv("ID_Animal,rank\n001,1\n002,1\n003,2\n", 3).unwrap()
    }

    fn trial() -> Trial {
        let tags = ["000000000001", "000000000002", "000000000003"]
            .map(Tag::new)
            .to_vec();
        let rows = vec![
            WideRow::new(-5_000, vec![at(5.0, 5.0), at(5.0, 5.0), at(25.0, 5.0)]).unwrap(),
            WideRow::new(0, vec![None, None, None]).unwrap(),
            WideRow::new(5_000, vec![at(5.0, 5.0), at(25.0, 5.0), at(25.0, 5.0)]).unwrap(),
        ];
        let mut table = WideTable::new(tags, rows).unwrap();
        table
            .attach_events(
                &[
                    Event::lever_press(0, Tag::new("000000000001")),
                    Event::lever_press(5_000, Tag::new("000000000003")),
                ],
                0,
            )
            .unwrap();
        Trial::new("t", table)
    }

    #[test]
    fn test_pre_and_post_counts() {
        let zones = zones();
        let analysis = OccupancyAnalysis::new(OccupancyConfig::default(), &zones).unwrap();
        let report = analysis
            .run(&[trial()], &roles(), &RoleSelection::new(["1"]))
            .unwrap();

        assert_eq!(report.subjects.len(), 2);
        // The press by the rank 2 individual is ignored
        assert_eq!(report.events, 1);
        assert_eq!(report.pre.counts, [1, 0]);
        assert_eq!(report.post.counts, [0, 1]);
        // Every row is drawn: 3 rows with 3 individuals, minus the empty row
        assert_eq!(report.random.counts, [3, 3]);
        assert_eq!(report.baseline_exclusions.count(Exclusion::MissingCoordinate), 3);
        assert!(!report.insufficient_data);
        assert_eq!(report.comparisons.len(), 3);
        assert_eq!(report.comparisons[0].first, "pre");
        assert_eq!(report.comparisons[2].second, "random");
    }

    #[test]
    fn test_insufficient_data() {
        let zones = zones();
        let config = OccupancyConfig {
            pre_ms: -1_000,
            ..OccupancyConfig::default()
        };
        let analysis = OccupancyAnalysis::new(config, &zones).unwrap();
        let report = analysis
            .run(&[trial()], &roles(), &RoleSelection::new(["1"]))
            .unwrap();
        assert!(report.pre.is_empty());
        assert!(report.insufficient_data);
        assert!(report.comparisons.is_empty());
        assert_eq!(report.exclusions.count(Exclusion::MissingRow), 1);
    }

    #[test]
    fn test_selection_errors() {
        let zones = zones();
        let analysis = OccupancyAnalysis::new(OccupancyConfig::default(), &zones).unwrap();
        assert_eq!(
            analysis.run(&[trial()], &roles(), &RoleSelection::new(["4"])),
            Err(AnalysisConfigError::NoMatchingIndividuals {
                selection: "4".to_owned()
            })
        );
        assert_eq!(
            analysis.run(&[trial()], &roles(), &RoleSelection::new(Vec::<String>::new())),
            Err(AnalysisConfigError::EmptyRoleSelection)
        );
    }

    #[test]
    fn test_zero_baseline_is_rejected() {
        let zones = zones();
        let config = OccupancyConfig {
            baseline: BaselineConfig {
                sample_size: 0,
                seed: 1,
            },
            ..OccupancyConfig::default()
        };
        assert!(OccupancyAnalysis::new(config, &zones).is_err());
    }
}
