//! Position and heading snapshots around lever presses
//!
//! Used to draw vector maps: for each press and each offset, every individual
//! other than the actor contributes its center of mass and heading.

use lmt_table::Tag;
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfigError,
    align::{AlignMode, EventAligner},
    batch::{Trial, map_trials},
    exclusion::{Exclusion, ExclusionTally},
    sampling::{state_at, table_events},
};

/// Arrow length used when rendering headings, in arena units.
pub const ARROW_LENGTH: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    pub offsets: Vec<i64>,
    pub mode: AlignMode,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            offsets: vec![-2_000, 0, 2_000],
            mode: AlignMode::Nearest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingSample {
    pub trial: String,
    pub offset_ms: i64,
    pub event_time_ms: i64,
    pub actor: Tag,
    pub tag: Tag,
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub direction: f64,
}

impl HeadingSample {
    /// End point of an arrow of `length` starting at the center of mass.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_analysis::heading::HeadingSample;
    /// # use lmt_table::Tag;
    /// let sample = HeadingSample {
    ///     trial: "t".to_owned(),
    ///     offset_ms: 0,
    ///     event_time_ms: 0,
    ///     actor: Tag::new("A"),
    ///     tag: Tag::new("B"),
    ///     x: 1.0,
    ///     y: 2.0,
    ///     direction: 0.0,
    /// };
    /// assert_eq!(sample.arrow_tip(10.0), (11.0, 2.0));
    /// ```
    #[must_use]
    pub fn arrow_tip(&self, length: f64) -> (f64, f64) {
        let (sin, cos) = self.direction.sin_cos();
        (self.x + length * cos, self.y + length * sin)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadingSnapshots {
    /// Ordered by trial, event, offset, then tag column.
    pub samples: Vec<HeadingSample>,
    pub exclusions: ExclusionTally,
}

impl HeadingSnapshots {
    pub fn merge(&mut self, other: HeadingSnapshots) {
        self.samples.extend(other.samples);
        self.exclusions.merge(&other.exclusions);
    }
}

#[derive(Debug, Clone)]
pub struct HeadingCollector {
    config: HeadingConfig,
}

impl HeadingCollector {
    pub fn new(config: HeadingConfig) -> Result<Self, AnalysisConfigError> {
        if config.offsets.is_empty() {
            return Err(AnalysisConfigError::EmptyOffsets);
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &HeadingConfig {
        &self.config
    }

    pub fn run(&self, trials: &[Trial]) -> Result<HeadingSnapshots, AnalysisConfigError> {
        let mut snapshots = HeadingSnapshots::default();
        for partial in map_trials(trials, |trial| self.collect(trial)) {
            snapshots.merge(partial?);
        }
        tracing::info!(
            trials = trials.len(),
            samples = snapshots.samples.len(),
            excluded = snapshots.exclusions.total(),
            "heading snapshots collected"
        );
        Ok(snapshots)
    }

    pub fn collect(&self, trial: &Trial) -> Result<HeadingSnapshots, AnalysisConfigError> {
        let table = &trial.table;
        let mut snapshots = HeadingSnapshots::default();
        let events = table_events(table, &mut snapshots.exclusions);
        let aligner = EventAligner::new(table, self.config.mode);

        for aligned in aligner.align(&events, &self.config.offsets)? {
            let event = aligned.event;
            for (&offset_ms, row) in self.config.offsets.iter().zip(&aligned.rows) {
                if row.is_none() {
                    snapshots.exclusions.record(Exclusion::MissingRow);
                    continue;
                }
                for (col, tag) in table.tags().iter().enumerate() {
                    if *tag == event.actor {
                        continue;
                    }
                    let pose = state_at(*row, col).and_then(|state| {
                        let (x, y) = state.mass().ok_or(Exclusion::MissingCoordinate)?;
                        let direction = state
                            .direction
                            .filter(|d| !d.is_nan())
                            .ok_or(Exclusion::MissingCoordinate)?;
                        Ok((x, y, direction))
                    });
                    match pose {
                        Ok((x, y, direction)) => snapshots.samples.push(HeadingSample {
                            trial: trial.name.clone(),
                            offset_ms,
                            event_time_ms: event.timestamp_ms,
                            actor: event.actor.clone(),
                            tag: tag.clone(),
                            x,
                            y,
                            direction,
                        }),
                        Err(reason) => snapshots.exclusions.record(reason),
                    }
                }
            }
        }

        tracing::debug!(
            trial = %trial.name,
            events = events.len(),
            samples = snapshots.samples.len(),
            "collected heading snapshots"
        );
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use lmt_table::{Event, IndividualState, WideRow, WideTable};

    use super::*;

    fn pose(x: f64, y: f64, direction: Option<f64>) -> Option<IndividualState> {
        Some(IndividualState {
            mass_x: Some(x),
            mass_y: Some(y),
            direction,
            ..IndividualState::default()
        })
    }

    fn trial() -> Trial {
        let tags = ["X", "Y"].map(Tag::new).to_vec();
        let rows = vec![
            WideRow::new(-2_200, vec![None, pose(1.0, 1.0, Some(0.0))]).unwrap(),
            WideRow::new(0, vec![pose(9.0, 9.0, Some(1.0)), pose(2.0, 2.0, None)]).unwrap(),
            WideRow::new(1_800, vec![None, pose(3.0, 3.0, Some(FRAC_PI_2))]).unwrap(),
        ];
        let mut table = WideTable::new(tags, rows).unwrap();
        table
            .attach_events(&[Event::lever_press(0, Tag::new("X"))], 0)
            .unwrap();
        Trial::new("t", table)
    }

    #[test]
    fn test_nearest_snapshots_skip_actor() {
        let collector = HeadingCollector::new(HeadingConfig::default()).unwrap();
        let snapshots = collector.run(&[trial()]).unwrap();

        let offsets = snapshots
            .samples
            .iter()
            .map(|sample| sample.offset_ms)
            .collect::<Vec<_>>();
        assert_eq!(offsets, [-2_000, 2_000]);
        assert!(snapshots.samples.iter().all(|s| s.tag == Tag::new("Y")));
        assert_eq!(snapshots.samples[0].x, 1.0);
        // Y has no heading at the press itself
        assert_eq!(snapshots.exclusions.count(Exclusion::MissingCoordinate), 1);

        let (tip_x, tip_y) = snapshots.samples[1].arrow_tip(ARROW_LENGTH);
        assert!((tip_x - 3.0).abs() < 1e-9);
        assert!((tip_y - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_offsets() {
        let config = HeadingConfig {
            offsets: vec![],
            ..HeadingConfig::default()
        };
        assert_eq!(
            HeadingCollector::new(config).unwrap_err(),
            AnalysisConfigError::EmptyOffsets
        );
    }
}
