//! Zone transitions of bystanders around lever presses
//!
//! For every lever press, each other individual is located at
//! `press + before_ms` and at `press + after_ms`. A pair contributes only if
//! the individual started in one of the source zones; it then counts as a
//! transition when it ends in the target zone. Pairs starting anywhere else
//! are left out of the denominator.
//!
//! Results are boolean lists per role plus a combined list, summarized with
//! [`Proportion`].

use std::collections::BTreeMap;

use lmt_stats::proportion::Proportion;
use lmt_table::{IndividualState, Tag};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfigError,
    align::{AlignMode, EventAligner},
    batch::{Trial, map_trials},
    exclusion::{Exclusion, ExclusionTally},
    role::RoleAssignment,
    sampling::{state_at, table_events, valid_mass},
    zone::{ZoneId, ZoneRegistry},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Offset of the starting position, usually negative.
    pub before_ms: i64,
    /// Offset of the end position.
    pub after_ms: i64,
    pub source_zones: Vec<ZoneId>,
    pub target_zone: ZoneId,
    /// Skip trials that do not track exactly this many individuals.
    pub required_individuals: Option<usize>,
    pub mode: AlignMode,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            before_ms: -5_000,
            after_ms: 3_000,
            source_zones: vec![ZoneId::new("A"), ZoneId::new("C")],
            target_zone: ZoneId::new("B"),
            required_individuals: Some(3),
            mode: AlignMode::Exact,
        }
    }
}

/// One contributing (event, individual) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionSample {
    pub trial: String,
    pub event_time_ms: i64,
    pub actor: Tag,
    pub subject: Tag,
    pub role: String,
    pub before_zone: ZoneId,
    pub after_zone: Option<ZoneId>,
    pub transitioned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    /// Outcomes per role label, in event order.
    pub by_role: BTreeMap<String, Vec<bool>>,
    /// Outcomes of every role, in event order.
    pub combined: Vec<bool>,
    pub samples: Vec<TransitionSample>,
    pub exclusions: ExclusionTally,
    /// Trials left out by the individual-count requirement.
    pub skipped_trials: Vec<String>,
}

impl TransitionOutcome {
    /// Appends `other` after the outcomes already collected.
    pub fn merge(&mut self, other: TransitionOutcome) {
        for (role, outcomes) in other.by_role {
            self.by_role.entry(role).or_default().extend(outcomes);
        }
        self.combined.extend(other.combined);
        self.samples.extend(other.samples);
        self.exclusions.merge(&other.exclusions);
        self.skipped_trials.extend(other.skipped_trials);
    }

    #[must_use]
    pub fn summary(&self) -> TransitionSummary {
        let summarize = |outcomes: &[bool]| Proportion::from_outcomes(outcomes.iter().copied());
        TransitionSummary {
            by_role: self
                .by_role
                .iter()
                .map(|(role, outcomes)| (role.clone(), summarize(outcomes)))
                .collect(),
            combined: summarize(&self.combined),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionSummary {
    pub by_role: BTreeMap<String, Proportion>,
    pub combined: Proportion,
}

/// Collects transition outcomes per role.
#[derive(Debug, Clone)]
pub struct TransitionAggregator<'z> {
    config: TransitionConfig,
    zones: &'z ZoneRegistry,
    roles: RoleAssignment,
    sources: Vec<usize>,
    target: usize,
}

impl<'z> TransitionAggregator<'z> {
    pub fn new(
        config: TransitionConfig,
        zones: &'z ZoneRegistry,
        roles: RoleAssignment,
    ) -> Result<Self, AnalysisConfigError> {
        if config.source_zones.is_empty() {
            return Err(AnalysisConfigError::NoSourceZones);
        }
        let index_of = |zone: &ZoneId| {
            zones
                .index_of(zone)
                .ok_or_else(|| AnalysisConfigError::UnknownZone { zone: zone.clone() })
        };
        let sources = config
            .source_zones
            .iter()
            .map(index_of)
            .collect::<Result<Vec<_>, _>>()?;
        let target = index_of(&config.target_zone)?;
        Ok(Self {
            config,
            zones,
            roles,
            sources,
            target,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Analyzes every trial in parallel and merges the outcomes in trial
    /// order.
    #[must_use]
    pub fn run(&self, trials: &[Trial]) -> TransitionOutcome {
        let mut outcome = self.empty_outcome();
        for partial in map_trials(trials, |trial| self.aggregate(trial)) {
            outcome.merge(partial);
        }
        tracing::info!(
            trials = trials.len(),
            skipped = outcome.skipped_trials.len(),
            samples = outcome.combined.len(),
            excluded = outcome.exclusions.total(),
            "transition analysis finished"
        );
        outcome
    }

    /// Analyzes a single trial.
    #[must_use]
    pub fn aggregate(&self, trial: &Trial) -> TransitionOutcome {
        let mut outcome = self.empty_outcome();
        let table = &trial.table;

        if let Some(required) = self.config.required_individuals
            && table.tags().len() != required
        {
            tracing::warn!(
                trial = %trial.name,
                individuals = table.tags().len(),
                required,
                "skipping trial with unexpected number of individuals"
            );
            outcome.skipped_trials.push(trial.name.clone());
            return outcome;
        }

        let events = table_events(table, &mut outcome.exclusions);
        let aligner = EventAligner::new(table, self.config.mode);
        for event in &events {
            let before = event.timestamp_ms.saturating_add(self.config.before_ms);
            let after = event.timestamp_ms.saturating_add(self.config.after_ms);
            let (Some(before_row), Some(after_row)) = (aligner.row_at(before), aligner.row_at(after))
            else {
                outcome.exclusions.record(Exclusion::MissingRow);
                continue;
            };

            for (subject, role) in self.roles.assign(table.tags(), &event.actor) {
                let Some(role) = role else {
                    outcome.exclusions.record(Exclusion::NoRole);
                    continue;
                };
                let Some(col) = table.tag_index(&subject) else {
                    continue;
                };
                let located = self.locate_pair(
                    state_at(Some(before_row), col),
                    state_at(Some(after_row), col),
                );
                let (before_zone, after_zone) = match located {
                    Ok(zones) => zones,
                    Err(reason) => {
                        outcome.exclusions.record(reason);
                        continue;
                    }
                };

                let transitioned = after_zone == Some(self.target);
                outcome
                    .by_role
                    .entry(role.clone())
                    .or_default()
                    .push(transitioned);
                outcome.combined.push(transitioned);
                outcome.samples.push(TransitionSample {
                    trial: trial.name.clone(),
                    event_time_ms: event.timestamp_ms,
                    actor: event.actor.clone(),
                    subject,
                    role,
                    before_zone: self.zone_id(before_zone),
                    after_zone: after_zone.map(|idx| self.zone_id(idx)),
                    transitioned,
                });
            }
        }

        tracing::debug!(
            trial = %trial.name,
            events = events.len(),
            samples = outcome.combined.len(),
            excluded = outcome.exclusions.total(),
            "aggregated transitions"
        );
        outcome
    }

    fn empty_outcome(&self) -> TransitionOutcome {
        TransitionOutcome {
            by_role: self
                .roles
                .labels()
                .into_iter()
                .map(|label| (label, Vec::new()))
                .collect(),
            ..TransitionOutcome::default()
        }
    }

    fn zone_id(&self, idx: usize) -> ZoneId {
        self.zones.zones()[idx].name.clone()
    }

    /// Starting zone (a source zone) and ending zone of one individual.
    fn locate_pair(
        &self,
        before: Result<&IndividualState, Exclusion>,
        after: Result<&IndividualState, Exclusion>,
    ) -> Result<(usize, Option<usize>), Exclusion> {
        let (bx, by) = valid_mass(before?)?;
        let (ax, ay) = valid_mass(after?)?;
        let before_zone = self
            .zones
            .classify_index(bx, by)
            .ok_or(Exclusion::OutsideZone)?;
        if !self.sources.contains(&before_zone) {
            return Err(Exclusion::OutsideSourceZone);
        }
        Ok((before_zone, self.zones.classify_index(ax, ay)))
    }
}
