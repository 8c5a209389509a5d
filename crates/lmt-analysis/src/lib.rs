//! Event-aligned spatial analyses of tracked individuals
//!
//! This crate works on [`WideTable`](lmt_table::WideTable)s produced by
//! `lmt-table`. Every analysis follows the same pattern: lever-press events are
//! extracted from the table, rows are looked up at fixed offsets around each
//! event, the other individuals' positions are classified into zones, and the
//! resulting samples are aggregated into proportions and contingency tests.
//!
//! # Building Blocks
//!
//! - [`zone`]: Zone registry and point classification
//! - [`align`]: Row lookup at event time + offset, exact or nearest
//! - [`role`]: Role (rank) reference tables and role selections
//! - [`baseline`]: Seeded random row sampling for chance-level distributions
//! - [`exclusion`]: Reasons a sample was dropped, tallied per analysis
//! - [`batch`]: Per-trial parallel execution
//! - [`press`]: Lever-press actors from tracking data when no event log exists
//!
//! # Analyses
//!
//! - [`transition`]: Share of individuals moving from a source zone into the
//!   target zone between a before and an after offset, per role
//! - [`occupancy`]: Zone distribution of selected individuals before and after
//!   events, compared with a random baseline
//! - [`orientation`]: Heading of selected individuals relative to a target
//!   point after events, compared with a random baseline
//! - [`heading`]: Position and heading snapshots around events for vector maps
//!
//! # Configuration Errors
//!
//! Invalid static parameters are reported as [`AnalysisConfigError`] before
//! any data is processed. Missing data never produces an error; it is counted
//! in an [`ExclusionTally`](exclusion::ExclusionTally) instead.
//!
//! # Examples
//!
//! ```
//! use lmt_analysis::{
//!     batch::Trial,
//!     role::RoleAssignment,
//!     transition::{TransitionAggregator, TransitionConfig},
//!     zone::{Zone, ZoneId, ZoneRegistry},
//! };
//! use lmt_table::{Event, IndividualState, Tag, WideRow, WideTable};
//!
//! let at = |x: f64, y: f64| {
//!     Some(IndividualState {
//!         mass_x: Some(x),
//!         mass_y: Some(y),
//!         ..IndividualState::default()
//!     })
//! };
//! let tags = ["X", "Y", "Z"].map(Tag::new).to_vec();
//! let mut table = WideTable::new(
//!     tags,
//!     vec![
//!         WideRow::new(-5_000, vec![None, at(5.0, 5.0), at(25.0, 5.0)])?,
//!         WideRow::new(0, vec![None, None, None])?,
//!         WideRow::new(3_000, vec![None, at(25.0, 5.0), at(25.0, 5.0)])?,
//!     ],
//! )?;
//! table.attach_events(&[Event::lever_press(0, Tag::new("X"))], 0)?;
//!
//! let zones = ZoneRegistry::new(vec![
//!     Zone::new("A", (0.0, 0.0), (10.0, 10.0)),
//!     Zone::new("B", (20.0, 0.0), (30.0, 10.0)),
//! ])?;
//! let config = TransitionConfig {
//!     source_zones: vec![ZoneId::new("A")],
//!     required_individuals: None,
//!     ..TransitionConfig::default()
//! };
//! let roles = RoleAssignment::Positional(vec!["1".to_owned(), "3".to_owned()]);
//! let aggregator = TransitionAggregator::new(config, &zones, roles)?;
//!
//! let outcome = aggregator.run(&[Trial::new("demo", table)]);
//! assert_eq!(outcome.by_role["1"], [true]);
//! assert!(outcome.by_role["3"].is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod align;
pub mod baseline;
pub mod batch;
pub mod exclusion;
pub mod heading;
pub mod occupancy;
pub mod orientation;
pub mod press;
pub mod role;
pub mod transition;
pub mod zone;

mod sampling;

use crate::zone::{ZoneError, ZoneId};

/// Invalid analysis parameters.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AnalysisConfigError {
    #[display("{_0}")]
    Zone(ZoneError),
    #[display("at least one time offset is required")]
    EmptyOffsets,
    #[display("zone {zone} is not in the zone registry")]
    UnknownZone { zone: ZoneId },
    #[display("at least one source zone is required")]
    NoSourceZones,
    #[display("role table is missing the {column} column")]
    MissingRoleColumn { column: &'static str },
    #[display("id suffix length must be positive")]
    ZeroSuffixLength,
    #[display("role selection is empty")]
    EmptyRoleSelection,
    #[display("no individual in the tables has role {selection}")]
    NoMatchingIndividuals { selection: String },
    #[display("baseline sample size must be positive")]
    ZeroSampleSize,
    #[display("angular histogram needs at least one bin")]
    ZeroBins,
    #[display("unknown target {target}")]
    UnknownTarget { target: String },
}

impl From<ZoneError> for AnalysisConfigError {
    fn from(err: ZoneError) -> Self {
        Self::Zone(err)
    }
}
