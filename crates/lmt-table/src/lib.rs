//! Tracking data model and preprocessing.
//!
//! This crate turns raw per-frame detections into the per-timestamp wide table
//! that the analyses consume:
//!
//! - [`Detection`] - One tracked individual in one video frame
//! - [`TimeBinner`] - Averages detections into fixed-width time bins
//! - [`WideTableBuilder`] - Pivots binned records into a [`WideTable`], one row per bin
//! - [`IdentityMap`] - Resolves transient numeric ids into persistent [`Tag`]s
//! - [`EventLog`] - Reads and writes the lever event log, yielding [`Event`]s
//!
//! # Pipeline
//!
//! ```
//! use lmt_table::{
//!     BinningConfig, Detection, Event, IdentityMap, Tag, TimeBinner, WideTableBuilder,
//! };
//!
//! let detections = vec![
//!     Detection::new(0, 1, 1_000).with_mass(10.0, 20.0),
//!     Detection::new(1, 1, 1_120).with_mass(12.0, 22.0),
//!     Detection::new(1, 2, 1_120).with_mass(50.0, 60.0),
//! ];
//!
//! let binner = TimeBinner::new(BinningConfig::default())?;
//! let records = binner.bin(&detections);
//!
//! let mut table = WideTableBuilder::new().build(&records)?;
//! assert_eq!(table.rows().len(), 1);
//!
//! let identities = IdentityMap::from_iter([(1, Tag::new("900000000001"))]);
//! table = table.resolve_tags(&identities)?;
//! assert_eq!(table.tags()[0].as_str(), "900000000001");
//! assert_eq!(table.tags()[1].as_str(), "2");
//!
//! let press = Event::lever_press(1_000, Tag::new("2"));
//! let report = table.attach_events(&[press], 0)?;
//! assert_eq!(report.matched, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{binning::*, detection::*, event::*, tag::*, time::*, wide_table::*};

mod binning;
mod detection;
mod event;
mod tag;
mod time;
mod wide_table;

/// Invalid static parameters, reported before any data is processed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("bin width must be positive, got {bin_width_ms} ms")]
    NonPositiveBinWidth { bin_width_ms: i64 },
    #[display("join tolerance must not be negative, got {tolerance_ms} ms")]
    NegativeTolerance { tolerance_ms: i64 },
}

/// Failure to build or reshape a wide table.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("{_0}")]
    Config(ConfigError),
    #[display("tag {tag} is assigned to more than one individual")]
    DuplicateTag { tag: Tag },
    #[display("timestamp {timestamp_ms} ms is out of the representable date range")]
    TimestampOutOfRange { timestamp_ms: i64 },
    #[display("row {row} has {len} individual states, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        len: usize,
        expected: usize,
    },
}

impl From<ConfigError> for TableError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
