//! Time-offset lookups of table rows around events
//!
//! For an event at time `t` and an offset `o`, [`EventAligner`] finds the row
//! sampled at `t + o`. Two lookup modes exist:
//!
//! - [`AlignMode::Exact`]: the row whose timestamp equals `t + o`
//! - [`AlignMode::Nearest`]: the row whose timestamp is closest to `t + o`
//!
//! A failed lookup is not an error; the caller counts it as a missing row.
//! When several rows share a timestamp (stacked tables), the first one in
//! table order is used.
//!
//! # Examples
//!
//! ```
//! use lmt_analysis::align::{AlignMode, EventAligner};
//! use lmt_table::{Event, Tag, WideRow, WideTable};
//!
//! let rows = vec![WideRow::new(1_000, vec![None])?];
//! let table = WideTable::new(vec![Tag::new("X")], rows)?;
//! let events = [Event::lever_press(0, Tag::new("X"))];
//!
//! let aligner = EventAligner::new(&table, AlignMode::Exact);
//! let aligned = aligner.align(&events, &[1_000, 999])?;
//! assert!(aligned[0].rows[0].is_some());
//! assert!(aligned[0].rows[1].is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use lmt_table::{Event, WideRow, WideTable};
use serde::{Deserialize, Serialize};

use crate::AnalysisConfigError;

/// Row lookup strategy.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    /// Timestamp must match exactly.
    #[default]
    #[display("exact")]
    Exact,
    /// Closest timestamp; ties go to the earlier one.
    #[display("nearest")]
    Nearest,
}

/// Rows of one event at each requested offset.
#[derive(Debug, Clone)]
pub struct AlignedEvent<'a> {
    pub event: &'a Event,
    /// Parallel to the offsets passed to [`EventAligner::align`].
    pub rows: Vec<Option<&'a WideRow>>,
}

/// Read-only timestamp index over a [`WideTable`].
#[derive(Debug, Clone)]
pub struct EventAligner<'a> {
    table: &'a WideTable,
    mode: AlignMode,
    first_row_at: BTreeMap<i64, usize>,
}

impl<'a> EventAligner<'a> {
    #[must_use]
    pub fn new(table: &'a WideTable, mode: AlignMode) -> Self {
        let mut first_row_at = BTreeMap::new();
        for (idx, row) in table.rows().iter().enumerate() {
            first_row_at.entry(row.timestamp_ms).or_insert(idx);
        }
        Self {
            table,
            mode,
            first_row_at,
        }
    }

    #[must_use]
    pub fn table(&self) -> &'a WideTable {
        self.table
    }

    #[must_use]
    pub fn mode(&self) -> AlignMode {
        self.mode
    }

    /// Row for `timestamp_ms` under the configured mode.
    #[must_use]
    pub fn row_at(&self, timestamp_ms: i64) -> Option<&'a WideRow> {
        let idx = match self.mode {
            AlignMode::Exact => self.first_row_at.get(&timestamp_ms).copied(),
            AlignMode::Nearest => {
                let before = self.first_row_at.range(..=timestamp_ms).next_back();
                let after = self.first_row_at.range(timestamp_ms..).next();
                match (before, after) {
                    (Some((&t0, &i0)), Some((&t1, &i1))) => {
                        if timestamp_ms.abs_diff(t0) <= t1.abs_diff(timestamp_ms) {
                            Some(i0)
                        } else {
                            Some(i1)
                        }
                    }
                    (Some((_, &idx)), None) | (None, Some((_, &idx))) => Some(idx),
                    (None, None) => None,
                }
            }
        };
        idx.map(|idx| &self.table.rows()[idx])
    }

    /// Looks up the row of every event at every offset.
    ///
    /// Fails only if `offsets` is empty.
    pub fn align(
        &self,
        events: &'a [Event],
        offsets: &[i64],
    ) -> Result<Vec<AlignedEvent<'a>>, AnalysisConfigError> {
        if offsets.is_empty() {
            return Err(AnalysisConfigError::EmptyOffsets);
        }
        Ok(events
            .iter()
            .map(|event| AlignedEvent {
                event,
                rows: offsets
                    .iter()
                    .map(|&offset| self.row_at(event.timestamp_ms.saturating_add(offset)))
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use lmt_table::{IndividualState, Tag};

    use super::*;

    fn table(timestamps: &[i64]) -> WideTable {
        let rows = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| {
                let state = IndividualState {
                    mass_x: Some(f64::from(u32::try_from(i).unwrap())),
                    ..IndividualState::default()
                };
                WideRow::new(ts, vec![Some(state)]).unwrap()
            })
            .collect();
        WideTable::new(vec![Tag::new("X")], rows).unwrap()
    }

    fn mass_x(row: Option<&WideRow>) -> Option<f64> {
        row?.states[0]?.mass_x
    }

    #[test]
    fn test_exact_lookup() {
        let table = table(&[0, 1_000, 2_000]);
        let events = [Event::lever_press(0, Tag::new("X"))];
        let aligner = EventAligner::new(&table, AlignMode::Exact);
        let aligned = aligner.align(&events, &[1_000, 999, -5_000]).unwrap();
        assert_eq!(aligned.len(), 1);
        assert_eq!(mass_x(aligned[0].rows[0]), Some(1.0));
        assert!(aligned[0].rows[1].is_none());
        assert!(aligned[0].rows[2].is_none());
    }

    #[test]
    fn test_duplicate_timestamps_take_first_row() {
        let table = table(&[0, 1_000, 0, 1_000]);
        let aligner = EventAligner::new(&table, AlignMode::Exact);
        assert_eq!(mass_x(aligner.row_at(1_000)), Some(1.0));
        assert_eq!(mass_x(aligner.row_at(0)), Some(0.0));
    }

    #[test]
    fn test_nearest_lookup() {
        let table = table(&[0, 200, 400]);
        let aligner = EventAligner::new(&table, AlignMode::Nearest);
        assert_eq!(mass_x(aligner.row_at(290)), Some(1.0));
        assert_eq!(mass_x(aligner.row_at(310)), Some(2.0));
        // Equidistant resolves to the earlier row
        assert_eq!(mass_x(aligner.row_at(300)), Some(1.0));
        assert_eq!(mass_x(aligner.row_at(-10_000)), Some(0.0));
        assert_eq!(mass_x(aligner.row_at(10_000)), Some(2.0));
    }

    #[test]
    fn test_nearest_on_empty_table() {
        let table = table(&[]);
        let aligner = EventAligner::new(&table, AlignMode::Nearest);
        assert!(aligner.row_at(0).is_none());
    }

    #[test]
    fn test_empty_offsets_is_a_config_error() {
        let table = table(&[0]);
        let aligner = EventAligner::new(&table, AlignMode::Exact);
        assert_eq!(
            aligner.align(&[], &[]).unwrap_err(),
            AnalysisConfigError::EmptyOffsets
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("nearest".parse::<AlignMode>().unwrap(), AlignMode::Nearest);
        assert_eq!(AlignMode::Exact.to_string(), "exact");
    }
}
