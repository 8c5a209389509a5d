//! Bookkeeping for samples dropped from aggregation
//!
//! Tracking data is sparse, so a missing row or coordinate never aborts an
//! analysis. The sample is dropped and the reason is counted in an
//! [`ExclusionTally`] that travels with the result.

use std::collections::BTreeMap;

use serde::Serialize;

/// Reason a sample did not contribute to an aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// No table row at the aligned timestamp.
    #[display("missing row")]
    MissingRow,
    /// The individual was not observed, or a coordinate is `NaN`.
    #[display("missing coordinate")]
    MissingCoordinate,
    /// A coordinate is negative (undetected).
    #[display("negative coordinate")]
    NegativeCoordinate,
    /// The event's actor has no column in the table.
    #[display("unknown actor")]
    UnknownActor,
    /// The individual has no role.
    #[display("no role")]
    NoRole,
    /// The position is not inside any zone.
    #[display("outside every zone")]
    OutsideZone,
    /// The starting zone is not one of the allowed source zones.
    #[display("outside source zones")]
    OutsideSourceZone,
    /// A direction vector has zero length.
    #[display("degenerate vector")]
    DegenerateVector,
}

/// Count of dropped samples per [`Exclusion`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExclusionTally {
    counts: BTreeMap<Exclusion, usize>,
}

impl ExclusionTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: Exclusion) {
        self.record_many(reason, 1);
    }

    pub fn record_many(&mut self, reason: Exclusion, count: usize) {
        if count > 0 {
            *self.counts.entry(reason).or_default() += count;
        }
    }

    #[must_use]
    pub fn count(&self, reason: Exclusion) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn merge(&mut self, other: &ExclusionTally) {
        for (reason, count) in other.iter() {
            self.record_many(reason, count);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Exclusion, usize)> + '_ {
        self.counts.iter().map(|(&reason, &count)| (reason, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = ExclusionTally::new();
        a.record(Exclusion::MissingRow);
        a.record(Exclusion::MissingRow);
        let mut b = ExclusionTally::new();
        b.record(Exclusion::NoRole);
        b.record(Exclusion::MissingRow);

        a.merge(&b);
        assert_eq!(a.count(Exclusion::MissingRow), 3);
        assert_eq!(a.count(Exclusion::NoRole), 1);
        assert_eq!(a.count(Exclusion::OutsideZone), 0);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn test_json_form() {
        let mut tally = ExclusionTally::new();
        tally.record(Exclusion::OutsideSourceZone);
        assert_eq!(
            serde_json::to_string(&tally).unwrap(),
            r#"{"outside_source_zone":1}"#
        );
    }
}
