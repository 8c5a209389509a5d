//! Pearson's chi-squared test of independence on contingency tables
//!
//! Each row of the table is one sample (e.g. "pre-event", "random baseline")
//! and each column one category (e.g. a zone). The test operates on raw
//! counts, never on proportions.
//!
//! # Validity
//!
//! The chi-squared approximation is unreliable when expected cell counts are
//! small. Every test records its smallest expected count, and
//! [`ChiSquaredTest::significance`] reports [`Significance::Unreliable`]
//! instead of a verdict when any expected count is below
//! [`MIN_EXPECTED_COUNT`]. The raw p-value stays available for callers that
//! want it anyway.
//!
//! # Degenerate tables
//!
//! - Categories with no observations in any row carry no information and are
//!   dropped before the test.
//! - A row with no observations at all is an error: there is nothing to compare.
//! - With 2×2 tables (one degree of freedom) Yates' continuity correction is
//!   applied.
//!
//! # Examples
//!
//! ```
//! use lmt_stats::contingency::{ChiSquaredTest, Significance};
//!
//! let pre = [40, 10, 50];
//! let post = [10, 60, 30];
//! let test = ChiSquaredTest::compare(&pre, &post).unwrap();
//! assert_eq!(test.dof, 2);
//! assert_eq!(test.significance(0.05), Significance::Significant);
//! ```

use serde::Serialize;

use crate::special::chi_squared_sf;

/// Smallest expected cell count for which the chi-squared approximation is
/// considered valid.
pub const MIN_EXPECTED_COUNT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ContingencyError {
    #[display("contingency table needs at least two rows, got {rows}")]
    TooFewRows { rows: usize },
    #[display("contingency row {row} has {len} categories, expected {expected}")]
    LengthMismatch {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[display("contingency row {row} has no observations")]
    EmptyRow { row: usize },
}

/// Outcome of a chi-squared significance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    #[display("significant")]
    Significant,
    #[display("not significant")]
    NotSignificant,
    /// Expected counts too low for the approximation to hold.
    #[display("unreliable (low counts)")]
    Unreliable,
}

/// Result of a chi-squared test of independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquaredTest {
    /// Test statistic.
    pub statistic: f64,
    /// Degrees of freedom, `(rows - 1) × (non-empty categories - 1)`.
    pub dof: usize,
    /// Upper-tail probability of `statistic` under independence.
    pub p_value: f64,
    /// Smallest expected cell count among the tested categories.
    pub min_expected: f64,
    /// Whether Yates' continuity correction was applied.
    pub yates_corrected: bool,
}

impl ChiSquaredTest {
    /// Compares two count distributions over the same categories.
    pub fn compare(counts_a: &[usize], counts_b: &[usize]) -> Result<Self, ContingencyError> {
        Self::from_table(&[counts_a, counts_b])
    }

    /// Runs the test on an `r × c` table of counts.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_table(rows: &[&[usize]]) -> Result<Self, ContingencyError> {
        if rows.len() < 2 {
            return Err(ContingencyError::TooFewRows { rows: rows.len() });
        }
        let width = rows[0].len();
        for (row, counts) in rows.iter().enumerate() {
            if counts.len() != width {
                return Err(ContingencyError::LengthMismatch {
                    row,
                    len: counts.len(),
                    expected: width,
                });
            }
        }

        let row_totals = rows
            .iter()
            .map(|counts| counts.iter().sum::<usize>())
            .collect::<Vec<_>>();
        if let Some(row) = row_totals.iter().position(|&total| total == 0) {
            return Err(ContingencyError::EmptyRow { row });
        }

        let columns = (0..width)
            .map(|col| rows.iter().map(|counts| counts[col]).sum::<usize>())
            .enumerate()
            .filter(|(_, total)| *total > 0)
            .collect::<Vec<_>>();

        let grand_total = row_totals.iter().sum::<usize>() as f64;
        let dof = (rows.len() - 1) * columns.len().saturating_sub(1);
        let yates_corrected = dof == 1;

        let mut statistic = 0.0;
        let mut min_expected = f64::INFINITY;
        for (counts, &row_total) in rows.iter().zip(&row_totals) {
            for &(col, col_total) in &columns {
                let expected = row_total as f64 * col_total as f64 / grand_total;
                min_expected = min_expected.min(expected);
                let mut deviation = (counts[col] as f64 - expected).abs();
                if yates_corrected {
                    deviation = (deviation - 0.5).max(0.0);
                }
                statistic += deviation * deviation / expected;
            }
        }

        Ok(Self {
            statistic,
            dof,
            p_value: chi_squared_sf(statistic, dof),
            min_expected,
            yates_corrected,
        })
    }

    /// Whether every expected count reaches [`MIN_EXPECTED_COUNT`].
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.min_expected >= MIN_EXPECTED_COUNT
    }

    /// Classifies the test at significance level `alpha`.
    #[must_use]
    pub fn significance(&self, alpha: f64) -> Significance {
        if !self.is_reliable() {
            Significance::Unreliable
        } else if self.p_value < alpha {
            Significance::Significant
        } else {
            Significance::NotSignificant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_distributions() {
        let test = ChiSquaredTest::compare(&[12, 30, 58], &[12, 30, 58]).unwrap();
        assert!(test.statistic.abs() < 1e-12);
        assert!((test.p_value - 1.0).abs() < 1e-12);
        assert_eq!(test.dof, 2);
        assert!(!test.yates_corrected);
    }

    #[test]
    fn test_proportional_distributions_are_independent() {
        let test = ChiSquaredTest::compare(&[10, 20, 30], &[20, 40, 60]).unwrap();
        assert!((test.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_statistic_without_correction() {
        // Expected counts are all 30; statistic = 2 * (100 + 0 + 100) / 30
        let test = ChiSquaredTest::compare(&[40, 30, 20], &[20, 30, 40]).unwrap();
        assert!((test.statistic - 400.0 / 30.0).abs() < 1e-12);
        assert!((test.p_value - (-test.statistic / 2.0).exp()).abs() < 1e-12);
        assert!(test.is_reliable());
    }

    #[test]
    fn test_yates_correction_for_two_by_two() {
        // Expected counts are all 15; |O - E| = 5 -> 4.5 after correction
        let test = ChiSquaredTest::compare(&[20, 10], &[10, 20]).unwrap();
        assert!(test.yates_corrected);
        assert_eq!(test.dof, 1);
        assert!((test.statistic - 4.0 * 4.5 * 4.5 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_category_is_dropped() {
        let with_gap = ChiSquaredTest::compare(&[40, 0, 20], &[20, 0, 40]).unwrap();
        let without_gap = ChiSquaredTest::compare(&[40, 20], &[20, 40]).unwrap();
        assert_eq!(with_gap, without_gap);
    }

    #[test]
    fn test_low_counts_are_flagged() {
        let test = ChiSquaredTest::compare(&[1, 0, 2], &[0, 3, 1]).unwrap();
        assert!(!test.is_reliable());
        assert_eq!(test.significance(0.05), Significance::Unreliable);
    }

    #[test]
    fn test_significance_levels() {
        let test = ChiSquaredTest::compare(&[90, 10], &[10, 90]).unwrap();
        assert_eq!(test.significance(0.05), Significance::Significant);
        let test = ChiSquaredTest::compare(&[50, 50], &[52, 48]).unwrap();
        assert_eq!(test.significance(0.05), Significance::NotSignificant);
    }

    #[test]
    fn test_invalid_tables() {
        assert_eq!(
            ChiSquaredTest::compare(&[1, 2], &[1, 2, 3]),
            Err(ContingencyError::LengthMismatch {
                row: 1,
                len: 3,
                expected: 2
            })
        );
        assert_eq!(
            ChiSquaredTest::compare(&[0, 0], &[1, 2]),
            Err(ContingencyError::EmptyRow { row: 0 })
        );
        assert_eq!(
            ChiSquaredTest::from_table(&[&[1, 2]]),
            Err(ContingencyError::TooFewRows { rows: 1 })
        );
    }
}
