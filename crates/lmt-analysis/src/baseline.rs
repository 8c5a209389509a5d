use lmt_table::{WideRow, WideTable};
use rand::{SeedableRng as _, seq::index};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::AnalysisConfigError;

/// Random-baseline sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Number of rows drawn without replacement.
    pub sample_size: usize,
    pub seed: u64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            sample_size: 10_000,
            seed: 42,
        }
    }
}

impl BaselineConfig {
    pub fn validate(&self) -> Result<(), AnalysisConfigError> {
        if self.sample_size == 0 {
            return Err(AnalysisConfigError::ZeroSampleSize);
        }
        Ok(())
    }

    /// Draws rows of `table` uniformly without replacement.
    ///
    /// The same seed and table always yield the same rows in the same order.
    /// When the table is smaller than the sample size every row is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_analysis::baseline::BaselineConfig;
    /// # use lmt_table::{Tag, WideRow, WideTable};
    /// let rows = (0..100)
    ///     .map(|i| WideRow::new(i * 200, vec![None]))
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// let table = WideTable::new(vec![Tag::new("A")], rows)?;
    ///
    /// let config = BaselineConfig { sample_size: 10, seed: 7 };
    /// let first = config.sample_rows(&table);
    /// let second = config.sample_rows(&table);
    /// assert_eq!(first.len(), 10);
    /// assert_eq!(first, second);
    /// # Ok::<(), lmt_table::TableError>(())
    /// ```
    #[must_use]
    pub fn sample_rows<'a>(&self, table: &'a WideTable) -> Vec<&'a WideRow> {
        let rows = table.rows();
        let amount = self.sample_size.min(rows.len());
        if amount < self.sample_size {
            tracing::warn!(
                requested = self.sample_size,
                available = rows.len(),
                "baseline sample larger than table, using every row"
            );
        }
        let mut rng = Pcg32::seed_from_u64(self.seed);
        index::sample(&mut rng, rows.len(), amount)
            .into_iter()
            .map(|idx| &rows[idx])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use lmt_table::Tag;

    use super::*;

    fn table(len: i64) -> WideTable {
        let rows = (0..len)
            .map(|i| WideRow::new(i, vec![None]).unwrap())
            .collect();
        WideTable::new(vec![Tag::new("A")], rows).unwrap()
    }

    fn timestamps(rows: &[&WideRow]) -> Vec<i64> {
        rows.iter().map(|row| row.timestamp_ms).collect()
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let table = table(50);
        let config = BaselineConfig {
            sample_size: 50,
            seed: 1,
        };
        let mut drawn = timestamps(&config.sample_rows(&table));
        drawn.sort_unstable();
        assert_eq!(drawn, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_table_uses_every_row() {
        let table = table(5);
        let rows = BaselineConfig::default().sample_rows(&table);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_seed_changes_sample() {
        let table = table(1_000);
        let a = BaselineConfig {
            sample_size: 20,
            seed: 1,
        };
        let b = BaselineConfig { seed: 2, ..a };
        assert_eq!(timestamps(&a.sample_rows(&table)), timestamps(&a.sample_rows(&table)));
        assert_ne!(timestamps(&a.sample_rows(&table)), timestamps(&b.sample_rows(&table)));
    }

    #[test]
    fn test_zero_sample_size() {
        let config = BaselineConfig {
            sample_size: 0,
            seed: 42,
        };
        assert_eq!(config.validate(), Err(AnalysisConfigError::ZeroSampleSize));
    }
}
