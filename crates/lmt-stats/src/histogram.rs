use std::{f64::consts::TAU, ops::Range};

use serde::Serialize;

/// A fixed-width histogram over a bounded range.
///
/// The range is split into equally wide bins. Every bin is half-open except
/// the last one, which also includes the upper bound. Values outside the range
/// (and `NaN`) are not counted but are tallied in
/// [`out_of_range`](Self::out_of_range).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// The bins comprising the histogram, in ascending order.
    pub bins: Vec<HistogramBin>,
    /// Number of values that fell outside every bin.
    pub out_of_range: u64,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl HistogramBin {
    /// Midpoint of the bin.
    #[must_use]
    pub fn center(&self) -> f64 {
        f64::midpoint(self.range.start, self.range.end)
    }
}

impl Histogram {
    /// Creates a histogram with `num_bins` equally wide bins spanning `range`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_stats::histogram::Histogram;
    /// let histogram = Histogram::uniform([0.5, 1.5, 1.6, 4.0, 9.0], 4, 0.0..4.0);
    /// let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
    /// assert_eq!(counts, [1, 2, 0, 1]);
    /// assert_eq!(histogram.out_of_range, 1);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `num_bins` is zero or the range is empty.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn uniform<I>(values: I, num_bins: usize, range: Range<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        assert!(num_bins > 0, "histogram needs at least one bin");
        assert!(range.start < range.end, "histogram range must not be empty");

        let width = range.end - range.start;
        // Recompute boundaries per bin to avoid accumulating rounding errors
        let edge = |i: usize| range.start + width * (i as f64) / (num_bins as f64);
        let mut bins = (0..num_bins)
            .map(|i| HistogramBin {
                range: edge(i)..edge(i + 1),
                count: 0,
            })
            .collect::<Vec<_>>();

        let mut out_of_range = 0;
        for value in values {
            if !(range.start..=range.end).contains(&value) {
                out_of_range += 1;
                continue;
            }
            let position = (value - range.start) / width * num_bins as f64;
            let idx = (position.floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins, out_of_range }
    }

    /// Creates a histogram of angles over `[0, 2π]`.
    #[must_use]
    pub fn angular<I>(angles: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::uniform(angles, num_bins, 0.0..TAU)
    }

    /// Number of values counted in the bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// Bin counts divided by the total, or `None` if the histogram is empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fractions(&self) -> Option<Vec<f64>> {
        let total = self.total();
        (total > 0).then(|| {
            self.bins
                .iter()
                .map(|bin| bin.count as f64 / total as f64)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn test_upper_bound_goes_to_last_bin() {
        let histogram = Histogram::uniform([0.0, 10.0], 5, 0.0..10.0);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[4].count, 1);
        assert_eq!(histogram.out_of_range, 0);
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let histogram = Histogram::uniform([f64::NAN, -1.0, 1.0], 2, 0.0..2.0);
        assert_eq!(histogram.total(), 1);
        assert_eq!(histogram.out_of_range, 2);
    }

    #[test]
    fn test_angular_bins() {
        let histogram = Histogram::angular([0.1, PI, 1.9 * PI], 12);
        assert_eq!(histogram.bins.len(), 12);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[6].count, 1);
        assert_eq!(histogram.bins[11].count, 1);
        assert!((histogram.bins[0].center() - PI / 12.0).abs() < 1e-12);
        assert!((histogram.bins[11].range.end - TAU).abs() < 1e-12);
    }

    #[test]
    fn test_fractions() {
        let histogram = Histogram::uniform([0.1, 0.2, 0.9, 0.95], 2, 0.0..1.0);
        assert_eq!(histogram.fractions(), Some(vec![0.5, 0.5]));

        let empty = Histogram::angular([], 12);
        assert_eq!(empty.fractions(), None);
        assert_eq!(empty.total(), 0);
    }

    #[test]
    #[should_panic(expected = "at least one bin")]
    fn test_zero_bins_panics() {
        let _ = Histogram::uniform([1.0], 0, 0.0..1.0);
    }
}
