use std::fmt;

use serde::Serialize;

/// Two-sided 95% quantile of the standard normal distribution.
pub const Z_95: f64 = 1.96;

/// Percentage of successes among boolean outcomes.
///
/// The interval is the normal-approximation (Wald) interval, expressed in
/// percentage points. It is degenerate (zero width) when every outcome agrees.
///
/// An empty sample yields `percentage == 0.0` and `ci95 == 0.0` with
/// [`insufficient_data`](Self::insufficient_data) set, so that callers can tell
/// "no observations" apart from a true 0%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Proportion {
    /// Number of `true` outcomes.
    pub successes: usize,
    /// Number of outcomes.
    pub trials: usize,
    /// `100 × successes / trials`, or `0.0` for an empty sample.
    pub percentage: f64,
    /// Standard error in percentage points: `100 × sqrt(p(1-p)/n)`.
    pub standard_error: f64,
    /// Half-width of the 95% interval in percentage points: `1.96 × standard_error`.
    pub ci95: f64,
    /// Set when there were no outcomes to summarize.
    pub insufficient_data: bool,
}

impl Proportion {
    /// Summarizes a sequence of boolean outcomes.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lmt_stats::proportion::Proportion;
    /// let summary = Proportion::from_outcomes([true; 10]);
    /// assert_eq!(summary.percentage, 100.0);
    /// assert_eq!(summary.ci95, 0.0);
    /// ```
    #[must_use]
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (successes, trials) = outcomes
            .into_iter()
            .fold((0, 0), |(s, n), outcome| (s + usize::from(outcome), n + 1));
        Self::from_counts(successes, trials)
    }

    /// Summarizes `successes` out of `trials`.
    ///
    /// # Panics
    ///
    /// Panics if `successes > trials`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_counts(successes: usize, trials: usize) -> Self {
        assert!(
            successes <= trials,
            "successes ({successes}) must not exceed trials ({trials})"
        );

        if trials == 0 {
            return Self {
                successes,
                trials,
                percentage: 0.0,
                standard_error: 0.0,
                ci95: 0.0,
                insufficient_data: true,
            };
        }

        let n = trials as f64;
        let p = successes as f64 / n;
        let standard_error = (p * (1.0 - p) / n).sqrt() * 100.0;
        Self {
            successes,
            trials,
            percentage: p * 100.0,
            standard_error,
            ci95: Z_95 * standard_error,
            insufficient_data: false,
        }
    }

    /// Fraction of successes in `[0, 1]`, or `None` for an empty sample.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.successes as f64 / self.trials as f64)
    }
}

impl fmt::Display for Proportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.insufficient_data {
            write!(f, "insufficient data (n=0)")
        } else {
            write!(
                f,
                "{:.1}% ± {:.1} (n={})",
                self.percentage, self.ci95, self.trials
            )
        }
    }
}

/// Per-category proportions of a count distribution.
///
/// Each category is summarized against the distribution total, which is how
/// zone occupancy shares are reported.
///
/// # Examples
///
/// ```
/// # use lmt_stats::proportion::category_proportions;
/// let shares = category_proportions(&[1, 3]);
/// assert_eq!(shares[0].percentage, 25.0);
/// assert_eq!(shares[1].percentage, 75.0);
/// ```
#[must_use]
pub fn category_proportions(counts: &[usize]) -> Vec<Proportion> {
    let total = counts.iter().sum();
    counts
        .iter()
        .map(|&count| Proportion::from_counts(count, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_flagged() {
        let summary = Proportion::from_outcomes([]);
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.ci95, 0.0);
        assert!(summary.insufficient_data);
        assert_eq!(summary.fraction(), None);
    }

    #[test]
    fn test_true_zero_is_not_flagged() {
        let summary = Proportion::from_outcomes([false; 4]);
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.ci95, 0.0);
        assert!(!summary.insufficient_data);
    }

    #[test]
    fn test_all_true_has_degenerate_interval() {
        let summary = Proportion::from_outcomes([true; 10]);
        assert_eq!(summary.percentage, 100.0);
        assert_eq!(summary.ci95, 0.0);
        assert_eq!(summary.successes, 10);
        assert_eq!(summary.trials, 10);
    }

    #[test]
    fn test_wald_interval() {
        // p = 0.5, n = 100 -> se = 5 percentage points
        let summary = Proportion::from_counts(50, 100);
        assert!((summary.percentage - 50.0).abs() < 1e-12);
        assert!((summary.standard_error - 5.0).abs() < 1e-12);
        assert!((summary.ci95 - 9.8).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "must not exceed")]
    fn test_successes_over_trials_panics() {
        let _ = Proportion::from_counts(3, 2);
    }

    #[test]
    fn test_category_proportions_of_empty_distribution() {
        let shares = category_proportions(&[0, 0, 0]);
        assert!(shares.iter().all(|s| s.insufficient_data));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Proportion::from_counts(1, 4).to_string(),
            format!("25.0% ± {:.1} (n=4)", 1.96 * (0.25_f64 * 0.75 / 4.0).sqrt() * 100.0)
        );
        assert_eq!(
            Proportion::from_counts(0, 0).to_string(),
            "insufficient data (n=0)"
        );
    }
}
