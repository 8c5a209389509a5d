//! Angle averaging and normalization
//!
//! Headings are angles in radians. Averaging them arithmetically is biased
//! near the wraparound boundary (a mix of values close to `π` and close to
//! `-π` averages to roughly `0`, pointing the opposite way). The circular
//! mean, `atan2(Σ sin θ, Σ cos θ)`, does not have that problem.
//!
//! [`AngleMean`] lets callers pick either strategy; [`AngleAccumulator`] is the
//! streaming form used when aggregating many groups at once.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Strategy for averaging angles.
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
pub enum AngleMean {
    /// Plain mean of the raw radian values.
    #[default]
    #[display("arithmetic")]
    Arithmetic,
    /// Direction of the mean unit vector, in `(-π, π]`.
    #[display("circular")]
    Circular,
}

impl AngleMean {
    /// Averages `angles`, returning `None` when there are none.
    #[must_use]
    pub fn mean<I>(self, angles: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut acc = AngleAccumulator::default();
        angles.into_iter().for_each(|angle| acc.push(angle));
        acc.mean(self)
    }
}

/// Running sums for both averaging strategies.
///
/// `NaN` angles are ignored.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AngleAccumulator {
    count: usize,
    sum: f64,
    sum_sin: f64,
    sum_cos: f64,
}

impl AngleAccumulator {
    pub fn push(&mut self, angle: f64) {
        if angle.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += angle;
        self.sum_sin += angle.sin();
        self.sum_cos += angle.cos();
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the pushed angles, or `None` if none were pushed.
    ///
    /// The circular mean of vectors that cancel out exactly has no direction;
    /// `atan2(0, 0)` yields `0` in that case.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self, strategy: AngleMean) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match strategy {
            AngleMean::Arithmetic => self.sum / self.count as f64,
            AngleMean::Circular => self.sum_sin.atan2(self.sum_cos),
        })
    }
}

/// Maps an angle into `[0, 2π)`.
///
/// # Examples
///
/// ```
/// # use lmt_stats::circular::normalize_angle;
/// use std::f64::consts::{PI, TAU};
///
/// assert!((normalize_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
/// assert_eq!(normalize_angle(TAU), 0.0);
/// ```
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Counter-clockwise angle in `[0, 2π)` from vector `from` to vector `to`.
///
/// Returns `None` when either vector has zero length.
///
/// # Examples
///
/// ```
/// # use lmt_stats::circular::angle_between;
/// use std::f64::consts::PI;
///
/// let angle = angle_between((1.0, 0.0), (0.0, 1.0)).unwrap();
/// assert!((angle - PI / 2.0).abs() < 1e-12);
/// assert_eq!(angle_between((0.0, 0.0), (1.0, 0.0)), None);
/// ```
#[must_use]
pub fn angle_between(from: (f64, f64), to: (f64, f64)) -> Option<f64> {
    let norm = |(x, y): (f64, f64)| x.hypot(y);
    if norm(from) == 0.0 || norm(to) == 0.0 {
        return None;
    }
    Some(normalize_angle(to.1.atan2(to.0) - from.1.atan2(from.0)))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn test_empty_mean() {
        assert_eq!(AngleMean::Arithmetic.mean([]), None);
        assert_eq!(AngleMean::Circular.mean([]), None);
    }

    #[test]
    fn test_strategies_agree_away_from_boundary() {
        let angles = [0.2, 0.4, 0.6];
        let arithmetic = AngleMean::Arithmetic.mean(angles).unwrap();
        let circular = AngleMean::Circular.mean(angles).unwrap();
        assert!((arithmetic - 0.4).abs() < 1e-12);
        assert!((circular - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_wraparound_boundary() {
        // Two headings 0.2 rad apart, straddling ±π
        let angles = [PI - 0.1, -PI + 0.1];
        let arithmetic = AngleMean::Arithmetic.mean(angles).unwrap();
        let circular = AngleMean::Circular.mean(angles).unwrap();
        // The arithmetic mean points the opposite way
        assert!(arithmetic.abs() < 1e-12);
        assert!((circular.abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut acc = AngleAccumulator::default();
        acc.push(f64::NAN);
        acc.push(1.0);
        assert_eq!(acc.count(), 1);
        assert_eq!(acc.mean(AngleMean::Arithmetic), Some(1.0));
    }

    #[test]
    fn test_single_angle_is_preserved() {
        for angle in [-3.0, -1.0, 0.0, 1.5, 3.0] {
            let circular = AngleMean::Circular.mean([angle]).unwrap();
            assert!((circular - angle).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-0.5) - (TAU - 0.5)).abs() < 1e-12);
        assert!((normalize_angle(7.0) - (7.0 - TAU)).abs() < 1e-12);
        assert_eq!(normalize_angle(-1e-20), 0.0);
    }

    #[test]
    fn test_angle_between_wraps() {
        // From pointing up to pointing right is three quarters counter-clockwise
        let angle = angle_between((0.0, 1.0), (1.0, 0.0)).unwrap();
        assert!((angle - 1.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("circular".parse::<AngleMean>().unwrap(), AngleMean::Circular);
        assert_eq!(
            "Arithmetic".parse::<AngleMean>().unwrap(),
            AngleMean::Arithmetic
        );
        assert_eq!(AngleMean::Circular.to_string(), "circular");
    }
}
