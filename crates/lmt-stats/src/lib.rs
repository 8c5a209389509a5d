//! Statistical utilities for behavioral tracking analysis.
//!
//! This crate provides the small set of statistical tools the analysis
//! pipeline needs, without pulling in a numerical library:
//!
//! - **Proportions**: Percentage of successes with a normal-approximation
//!   (Wald) confidence interval and an explicit insufficient-data flag
//! - **Contingency tests**: Pearson's chi-squared test of independence on raw
//!   counts, with low expected-count flagging
//! - **Special functions**: Log-gamma and the regularized incomplete gamma
//!   function backing the chi-squared distribution
//! - **Circular statistics**: Arithmetic or circular mean of angles
//! - **Histograms**: Fixed-width histograms, including angular histograms over
//!   `[0, 2π)`
//!
//! # Modules
//!
//! - [`proportion`]: Percentages with confidence intervals
//! - [`contingency`]: Chi-squared contingency tests
//! - [`special`]: Gamma-family special functions
//! - [`circular`]: Angle averaging strategies and angle normalization
//! - [`histogram`]: Fixed-width histograms
//!
//! # Examples
//!
//! ## Summarizing boolean outcomes
//!
//! ```
//! use lmt_stats::proportion::Proportion;
//!
//! let summary = Proportion::from_outcomes([true, false, true, true]);
//! assert_eq!(summary.percentage, 75.0);
//! assert!(!summary.insufficient_data);
//!
//! let empty = Proportion::from_outcomes([]);
//! assert_eq!(empty.percentage, 0.0);
//! assert!(empty.insufficient_data);
//! ```
//!
//! ## Comparing two count distributions
//!
//! ```
//! use lmt_stats::contingency::ChiSquaredTest;
//!
//! let test = ChiSquaredTest::compare(&[30, 40, 30], &[30, 40, 30]).unwrap();
//! assert!((test.p_value - 1.0).abs() < 1e-9);
//! ```
//!
//! ## Averaging angles
//!
//! ```
//! use lmt_stats::circular::AngleMean;
//! use std::f64::consts::PI;
//!
//! let angles = [PI - 0.1, -PI + 0.1];
//! let arithmetic = AngleMean::Arithmetic.mean(angles).unwrap();
//! let circular = AngleMean::Circular.mean(angles).unwrap();
//! assert!(arithmetic.abs() < 1e-12);
//! assert!((circular.abs() - PI).abs() < 1e-12);
//! ```

pub mod circular;
pub mod contingency;
pub mod histogram;
pub mod proportion;
pub mod special;
