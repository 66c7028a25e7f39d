//! Statistical analysis - descriptive statistics, normality testing,
//! process capability, and hypothesis tests
//!
//! Every function here is a pure computation over an immutable sample
//! snapshot. Shared moment helpers live in this module so that the
//! descriptive, normality, and capability layers all use the same
//! conventions (sample variance with the n-1 denominator, population
//! variance with n).

pub mod capability;
pub mod descriptive;
pub mod hypothesis;
pub mod normality;

pub use capability::{CapabilityAnalysis, CapabilityStudy, Rated, Rating, SpecLimits};
pub use descriptive::{describe, DescriptiveStats};
pub use hypothesis::{
    chi_square_gof, one_sample_t, one_way_anova, paired_t, two_sample_t, AnovaTable, TTestVariant,
    TestOutcome,
};
pub use normality::{
    anderson_darling, kolmogorov_smirnov, normality_report, qq_plot, shapiro_wilk, Alpha,
    NormalityReport, NormalityTest, NormalityTestResult, QqPlot,
};

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use thiserror::Error;

/// Errors from the statistical analysis layer
///
/// All variants are locally detectable precondition failures; there is
/// no retry semantic. Each carries enough context for the presentation
/// layer to show a specific corrective message.
#[derive(Debug, Error)]
pub enum StatError {
    #[error("{analysis} requires at least {required} observations, got {actual}")]
    InsufficientSample {
        analysis: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Shapiro-Wilk supports samples of 3..=5000 observations, got {actual}")]
    UnsupportedSampleSize { actual: usize },

    #[error("sample has zero variance (perfect repeatability); {analysis} is undefined")]
    DegenerateDistribution { analysis: &'static str },

    #[error("at least one specification limit (LSL or USL) is required")]
    MissingSpecLimits,

    #[error("specification limits are inverted: USL {usl} must exceed LSL {lsl}")]
    InvertedSpecLimits { lsl: f64, usl: f64 },

    #[error("sample contains non-finite values")]
    NonFiniteSample,

    #[error("paired inputs differ in length: {left} vs {right}")]
    MismatchedPairs { left: usize, right: usize },

    #[error("one-way ANOVA requires at least 2 groups, got {actual}")]
    InsufficientGroups { actual: usize },

    #[error("expected frequency at category {index} must be positive")]
    NonPositiveExpected { index: usize },
}

/// Reject samples containing NaN or infinity before any moment math.
pub(crate) fn ensure_finite(sample: &[f64]) -> Result<(), StatError> {
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(StatError::NonFiniteSample);
    }
    Ok(())
}

pub(crate) fn mean(sample: &[f64]) -> f64 {
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Sample variance (n-1 denominator). Caller guarantees n >= 2.
pub(crate) fn sample_variance(sample: &[f64]) -> f64 {
    let m = mean(sample);
    sample.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (sample.len() - 1) as f64
}

/// Population variance (n denominator).
pub(crate) fn population_variance(sample: &[f64]) -> f64 {
    let m = mean(sample);
    sample.iter().map(|x| (x - m).powi(2)).sum::<f64>() / sample.len() as f64
}

pub(crate) fn sorted_copy(sample: &[f64]) -> Vec<f64> {
    let mut v = sample.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    v
}

// Reference-distribution CDFs, concentrated here so the precondition
// checks that make the constructors infallible are auditable in one
// place. Degrees of freedom are always >= 1 by the time these run.

pub(crate) fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("unit normal parameters are valid")
}

pub(crate) fn normal_cdf(z: f64) -> f64 {
    std_normal().cdf(z)
}

pub(crate) fn normal_quantile(p: f64) -> f64 {
    std_normal().inverse_cdf(p)
}

pub(crate) fn student_t_cdf(x: f64, df: f64) -> f64 {
    StudentsT::new(0.0, 1.0, df)
        .expect("degrees of freedom checked positive")
        .cdf(x)
}

pub(crate) fn f_cdf(x: f64, df1: f64, df2: f64) -> f64 {
    FisherSnedecor::new(df1, df2)
        .expect("degrees of freedom checked positive")
        .cdf(x)
}

pub(crate) fn chi_squared_cdf(x: f64, df: f64) -> f64 {
    ChiSquared::new(df)
        .expect("degrees of freedom checked positive")
        .cdf(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variances() {
        let data = [2.0, 4.0, 6.0, 8.0];
        assert!((mean(&data) - 5.0).abs() < 1e-12);
        // Sample variance: sum of squares 20 / 3
        assert!((sample_variance(&data) - 20.0 / 3.0).abs() < 1e-12);
        // Population variance: 20 / 4
        assert!((population_variance(&data) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ensure_finite_rejects_nan() {
        assert!(ensure_finite(&[1.0, f64::NAN]).is_err());
        assert!(ensure_finite(&[1.0, f64::INFINITY]).is_err());
        assert!(ensure_finite(&[1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_normal_cdf_known_values() {
        // Standard normal table: Φ(0) = 0.5, Φ(1.96) ≈ 0.975
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-9);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_quantile(0.975) - 1.96).abs() < 1e-2);
    }

    #[test]
    fn test_quantile_roundtrip() {
        for &p in &[0.01, 0.1, 0.5, 0.9, 0.99] {
            let z = normal_quantile(p);
            assert!((normal_cdf(z) - p).abs() < 1e-9);
        }
    }
}
