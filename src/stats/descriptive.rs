//! Descriptive statistics over a shot sample
//!
//! Pure summary of a numeric sample: location, spread, shape, and
//! quartiles. The skewness and kurtosis figures use the small-sample
//! bias-corrected (adjusted Fisher-Pearson) standardized moments so
//! they agree with the normality and capability layers downstream.

use serde::{Deserialize, Serialize};

use super::{ensure_finite, mean, population_variance, sample_variance, sorted_copy, StatError};

/// Summary statistics for one measurement series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of observations
    pub n: usize,

    /// Arithmetic mean
    pub mean: f64,

    /// Sample standard deviation (n-1 denominator)
    pub std_dev: f64,

    /// Population standard deviation (n denominator)
    pub std_dev_population: f64,

    /// Smallest observation
    pub min: f64,

    /// Largest observation
    pub max: f64,

    /// max - min
    pub range: f64,

    /// Median (second quartile)
    pub median: f64,

    /// First quartile
    pub q1: f64,

    /// Third quartile
    pub q3: f64,

    /// Adjusted Fisher-Pearson skewness; defined for n >= 3 with
    /// non-zero variance
    pub skewness: Option<f64>,

    /// Bias-corrected excess kurtosis; defined for n >= 4 with
    /// non-zero variance
    pub kurtosis: Option<f64>,
}

/// Compute descriptive statistics for a sample.
///
/// # Errors
///
/// [`StatError::InsufficientSample`] when fewer than 2 observations are
/// supplied (the variance-dependent statistics are undefined below
/// that), [`StatError::NonFiniteSample`] on NaN or infinite values.
pub fn describe(sample: &[f64]) -> Result<DescriptiveStats, StatError> {
    let n = sample.len();
    if n < 2 {
        return Err(StatError::InsufficientSample {
            analysis: "descriptive statistics",
            required: 2,
            actual: n,
        });
    }
    ensure_finite(sample)?;

    let m = mean(sample);
    let var_s = sample_variance(sample);
    let var_p = population_variance(sample);

    let sorted = sorted_copy(sample);
    let min = sorted[0];
    let max = sorted[n - 1];

    Ok(DescriptiveStats {
        n,
        mean: m,
        std_dev: var_s.sqrt(),
        std_dev_population: var_p.sqrt(),
        min,
        max,
        range: max - min,
        median: quantile(&sorted, 0.5),
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
        skewness: adjusted_skewness(sample, m, var_p),
        kurtosis: adjusted_kurtosis(sample, m, var_p),
    })
}

/// Linear-interpolation quantile over a sorted sample (R type 7):
/// the p-quantile sits at index (n-1)*p.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// G1 = g1 * sqrt(n(n-1)) / (n-2) where g1 = m3 / m2^(3/2).
fn adjusted_skewness(sample: &[f64], mean: f64, m2: f64) -> Option<f64> {
    let n = sample.len();
    if n < 3 || m2 <= 0.0 {
        return None;
    }
    let nf = n as f64;
    let m3 = sample.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / nf;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
}

/// G2 = ((n+1) g2 + 6) * (n-1) / ((n-2)(n-3)) where g2 = m4 / m2^2 - 3.
fn adjusted_kurtosis(sample: &[f64], mean: f64, m2: f64) -> Option<f64> {
    let n = sample.len();
    if n < 4 || m2 <= 0.0 {
        return None;
    }
    let nf = n as f64;
    let m4 = sample.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / nf;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
}
