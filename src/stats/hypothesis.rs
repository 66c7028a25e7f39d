//! Hypothesis testing - t-tests, one-way ANOVA, chi-square
//! goodness-of-fit
//!
//! Used by the capability and validation flows to compare sample means
//! and variances against targets. Each test returns its statistic, the
//! degrees of freedom, and a p-value from the matching reference
//! distribution.

use serde::{Deserialize, Serialize};

use super::{
    chi_squared_cdf, ensure_finite, f_cdf, mean, sample_variance, student_t_cdf, StatError,
};

/// Statistic, degrees of freedom, and two-tailed p-value
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    /// May be fractional (Welch)
    pub df: f64,
    pub p_value: f64,
}

/// Which two-sample t-test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TTestVariant {
    /// Pooled variance, df = n1 + n2 - 2; assumes equal variances
    Pooled,
    /// Welch-Satterthwaite df; no equal-variance assumption
    Welch,
}

fn checked_moments(data: &[f64], analysis: &'static str) -> Result<(f64, f64), StatError> {
    if data.len() < 2 {
        return Err(StatError::InsufficientSample {
            analysis,
            required: 2,
            actual: data.len(),
        });
    }
    ensure_finite(data)?;
    Ok((mean(data), sample_variance(data)))
}

/// One-sample t-test of H0: mu = mu0.
///
/// t = (x-bar - mu0) / (s / sqrt(n)), df = n - 1.
pub fn one_sample_t(data: &[f64], mu0: f64) -> Result<TestOutcome, StatError> {
    if !mu0.is_finite() {
        return Err(StatError::NonFiniteSample);
    }
    let (m, var) = checked_moments(data, "one-sample t-test")?;
    if var < 1e-300 {
        return Err(StatError::DegenerateDistribution {
            analysis: "one-sample t-test",
        });
    }

    let n = data.len() as f64;
    let t = (m - mu0) / (var.sqrt() / n.sqrt());
    let df = n - 1.0;

    Ok(TestOutcome {
        statistic: t,
        df,
        p_value: 2.0 * (1.0 - student_t_cdf(t.abs(), df)),
    })
}

/// Two-sample t-test of H0: mu1 = mu2.
pub fn two_sample_t(a: &[f64], b: &[f64], variant: TTestVariant) -> Result<TestOutcome, StatError> {
    let (m1, v1) = checked_moments(a, "two-sample t-test")?;
    let (m2, v2) = checked_moments(b, "two-sample t-test")?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;

    let (t, df) = match variant {
        TTestVariant::Pooled => {
            let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0);
            if pooled < 1e-300 {
                return Err(StatError::DegenerateDistribution {
                    analysis: "two-sample t-test",
                });
            }
            let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
            ((m1 - m2) / se, n1 + n2 - 2.0)
        }
        TTestVariant::Welch => {
            let se_sq = v1 / n1 + v2 / n2;
            if se_sq < 1e-300 {
                return Err(StatError::DegenerateDistribution {
                    analysis: "two-sample t-test",
                });
            }
            let t = (m1 - m2) / se_sq.sqrt();
            let w1 = v1 / n1;
            let w2 = v2 / n2;
            let df = (w1 + w2).powi(2) / (w1 * w1 / (n1 - 1.0) + w2 * w2 / (n2 - 1.0));
            (t, df)
        }
    };

    Ok(TestOutcome {
        statistic: t,
        df,
        p_value: 2.0 * (1.0 - student_t_cdf(t.abs(), df)),
    })
}

/// Paired t-test of H0: mean difference = 0.
pub fn paired_t(x: &[f64], y: &[f64]) -> Result<TestOutcome, StatError> {
    if x.len() != y.len() {
        return Err(StatError::MismatchedPairs {
            left: x.len(),
            right: y.len(),
        });
    }
    let diffs: Vec<f64> = x.iter().zip(y.iter()).map(|(&a, &b)| a - b).collect();
    one_sample_t(&diffs, 0.0)
}

/// One-way ANOVA table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnovaTable {
    pub f_statistic: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub p_value: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub ms_between: f64,
    pub ms_within: f64,
    pub group_means: Vec<f64>,
    pub grand_mean: f64,
}

/// One-way ANOVA of H0: all group means are equal.
///
/// F = MS_between / MS_within with df (k-1, N-k).
pub fn one_way_anova(groups: &[&[f64]]) -> Result<AnovaTable, StatError> {
    let k = groups.len();
    if k < 2 {
        return Err(StatError::InsufficientGroups { actual: k });
    }
    for g in groups {
        if g.len() < 2 {
            return Err(StatError::InsufficientSample {
                analysis: "one-way ANOVA",
                required: 2,
                actual: g.len(),
            });
        }
        ensure_finite(g)?;
    }

    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total_n as f64;
    let group_means: Vec<f64> = groups.iter().map(|g| mean(g)).collect();

    let ss_between: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, &gm)| g.iter().map(|&x| (x - gm).powi(2)).sum::<f64>())
        .sum();

    let df_between = k - 1;
    let df_within = total_n - k;

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    if ms_within < 1e-300 {
        return Err(StatError::DegenerateDistribution {
            analysis: "one-way ANOVA",
        });
    }
    let f_statistic = ms_between / ms_within;
    let p_value = 1.0 - f_cdf(f_statistic, df_between as f64, df_within as f64);

    Ok(AnovaTable {
        f_statistic,
        df_between,
        df_within,
        p_value,
        ss_between,
        ss_within,
        ms_between,
        ms_within,
        group_means,
        grand_mean,
    })
}

/// Chi-square goodness-of-fit test of H0: observed frequencies match
/// the expected distribution.
///
/// chi2 = sum (O - E)^2 / E, df = k - 1.
pub fn chi_square_gof(observed: &[f64], expected: &[f64]) -> Result<TestOutcome, StatError> {
    let k = observed.len();
    if k != expected.len() {
        return Err(StatError::MismatchedPairs {
            left: k,
            right: expected.len(),
        });
    }
    if k < 2 {
        return Err(StatError::InsufficientSample {
            analysis: "chi-square goodness-of-fit",
            required: 2,
            actual: k,
        });
    }
    ensure_finite(observed)?;
    for (i, &e) in expected.iter().enumerate() {
        if !e.is_finite() || e <= 0.0 {
            return Err(StatError::NonPositiveExpected { index: i });
        }
    }

    let chi2: f64 = observed
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| (o - e).powi(2) / e)
        .sum();
    let df = (k - 1) as f64;

    Ok(TestOutcome {
        statistic: chi2,
        df,
        p_value: 1.0 - chi_squared_cdf(chi2, df),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sample_t_on_mean() {
        let data = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = one_sample_t(&data, 6.0).unwrap();
        // Sample mean equals mu0, so t = 0 and p = 1
        assert!(r.statistic.abs() < 1e-12);
        assert!((r.p_value - 1.0).abs() < 1e-9);
        assert!((r.df - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_one_sample_t_rejects_distant_mean() {
        let data = [5.1, 4.9, 5.2, 5.0, 4.8, 5.3, 5.1, 4.9];
        let r = one_sample_t(&data, 7.0).unwrap();
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_two_sample_t_detects_separation() {
        let a = [5.1, 4.9, 5.2, 5.0, 4.8];
        let b = [7.1, 6.9, 7.2, 7.0, 6.8];
        for variant in [TTestVariant::Pooled, TTestVariant::Welch] {
            let r = two_sample_t(&a, &b, variant).unwrap();
            assert!(r.p_value < 0.01, "{variant:?} should reject");
            assert!(r.statistic < 0.0);
        }
    }

    #[test]
    fn test_pooled_df_is_integer_welch_is_not_larger() {
        let a = [5.0, 6.0, 7.0, 5.5, 6.5];
        let b = [5.2, 9.0, 3.0, 7.5, 6.0, 8.0];
        let pooled = two_sample_t(&a, &b, TTestVariant::Pooled).unwrap();
        let welch = two_sample_t(&a, &b, TTestVariant::Welch).unwrap();
        assert!((pooled.df - 9.0).abs() < 1e-12);
        // Welch df never exceeds the pooled df
        assert!(welch.df <= pooled.df + 1e-9);
    }

    #[test]
    fn test_paired_t_direction() {
        let before = [5.0, 6.0, 7.0, 8.0, 9.0];
        let after = [5.5, 6.2, 7.1, 8.3, 9.4];
        let r = paired_t(&before, &after).unwrap();
        assert!(r.statistic < 0.0);
    }

    #[test]
    fn test_paired_t_length_mismatch() {
        assert!(matches!(
            paired_t(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(StatError::MismatchedPairs { left: 2, right: 3 })
        ));
    }

    #[test]
    fn test_anova_separated_groups() {
        let g1 = [5.0, 6.0, 7.0, 5.5, 6.5];
        let g2 = [8.0, 9.0, 8.5, 9.5, 8.0];
        let g3 = [4.0, 3.0, 3.5, 4.5, 4.0];
        let r = one_way_anova(&[&g1, &g2, &g3]).unwrap();
        assert!(r.p_value < 0.01);
        assert_eq!(r.df_between, 2);
        assert_eq!(r.df_within, 12);
        // Partition identity: SS_total = SS_between + SS_within
        let all: Vec<f64> = [g1.as_slice(), &g2, &g3].concat();
        let gm = all.iter().sum::<f64>() / all.len() as f64;
        let ss_total: f64 = all.iter().map(|x| (x - gm).powi(2)).sum();
        assert!((ss_total - r.ss_between - r.ss_within).abs() < 1e-9);
    }

    #[test]
    fn test_anova_similar_groups_not_rejected() {
        let g1 = [5.0, 6.0, 5.5, 6.2, 5.8];
        let g2 = [5.9, 5.4, 6.1, 5.6, 5.7];
        let r = one_way_anova(&[&g1, &g2]).unwrap();
        assert!(r.p_value > 0.05);
    }

    #[test]
    fn test_anova_needs_two_groups() {
        let g = [1.0, 2.0, 3.0];
        assert!(matches!(
            one_way_anova(&[&g]),
            Err(StatError::InsufficientGroups { actual: 1 })
        ));
    }

    #[test]
    fn test_chi_square_known_value() {
        // Classic die example: chi2 = sum (O-E)^2/E with E = 10
        let observed = [8.0, 9.0, 12.0, 11.0, 10.0, 10.0];
        let expected = [10.0; 6];
        let r = chi_square_gof(&observed, &expected).unwrap();
        assert!((r.statistic - 1.0).abs() < 1e-12);
        assert!((r.df - 5.0).abs() < 1e-12);
        assert!(r.p_value > 0.9);
    }

    #[test]
    fn test_chi_square_rejects_bad_fit() {
        let observed = [50.0, 5.0, 5.0];
        let expected = [20.0, 20.0, 20.0];
        let r = chi_square_gof(&observed, &expected).unwrap();
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_chi_square_rejects_zero_expected() {
        assert!(matches!(
            chi_square_gof(&[1.0, 2.0], &[1.0, 0.0]),
            Err(StatError::NonPositiveExpected { index: 1 })
        ));
    }

    #[test]
    fn test_zero_variance_is_typed_failure() {
        assert!(matches!(
            one_sample_t(&[3.0; 6], 2.0),
            Err(StatError::DegenerateDistribution { .. })
        ));
    }
}
