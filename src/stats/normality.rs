//! Normality testing - Anderson-Darling, Shapiro-Wilk, Kolmogorov-Smirnov
//!
//! Three independent tests of the hypothesis that a shot sample came
//! from a normal distribution, plus Q-Q plot coordinates for visual
//! inspection. Each test reports its statistic, the tabulated critical
//! value where one exists, a p-value, and a verdict at the requested
//! significance level.

use serde::{Deserialize, Serialize};

use super::{
    ensure_finite, mean, normal_cdf, normal_quantile, sample_variance, sorted_copy, StatError,
};

/// Significance level for a normality verdict.
///
/// Closed set because the Anderson-Darling and Kolmogorov-Smirnov
/// critical values are tabulated, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alpha {
    /// alpha = 0.10
    A10,
    /// alpha = 0.05
    #[default]
    A05,
    /// alpha = 0.025
    A025,
    /// alpha = 0.01
    A01,
}

impl Alpha {
    pub fn value(self) -> f64 {
        match self {
            Alpha::A10 => 0.10,
            Alpha::A05 => 0.05,
            Alpha::A025 => 0.025,
            Alpha::A01 => 0.01,
        }
    }

    /// Anderson-Darling critical values for A*² when mean and variance
    /// are estimated from the sample (Stephens case 3).
    fn anderson_darling_critical(self) -> f64 {
        match self {
            Alpha::A10 => 0.631,
            Alpha::A05 => 0.752,
            Alpha::A025 => 0.873,
            Alpha::A01 => 1.035,
        }
    }

    /// Kolmogorov-Smirnov coefficient c(alpha) in the large-sample
    /// critical approximation D_crit = c / (sqrt(n) + 0.12 + 0.11/sqrt(n)).
    fn kolmogorov_smirnov_coefficient(self) -> f64 {
        match self {
            Alpha::A10 => 1.224,
            Alpha::A05 => 1.358,
            Alpha::A025 => 1.480,
            Alpha::A01 => 1.628,
        }
    }
}

/// Which normality test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalityTest {
    AndersonDarling,
    ShapiroWilk,
    KolmogorovSmirnov,
}

impl std::fmt::Display for NormalityTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalityTest::AndersonDarling => write!(f, "Anderson-Darling"),
            NormalityTest::ShapiroWilk => write!(f, "Shapiro-Wilk"),
            NormalityTest::KolmogorovSmirnov => write!(f, "Kolmogorov-Smirnov"),
        }
    }
}

/// Outcome of a single normality test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityTestResult {
    pub test: NormalityTest,

    /// The test statistic (A*², W, or D)
    pub statistic: f64,

    /// Tabulated critical value at the chosen alpha, where one exists
    /// (Shapiro-Wilk verdicts come from the p-value instead)
    pub critical_value: Option<f64>,

    /// Approximate p-value
    pub p_value: f64,

    /// true when the sample is consistent with normality at alpha
    pub passed: bool,
}

/// Q-Q plot coordinates and best-fit reference line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QqPlot {
    /// Ordered (theoretical quantile, observed value) pairs
    pub points: Vec<(f64, f64)>,

    /// Reference line slope (sample standard deviation)
    pub slope: f64,

    /// Reference line intercept (sample mean)
    pub intercept: f64,
}

/// All three tests plus Q-Q data for one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalityReport {
    pub alpha: Alpha,
    pub anderson_darling: NormalityTestResult,
    pub shapiro_wilk: NormalityTestResult,
    pub kolmogorov_smirnov: NormalityTestResult,
    pub qq: QqPlot,
}

impl NormalityReport {
    /// true when every test is consistent with normality
    pub fn all_passed(&self) -> bool {
        self.anderson_darling.passed && self.shapiro_wilk.passed && self.kolmogorov_smirnov.passed
    }
}

/// Run all three normality tests and build Q-Q data.
///
/// # Errors
///
/// `InsufficientSample` when n < 8 (the Anderson-Darling minimum) and
/// `UnsupportedSampleSize` when n > 5000 (the Shapiro-Wilk maximum).
pub fn normality_report(sample: &[f64], alpha: Alpha) -> Result<NormalityReport, StatError> {
    Ok(NormalityReport {
        alpha,
        anderson_darling: anderson_darling(sample, alpha)?,
        shapiro_wilk: shapiro_wilk(sample, alpha)?,
        kolmogorov_smirnov: kolmogorov_smirnov(sample, alpha)?,
        qq: qq_plot(sample)?,
    })
}

/// Standardize the sample, failing on degenerate spread.
fn fitted_moments(sample: &[f64], analysis: &'static str) -> Result<(f64, f64), StatError> {
    ensure_finite(sample)?;
    let m = mean(sample);
    let sd = sample_variance(sample).sqrt();
    if sd < 1e-300 {
        return Err(StatError::DegenerateDistribution { analysis });
    }
    Ok((m, sd))
}

// ---------------------------------------------------------------------------
// Anderson-Darling
// ---------------------------------------------------------------------------

/// Anderson-Darling test against the fitted normal distribution.
///
/// A² is computed from the sorted sample and the standard normal CDF,
/// then corrected for sample size per Stephens:
/// A*² = A² (1 + 0.75/n + 2.25/n²). The verdict compares A*² against
/// the case-3 critical table; the p-value uses the D'Agostino-Stephens
/// piecewise exponential approximation.
pub fn anderson_darling(sample: &[f64], alpha: Alpha) -> Result<NormalityTestResult, StatError> {
    let n = sample.len();
    if n < 8 {
        return Err(StatError::InsufficientSample {
            analysis: "Anderson-Darling test",
            required: 8,
            actual: n,
        });
    }
    let (m, sd) = fitted_moments(sample, "Anderson-Darling test")?;

    let x = sorted_copy(sample);
    let nf = n as f64;

    let mut s = 0.0;
    for i in 0..n {
        let phi = normal_cdf((x[i] - m) / sd).clamp(1e-15, 1.0 - 1e-15);
        let phi_rev = normal_cdf((x[n - 1 - i] - m) / sd).clamp(1e-15, 1.0 - 1e-15);
        let coeff = (2 * (i + 1) - 1) as f64;
        s += coeff * (phi.ln() + (1.0 - phi_rev).ln());
    }

    let a2 = -nf - s / nf;
    let a2_star = a2 * (1.0 + 0.75 / nf + 2.25 / (nf * nf));

    let p = if a2_star >= 0.6 {
        (1.2937 - 5.709 * a2_star + 0.0186 * a2_star * a2_star).exp()
    } else if a2_star > 0.34 {
        (0.9177 - 4.279 * a2_star - 1.38 * a2_star * a2_star).exp()
    } else if a2_star > 0.2 {
        1.0 - (-8.318 + 42.796 * a2_star - 59.938 * a2_star * a2_star).exp()
    } else {
        1.0 - (-13.436 + 101.14 * a2_star - 223.73 * a2_star * a2_star).exp()
    };

    let critical = alpha.anderson_darling_critical();
    Ok(NormalityTestResult {
        test: NormalityTest::AndersonDarling,
        statistic: a2_star,
        critical_value: Some(critical),
        p_value: p.clamp(0.0, 1.0),
        passed: a2_star <= critical,
    })
}

// ---------------------------------------------------------------------------
// Shapiro-Wilk (Royston AS R94)
// ---------------------------------------------------------------------------

// Royston polynomial coefficients for the coefficient corrections and
// the W -> z normalizing transforms.
const ROYSTON_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const ROYSTON_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const ROYSTON_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const ROYSTON_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const ROYSTON_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const ROYSTON_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const ROYSTON_G: [f64; 2] = [-2.273, 0.459];

const SHAPIRO_WILK_MAX_N: usize = 5000;

fn poly(c: &[f64], x: f64) -> f64 {
    let mut acc = c[c.len() - 1];
    for i in (0..c.len() - 1).rev() {
        acc = acc * x + c[i];
    }
    acc
}

/// Shapiro-Wilk test using Royston's order-statistic coefficient
/// approximation, valid for 3 <= n <= 5000.
///
/// # Errors
///
/// `UnsupportedSampleSize` outside the supported range - the
/// approximation degrades rather than failing loudly, so the range is
/// enforced here instead of returning an inaccurate result.
pub fn shapiro_wilk(sample: &[f64], alpha: Alpha) -> Result<NormalityTestResult, StatError> {
    let n = sample.len();
    if !(3..=SHAPIRO_WILK_MAX_N).contains(&n) {
        return Err(StatError::UnsupportedSampleSize { actual: n });
    }
    let (_, _) = fitted_moments(sample, "Shapiro-Wilk test")?;

    let x = sorted_copy(sample);

    let (w, p_value) = if n == 3 {
        shapiro_wilk_n3(&x)
    } else {
        let half = n / 2;
        let a = royston_coefficients(n, half);
        let w = w_statistic(&x, &a, n, half);
        (w, royston_p_value(w, n))
    };

    Ok(NormalityTestResult {
        test: NormalityTest::ShapiroWilk,
        statistic: w,
        critical_value: None,
        p_value: p_value.clamp(0.0, 1.0),
        passed: p_value >= alpha.value(),
    })
}

// n = 3 has an exact coefficient and p-value
fn shapiro_wilk_n3(x: &[f64]) -> (f64, f64) {
    let a1 = std::f64::consts::FRAC_1_SQRT_2;
    let m = (x[0] + x[1] + x[2]) / 3.0;
    let ss = x.iter().map(|&v| (v - m).powi(2)).sum::<f64>();

    let numerator = a1 * (x[2] - x[0]);
    let w = ((numerator * numerator) / ss).clamp(0.75, 1.0);
    let p = (1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos()).clamp(0.0, 1.0);
    (w, p)
}

/// Order-statistic coefficients: Blom scores normalized and corrected
/// with Royston's polynomials in n^(-1/2).
fn royston_coefficients(n: usize, half: usize) -> Vec<f64> {
    let nf = n as f64;

    let mut m = vec![0.0; half];
    let mut summ2 = 0.0;
    for (i, mi) in m.iter_mut().enumerate() {
        let p = (i as f64 + 1.0 - 0.375) / (nf + 0.25);
        *mi = normal_quantile(p);
        summ2 += *mi * *mi;
    }
    summ2 *= 2.0;
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    let a1 = poly(&ROYSTON_C1, rsn) - m[0] / ssumm2;

    if n <= 5 {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        a[0] = a1;
        for i in 1..half {
            a[i] = -m[i] / fac;
        }
    } else {
        let a2 = -m[1] / ssumm2 + poly(&ROYSTON_C2, rsn);
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        a[0] = a1;
        a[1] = a2;
        for i in 2..half {
            a[i] = -m[i] / fac;
        }
    }
    a
}

fn w_statistic(x: &[f64], a: &[f64], n: usize, half: usize) -> f64 {
    let mut sa = 0.0;
    for i in 0..half {
        sa += a[i] * (x[n - 1 - i] - x[i]);
    }

    let m = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - m).powi(2)).sum();

    ((sa * sa) / ss).min(1.0)
}

/// Royston's normalizing transform of W to a standard normal z.
fn royston_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();

    if n <= 11 {
        let gamma = poly(&ROYSTON_G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let m = poly(&ROYSTON_C3, nf);
        let s = poly(&ROYSTON_C4, nf).exp();
        1.0 - normal_cdf((y2 - m) / s)
    } else {
        let lx = nf.ln();
        let m = poly(&ROYSTON_C5, lx);
        let s = poly(&ROYSTON_C6, lx).exp();
        1.0 - normal_cdf((y - m) / s)
    }
}

// ---------------------------------------------------------------------------
// Kolmogorov-Smirnov
// ---------------------------------------------------------------------------

/// Kolmogorov-Smirnov test against the fitted normal distribution.
///
/// D is the supremum deviation between the empirical CDF and the
/// fitted normal CDF, checked both just above and just below each
/// order statistic. The verdict uses the standard large-sample
/// critical-value approximation; the p-value uses the Kolmogorov
/// series.
pub fn kolmogorov_smirnov(sample: &[f64], alpha: Alpha) -> Result<NormalityTestResult, StatError> {
    let n = sample.len();
    if n < 5 {
        return Err(StatError::InsufficientSample {
            analysis: "Kolmogorov-Smirnov test",
            required: 5,
            actual: n,
        });
    }
    let (m, sd) = fitted_moments(sample, "Kolmogorov-Smirnov test")?;

    let sorted = sorted_copy(sample);
    let nf = n as f64;

    let mut d = 0.0_f64;
    for (i, &x) in sorted.iter().enumerate() {
        let cdf = normal_cdf((x - m) / sd);
        d = d.max(((i + 1) as f64 / nf - cdf).abs());
        d = d.max((i as f64 / nf - cdf).abs());
    }

    let sqrt_n = nf.sqrt();
    let critical = alpha.kolmogorov_smirnov_coefficient() / (sqrt_n + 0.12 + 0.11 / sqrt_n);

    // P(D > d) ~ 2 sum (-1)^(k-1) exp(-2 k² lambda²)
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    let mut p = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * kf * kf * lambda * lambda).exp();
        p += term;
        if term.abs() < 1e-15 {
            break;
        }
    }

    Ok(NormalityTestResult {
        test: NormalityTest::KolmogorovSmirnov,
        statistic: d,
        critical_value: Some(critical),
        p_value: (2.0 * p).clamp(0.0, 1.0),
        passed: d <= critical,
    })
}

// ---------------------------------------------------------------------------
// Q-Q plot
// ---------------------------------------------------------------------------

/// Q-Q plot data: each sorted observation paired with the normal
/// quantile at probability (i - 0.5) / n, plus the reference line
/// (slope = sample std-dev, intercept = mean) for overlay.
pub fn qq_plot(sample: &[f64]) -> Result<QqPlot, StatError> {
    let n = sample.len();
    if n < 3 {
        return Err(StatError::InsufficientSample {
            analysis: "Q-Q plot",
            required: 3,
            actual: n,
        });
    }
    ensure_finite(sample)?;

    let m = mean(sample);
    let sd = sample_variance(sample).sqrt();
    let sorted = sorted_copy(sample);
    let nf = n as f64;

    let points = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (normal_quantile((i as f64 + 0.5) / nf), x))
        .collect();

    Ok(QqPlot {
        points,
        slope: sd,
        intercept: m,
    })
}
