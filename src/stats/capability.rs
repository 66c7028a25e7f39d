//! Process capability analysis - Cp, Cpk, Pp, Ppk, Cpm, sigma level,
//! DPMO/PPM, and yield
//!
//! Short-term indices (Cp/Cpk) use the within-subgroup sigma estimate
//! when the caller supplies one (typically R-bar/d2 from a control
//! chart); long-term indices (Pp/Ppk) always use the overall sample
//! standard deviation. With no within-sigma available the short-term
//! indices fall back to the overall sigma and the analysis is flagged
//! approximate.
//!
//! Sigma level uses the z-transform with the 1.5-sigma long-term shift
//! convention, so the reported sigma level and DPMO always agree.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::{ensure_finite, mean, normal_quantile, sample_variance, StatError};

/// Specification limits and optional target for a capability study.
///
/// Immutable for an analysis session. At least one limit is required;
/// the target defaults to the midpoint when both limits are present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpecLimits {
    pub lsl: Option<f64>,
    pub usl: Option<f64>,
    pub target: Option<f64>,
}

impl SpecLimits {
    /// Build a limit set.
    ///
    /// # Errors
    ///
    /// `MissingSpecLimits` when neither limit is given,
    /// `InvertedSpecLimits` when USL <= LSL.
    pub fn new(lsl: Option<f64>, usl: Option<f64>) -> Result<Self, StatError> {
        if lsl.is_none() && usl.is_none() {
            return Err(StatError::MissingSpecLimits);
        }
        if lsl.iter().chain(usl.iter()).any(|v| !v.is_finite()) {
            return Err(StatError::NonFiniteSample);
        }
        if let (Some(l), Some(u)) = (lsl, usl) {
            if u <= l {
                return Err(StatError::InvertedSpecLimits { lsl: l, usl: u });
            }
        }
        Ok(Self {
            lsl,
            usl,
            target: None,
        })
    }

    /// Set an explicit target value for Cpm.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Explicit target, falling back to the spec midpoint.
    fn effective_target(&self) -> Option<f64> {
        self.target.or(match (self.lsl, self.usl) {
            (Some(l), Some(u)) => Some((l + u) / 2.0),
            _ => None,
        })
    }
}

/// Qualitative band for a capability index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// index < 1.0
    Poor,
    /// 1.0 <= index < 1.33
    Marginal,
    /// 1.33 <= index < 1.67
    Adequate,
    /// index >= 1.67
    Excellent,
}

impl Rating {
    pub fn from_index(value: f64) -> Self {
        if value < 1.0 {
            Rating::Poor
        } else if value < 1.33 {
            Rating::Marginal
        } else if value < 1.67 {
            Rating::Adequate
        } else {
            Rating::Excellent
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Poor => write!(f, "poor"),
            Rating::Marginal => write!(f, "marginal"),
            Rating::Adequate => write!(f, "adequate"),
            Rating::Excellent => write!(f, "excellent"),
        }
    }
}

/// A capability index paired with its qualitative band
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rated {
    pub value: f64,
    pub rating: Rating,
}

impl Rated {
    fn new(value: f64) -> Self {
        Self {
            value,
            rating: Rating::from_index(value),
        }
    }
}

/// Full capability analysis for one sample against one limit set.
///
/// Index fields are `Option` because one-sided specifications cannot
/// produce the two-sided indices (Cp, Pp, Cpm).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityAnalysis {
    pub n: usize,
    pub mean: f64,

    /// Short-term sigma used for Cp/Cpk/Cpm
    pub std_dev_within: f64,

    /// Overall sample sigma used for Pp/Ppk and the tail estimates
    pub std_dev_overall: f64,

    /// Cp = (USL - LSL) / 6 sigma_within
    pub cp: Option<Rated>,
    /// Cpu = (USL - mean) / 3 sigma_within
    pub cpu: Option<f64>,
    /// Cpl = (mean - LSL) / 3 sigma_within
    pub cpl: Option<f64>,
    /// Cpk = min(Cpu, Cpl)
    pub cpk: Rated,

    /// Pp = (USL - LSL) / 6 sigma_overall
    pub pp: Option<Rated>,
    /// Ppk = min(Ppu, Ppl)
    pub ppk: Rated,

    /// Cpm = Cp / sqrt(1 + ((mean - target) / sigma_within)^2)
    pub cpm: Option<Rated>,

    /// Estimated parts per million outside specification
    pub ppm: f64,

    /// Defects per million opportunities (one opportunity per shot,
    /// so numerically equal to ppm)
    pub dpmo: f64,

    /// 100 * (1 - ppm / 1e6)
    pub yield_percent: f64,

    /// Sigma quality level: z-transform of the in-spec probability
    /// plus the 1.5-sigma long-term shift
    pub sigma_level: f64,

    /// true when no within-subgroup sigma was supplied and the
    /// short-term indices reused the overall sigma
    pub approximate: bool,
}

/// A capability study bound to one immutable limit set
#[derive(Debug, Clone)]
pub struct CapabilityStudy {
    limits: SpecLimits,
}

impl CapabilityStudy {
    pub fn new(limits: SpecLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SpecLimits {
        &self.limits
    }

    /// Analyze a sample.
    ///
    /// `sigma_within` is the short-term (within-subgroup) sigma
    /// estimate, typically [`crate::spc::XbarRChart::sigma_within`].
    /// Pass `None` to fall back to the overall sample sigma; the
    /// result is then flagged `approximate`.
    ///
    /// # Errors
    ///
    /// `InsufficientSample` below 2 observations,
    /// `DegenerateDistribution` when the sample (or the supplied
    /// within-sigma) has zero spread.
    pub fn analyze(
        &self,
        sample: &[f64],
        sigma_within: Option<f64>,
    ) -> Result<CapabilityAnalysis, StatError> {
        if self.limits.lsl.is_none() && self.limits.usl.is_none() {
            return Err(StatError::MissingSpecLimits);
        }
        let n = sample.len();
        if n < 2 {
            return Err(StatError::InsufficientSample {
                analysis: "capability analysis",
                required: 2,
                actual: n,
            });
        }
        ensure_finite(sample)?;

        let x_bar = mean(sample);
        let sigma_overall = sample_variance(sample).sqrt();
        if sigma_overall < 1e-300 {
            return Err(StatError::DegenerateDistribution {
                analysis: "capability analysis",
            });
        }
        if let Some(sw) = sigma_within {
            if !sw.is_finite() || sw <= 0.0 {
                return Err(StatError::DegenerateDistribution {
                    analysis: "capability analysis",
                });
            }
        }
        let approximate = sigma_within.is_none();
        let sigma_w = sigma_within.unwrap_or(sigma_overall);

        let lsl = self.limits.lsl;
        let usl = self.limits.usl;

        // Short-term indices
        let cpu = usl.map(|u| (u - x_bar) / (3.0 * sigma_w));
        let cpl = lsl.map(|l| (x_bar - l) / (3.0 * sigma_w));
        let cp = match (usl, lsl) {
            (Some(u), Some(l)) => Some((u - l) / (6.0 * sigma_w)),
            _ => None,
        };
        let cpk = min_available(cpu, cpl);

        // Long-term indices
        let ppu = usl.map(|u| (u - x_bar) / (3.0 * sigma_overall));
        let ppl = lsl.map(|l| (x_bar - l) / (3.0 * sigma_overall));
        let pp = match (usl, lsl) {
            (Some(u), Some(l)) => Some((u - l) / (6.0 * sigma_overall)),
            _ => None,
        };
        let ppk = min_available(ppu, ppl);

        // Taguchi index against the target
        let cpm = cp.and_then(|cp_val| {
            let target = self.limits.effective_target()?;
            let ratio = (x_bar - target) / sigma_w;
            Some(cp_val / (1.0 + ratio * ratio).sqrt())
        });

        // Tail probabilities under the fitted normal (overall sigma)
        let fitted = Normal::new(x_bar, sigma_overall).expect("sigma checked positive");
        let frac_below = lsl.map_or(0.0, |l| fitted.cdf(l));
        let frac_above = usl.map_or(0.0, |u| 1.0 - fitted.cdf(u));
        let ppm = (frac_below + frac_above) * 1_000_000.0;
        let yield_percent = 100.0 * (1.0 - ppm / 1_000_000.0);

        // Sigma level: Phi^-1(in-spec fraction) + 1.5 shift. The
        // fraction is clamped so a numerically perfect process maps to
        // a finite level instead of +inf.
        let in_spec = (1.0 - ppm / 1_000_000.0).clamp(1e-12, 1.0 - 1e-12);
        let sigma_level = normal_quantile(in_spec) + 1.5;

        Ok(CapabilityAnalysis {
            n,
            mean: x_bar,
            std_dev_within: sigma_w,
            std_dev_overall: sigma_overall,
            cp: cp.map(Rated::new),
            cpu,
            cpl,
            cpk: Rated::new(cpk),
            pp: pp.map(Rated::new),
            ppk: Rated::new(ppk),
            cpm: cpm.map(Rated::new),
            ppm,
            dpmo: ppm,
            yield_percent,
            sigma_level,
            approximate,
        })
    }
}

/// min over whichever one-sided indices exist; `analyze` guarantees
/// at least one limit before this runs.
fn min_available(upper: Option<f64>, lower: Option<f64>) -> f64 {
    match (upper, lower) {
        (Some(u), Some(l)) => u.min(l),
        (Some(u), None) => u,
        (None, Some(l)) => l,
        (None, None) => f64::NAN,
    }
}
