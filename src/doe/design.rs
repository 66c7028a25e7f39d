//! Factorial design generation and run tracking
//!
//! Generates two-level factorial design matrices - full 2^k or the
//! half fraction 2^(k-1) - in standard order with no duplicate rows,
//! and tracks response completion per run.

use serde::{Deserialize, Serialize};

use super::DoeError;

/// Cap on factor count; 2^12 = 4096 runs is already far beyond any
/// classroom design
const MAX_FACTORS: usize = 12;

/// A two-level experimental factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,

    /// Setting at the low (-) level
    pub low: f64,

    /// Setting at the high (+) level
    pub high: f64,
}

impl Factor {
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
        }
    }
}

/// Level of one factor within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Contrast sign: -1 for low, +1 for high
    pub fn sign(self) -> f64 {
        match self {
            Level::Low => -1.0,
            Level::High => 1.0,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "-"),
            Level::High => write!(f, "+"),
        }
    }
}

/// One row of the design matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRun {
    /// Zero-based standard-order index
    pub index: usize,

    /// Level of each factor, in factor order
    pub levels: Vec<Level>,

    /// Measured response once the run has been performed
    pub response: Option<f64>,
}

impl ExperimentRun {
    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    /// The actual setting value of factor `j` in this run
    pub fn setting(&self, factors: &[Factor], j: usize) -> f64 {
        match self.levels[j] {
            Level::Low => factors[j].low,
            Level::High => factors[j].high,
        }
    }
}

/// Whether the design is the full factorial or the half fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fraction {
    Full,
    /// 2^(k-1) runs; the last factor is generated from the product of
    /// the others (defining relation I = AB...K), which aliases
    /// interactions with main effects
    Half,
}

/// An ordered set of experiment runs over a fixed factor list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorialDesign {
    factors: Vec<Factor>,
    runs: Vec<ExperimentRun>,
    pub fraction: Fraction,
}

impl FactorialDesign {
    /// Generate the full 2^k design in standard order: factor 0
    /// alternates fastest.
    pub fn full(factors: Vec<Factor>) -> Result<Self, DoeError> {
        validate_factors(&factors)?;

        let k = factors.len();
        let runs = (0..1usize << k)
            .map(|i| ExperimentRun {
                index: i,
                levels: (0..k).map(|j| level_from_bit(i, j)).collect(),
                response: None,
            })
            .collect();

        Ok(Self {
            factors,
            runs,
            fraction: Fraction::Full,
        })
    }

    /// Generate the 2^(k-1) half fraction: the first k-1 factors form
    /// a full factorial and the last level is the product of their
    /// signs.
    pub fn half_fraction(factors: Vec<Factor>) -> Result<Self, DoeError> {
        validate_factors(&factors)?;
        let k = factors.len();
        if k < 3 {
            return Err(DoeError::TooFewFactors {
                required: 3,
                actual: k,
            });
        }

        let runs = (0..1usize << (k - 1))
            .map(|i| {
                let mut levels: Vec<Level> = (0..k - 1).map(|j| level_from_bit(i, j)).collect();
                let product: f64 = levels.iter().map(|l| l.sign()).product();
                levels.push(if product > 0.0 { Level::High } else { Level::Low });
                ExperimentRun {
                    index: i,
                    levels,
                    response: None,
                }
            })
            .collect();

        Ok(Self {
            factors,
            runs,
            fraction: Fraction::Half,
        })
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn runs(&self) -> &[ExperimentRun] {
        &self.runs
    }

    /// Record the measured response of one run.
    ///
    /// # Errors
    ///
    /// `UnknownRun` for an out-of-range index, `NonFiniteResponse`
    /// for NaN or infinite measurements.
    pub fn record_response(&mut self, index: usize, value: f64) -> Result<(), DoeError> {
        if index >= self.runs.len() {
            return Err(DoeError::UnknownRun {
                index,
                runs: self.runs.len(),
            });
        }
        if !value.is_finite() {
            return Err(DoeError::NonFiniteResponse { index, value });
        }
        self.runs[index].response = Some(value);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.runs.iter().all(ExperimentRun::is_complete)
    }

    /// Indices of runs still awaiting a response
    pub fn missing_runs(&self) -> Vec<usize> {
        self.runs
            .iter()
            .filter(|r| !r.is_complete())
            .map(|r| r.index)
            .collect()
    }
}

fn level_from_bit(run: usize, factor: usize) -> Level {
    if (run >> factor) & 1 == 1 {
        Level::High
    } else {
        Level::Low
    }
}

fn validate_factors(factors: &[Factor]) -> Result<(), DoeError> {
    if factors.is_empty() {
        return Err(DoeError::NoFactors);
    }
    if factors.len() > MAX_FACTORS {
        return Err(DoeError::TooManyFactors {
            count: factors.len(),
            max: MAX_FACTORS,
        });
    }
    for (i, f) in factors.iter().enumerate() {
        if factors[..i].iter().any(|other| other.name == f.name) {
            return Err(DoeError::DuplicateFactor {
                name: f.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_factors() -> Vec<Factor> {
        vec![
            Factor::new("force", 200.0, 300.0),
            Factor::new("angle", 35.0, 55.0),
            Factor::new("weight", 0.5, 2.0),
        ]
    }

    #[test]
    fn test_full_factorial_row_count_and_uniqueness() {
        let design = FactorialDesign::full(three_factors()).unwrap();
        assert_eq!(design.runs().len(), 8);

        let mut seen: Vec<&Vec<Level>> = Vec::new();
        for run in design.runs() {
            assert!(!seen.contains(&&run.levels), "duplicate row {:?}", run.levels);
            seen.push(&run.levels);
        }
    }

    #[test]
    fn test_standard_order() {
        let design = FactorialDesign::full(three_factors()).unwrap();
        // Factor 0 alternates every run, factor 1 every 2, factor 2
        // every 4
        let signs: Vec<Vec<f64>> = design
            .runs()
            .iter()
            .map(|r| r.levels.iter().map(|l| l.sign()).collect())
            .collect();
        assert_eq!(signs[0], vec![-1.0, -1.0, -1.0]);
        assert_eq!(signs[1], vec![1.0, -1.0, -1.0]);
        assert_eq!(signs[2], vec![-1.0, 1.0, -1.0]);
        assert_eq!(signs[7], vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_half_fraction_row_count_and_generator() {
        let design = FactorialDesign::half_fraction(three_factors()).unwrap();
        assert_eq!(design.runs().len(), 4);
        // Defining relation: sign of last factor = product of the
        // others
        for run in design.runs() {
            let prod: f64 = run.levels[..2].iter().map(|l| l.sign()).product();
            assert_eq!(run.levels[2].sign(), prod);
        }
    }

    #[test]
    fn test_half_fraction_needs_three_factors() {
        let factors = vec![
            Factor::new("force", 200.0, 300.0),
            Factor::new("angle", 35.0, 55.0),
        ];
        assert!(matches!(
            FactorialDesign::half_fraction(factors),
            Err(DoeError::TooFewFactors {
                required: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_factor_validation() {
        assert!(matches!(
            FactorialDesign::full(vec![]),
            Err(DoeError::NoFactors)
        ));

        let dup = vec![
            Factor::new("force", 1.0, 2.0),
            Factor::new("force", 3.0, 4.0),
        ];
        assert!(matches!(
            FactorialDesign::full(dup),
            Err(DoeError::DuplicateFactor { .. })
        ));

        let many: Vec<Factor> = (0..13)
            .map(|i| Factor::new(format!("f{i}"), 0.0, 1.0))
            .collect();
        assert!(matches!(
            FactorialDesign::full(many),
            Err(DoeError::TooManyFactors { count: 13, max: 12 })
        ));
    }

    #[test]
    fn test_response_tracking() {
        let mut design = FactorialDesign::full(three_factors()).unwrap();
        assert!(!design.is_complete());
        assert_eq!(design.missing_runs().len(), 8);

        for i in 0..8 {
            design.record_response(i, 100.0 + i as f64).unwrap();
        }
        assert!(design.is_complete());
        assert!(design.missing_runs().is_empty());
    }

    #[test]
    fn test_response_validation() {
        let mut design = FactorialDesign::full(three_factors()).unwrap();
        assert!(matches!(
            design.record_response(8, 1.0),
            Err(DoeError::UnknownRun { index: 8, runs: 8 })
        ));
        assert!(matches!(
            design.record_response(0, f64::NAN),
            Err(DoeError::NonFiniteResponse { index: 0, .. })
        ));
    }

    #[test]
    fn test_run_settings_resolve_levels() {
        let design = FactorialDesign::full(three_factors()).unwrap();
        let run = &design.runs()[1]; // force high, others low
        assert_eq!(run.setting(design.factors(), 0), 300.0);
        assert_eq!(run.setting(design.factors(), 1), 35.0);
        assert_eq!(run.setting(design.factors(), 2), 0.5);
    }
}
