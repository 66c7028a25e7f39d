//! Effect estimation for completed factorial designs
//!
//! Main effect of a factor = mean response at its high level minus
//! mean response at its low level. Pairwise interactions use the
//! standard sign-table contrast: the interaction column sign for a
//! run is the product of the two factor signs. Effects are ranked by
//! absolute magnitude.

use serde::{Deserialize, Serialize};

use super::design::{FactorialDesign, Fraction};
use super::DoeError;

/// Estimated main effect of one factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainEffect {
    pub factor_index: usize,
    pub factor_name: String,

    /// Mean response over the runs at the low level
    pub low_mean: f64,

    /// Mean response over the runs at the high level
    pub high_mean: f64,

    /// high_mean - low_mean
    pub effect: f64,

    /// 1 = largest absolute effect
    pub rank: usize,
}

/// Estimated two-factor interaction effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEffect {
    pub factor_indices: (usize, usize),
    pub factor_names: (String, String),

    /// Sign-table contrast divided by half the run count
    pub effect: f64,
}

/// Complete effect analysis of a finished design
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectAnalysis {
    /// Mean response over all runs
    pub grand_mean: f64,

    /// Main effects, ranked by absolute magnitude
    pub main_effects: Vec<MainEffect>,

    /// Pairwise interactions, sorted by absolute magnitude. Empty for
    /// half-fraction designs, where two-factor interactions are
    /// aliased with main effects and the numbers would mislead.
    pub interactions: Vec<InteractionEffect>,
}

impl FactorialDesign {
    /// Estimate main and interaction effects.
    ///
    /// # Errors
    ///
    /// `IncompleteDesign` (listing the missing run indices) when any
    /// run has no recorded response.
    pub fn effects(&self) -> Result<EffectAnalysis, DoeError> {
        let missing = self.missing_runs();
        if !missing.is_empty() {
            return Err(DoeError::IncompleteDesign { missing });
        }

        let responses: Vec<f64> = self
            .runs()
            .iter()
            .map(|r| r.response.expect("completeness checked above"))
            .collect();
        let n = responses.len() as f64;
        let grand_mean = responses.iter().sum::<f64>() / n;

        let mut main_effects: Vec<MainEffect> = self
            .factors()
            .iter()
            .enumerate()
            .map(|(j, factor)| {
                let (high_sum, high_n, low_sum, low_n) = self.runs().iter().zip(&responses).fold(
                    (0.0, 0usize, 0.0, 0usize),
                    |(hs, hn, ls, ln), (run, &y)| {
                        if run.levels[j].sign() > 0.0 {
                            (hs + y, hn + 1, ls, ln)
                        } else {
                            (hs, hn, ls + y, ln + 1)
                        }
                    },
                );
                let low_mean = low_sum / low_n as f64;
                let high_mean = high_sum / high_n as f64;
                MainEffect {
                    factor_index: j,
                    factor_name: factor.name.clone(),
                    low_mean,
                    high_mean,
                    effect: high_mean - low_mean,
                    rank: 0,
                }
            })
            .collect();

        // Rank by |effect|, largest first
        let mut order: Vec<usize> = (0..main_effects.len()).collect();
        order.sort_by(|&a, &b| {
            main_effects[b]
                .effect
                .abs()
                .partial_cmp(&main_effects[a].effect.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (rank, &idx) in order.iter().enumerate() {
            main_effects[idx].rank = rank + 1;
        }

        let interactions = match self.fraction {
            Fraction::Half => Vec::new(),
            Fraction::Full => self.interaction_effects(&responses),
        };

        Ok(EffectAnalysis {
            grand_mean,
            main_effects,
            interactions,
        })
    }

    fn interaction_effects(&self, responses: &[f64]) -> Vec<InteractionEffect> {
        let k = self.factors().len();
        let half_n = responses.len() as f64 / 2.0;

        let mut interactions = Vec::new();
        for a in 0..k {
            for b in (a + 1)..k {
                let contrast: f64 = self
                    .runs()
                    .iter()
                    .zip(responses)
                    .map(|(run, &y)| run.levels[a].sign() * run.levels[b].sign() * y)
                    .sum();
                interactions.push(InteractionEffect {
                    factor_indices: (a, b),
                    factor_names: (
                        self.factors()[a].name.clone(),
                        self.factors()[b].name.clone(),
                    ),
                    effect: contrast / half_n,
                });
            }
        }
        interactions.sort_by(|x, y| {
            y.effect
                .abs()
                .partial_cmp(&x.effect.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        interactions
    }
}
