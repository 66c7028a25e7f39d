//! Design of experiments - two-level factorial planning and effect
//! analysis

pub mod design;
pub mod effects;

pub use design::{ExperimentRun, Factor, FactorialDesign, Fraction, Level};
pub use effects::{EffectAnalysis, InteractionEffect, MainEffect};

use thiserror::Error;

/// Errors from the DOE layer
#[derive(Debug, Error)]
pub enum DoeError {
    #[error("a factorial design requires at least one factor")]
    NoFactors,

    #[error("{count} factors would generate 2^{count} runs; the supported maximum is {max}")]
    TooManyFactors { count: usize, max: usize },

    #[error("a half-fraction design requires at least {required} factors, got {actual}")]
    TooFewFactors { required: usize, actual: usize },

    #[error("duplicate factor name '{name}'")]
    DuplicateFactor { name: String },

    #[error("run index {index} is out of range for a design with {runs} runs")]
    UnknownRun { index: usize, runs: usize },

    #[error("response {value} for run {index} must be finite")]
    NonFiniteResponse { index: usize, value: f64 },

    #[error("effects requested before all runs completed; missing runs {missing:?}")]
    IncompleteDesign { missing: Vec<usize> },
}
