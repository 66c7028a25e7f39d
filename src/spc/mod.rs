//! Statistical process control - subgroups, X-bar/R control charts,
//! and Nelson rule pattern detection
//!
//! The chart builder is a one-shot pure function: a snapshot of
//! completed subgroups in, center lines / control limits / per-point
//! classifications out. The Nelson engine scans the classified points
//! causally (each rule window ends at the point it reports on), so the
//! same scan works for batch and incremental use.

pub mod chart;
pub mod constants;
pub mod nelson;

pub use chart::{
    partition_subgroups, ChartPoint, ControlLimits, LimitPosition, Subgroup, XbarRChart,
};
pub use constants::SpcConstants;
pub use nelson::{scan, NelsonRule, NelsonViolation, Severity};

use thiserror::Error;

/// Errors from the control-charting layer
#[derive(Debug, Error)]
pub enum SpcError {
    #[error("subgroup size {size} is outside the SPC constant table (valid 2..=10)")]
    UnsupportedSubgroupSize { size: usize },

    #[error("control limits require at least {required} complete subgroups, got {actual}")]
    InsufficientSubgroups { required: usize, actual: usize },

    #[error("subgroup {index} has size {actual}, expected {expected}")]
    MismatchedSubgroupSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("subgroup {index} contains non-finite measurements")]
    NonFiniteMeasurement { index: usize },

    #[error("mean subgroup range is zero; the control limits are degenerate")]
    DegenerateSubgroups,
}
