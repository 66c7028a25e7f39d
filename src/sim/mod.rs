//! Projectile simulation - launch settings, trajectory integration,
//! and target scoring

pub mod scoring;
pub mod trajectory;

pub use scoring::{ScoreBreakdown, TargetLayout, TargetRing};
pub use trajectory::{
    fire, simulate, LaunchSettings, ProcessNoise, Shot, ShotId, Trajectory, TrajectoryPoint,
    WeightClass, Wind, WindDirection, GRAVITY, IMPULSE_DURATION,
};

use thiserror::Error;

/// Errors from the simulation layer
#[derive(Debug, Error)]
pub enum SimError {
    #[error("launch force {force} N is outside the supported range {min}..={max}")]
    InvalidForce { force: f64, min: f64, max: f64 },

    #[error("launch angle {angle} degrees is outside the supported range {min}..={max}")]
    InvalidAngle { angle: f64, min: f64, max: f64 },

    #[error("wind speed {speed} m/s must be finite and non-negative")]
    InvalidWind { speed: f64 },

    #[error("process noise standard deviations must be finite and non-negative")]
    InvalidNoise,

    #[error("target rings must have positive, strictly increasing radii")]
    InvalidTargetLayout,

    #[error("trajectory failed to reach the ground within {max_time} simulated seconds")]
    Diverged { max_time: f64 },
}
