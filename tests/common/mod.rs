//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tempfile::TempDir;

/// Helper to get a launchlab command
pub fn launchlab() -> Command {
    Command::new(cargo::cargo_bin!("launchlab"))
}

/// Fire a reproducible session into `session.yaml` inside a fresh
/// temp directory and return the directory.
pub fn fire_session(shots: usize, seed: u64) -> TempDir {
    let tmp = TempDir::new().unwrap();
    launchlab()
        .current_dir(tmp.path())
        .args([
            "fire",
            "--shots",
            &shots.to_string(),
            "--seed",
            &seed.to_string(),
            "--out",
            "session.yaml",
        ])
        .assert()
        .success();
    tmp
}

/// Draw `n` values from normal(mean, sd) with a seeded RNG
/// (Box-Muller).
pub fn normal_sample(n: usize, mean: f64, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = 1.0 - rng.random::<f64>();
            let u2: f64 = rng.random();
            let z = (-2.0_f64 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + sd * z
        })
        .collect()
}

/// A deterministic, ideally normal-shaped sample: the expected normal
/// order statistics at probabilities (i - 0.5) / n, scaled to the
/// requested moments.
pub fn ideal_normal_sample(n: usize, mean: f64, sd: f64) -> Vec<f64> {
    use statrs::distribution::{ContinuousCDF, Normal};
    let normal = Normal::new(0.0, 1.0).unwrap();
    (0..n)
        .map(|i| mean + sd * normal.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}
