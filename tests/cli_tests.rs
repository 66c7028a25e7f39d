//! CLI integration tests - firing sessions, analysis commands, and
//! error reporting

mod common;

use common::{fire_session, launchlab};
use predicates::prelude::*;
use std::fs;

// ============================================================================
// fire
// ============================================================================

#[test]
fn test_fire_prints_shot_table_and_summary() {
    launchlab()
        .args(["fire", "--shots", "5", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LANDING (m)"))
        .stdout(predicate::str::contains("total score"));
}

#[test]
fn test_fire_writes_session_and_csv() {
    let tmp = tempfile::TempDir::new().unwrap();
    launchlab()
        .current_dir(tmp.path())
        .args([
            "fire",
            "--shots",
            "8",
            "--seed",
            "2",
            "--out",
            "session.yaml",
            "--csv",
            "shots.csv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("session saved"));

    let yaml = fs::read_to_string(tmp.path().join("session.yaml")).unwrap();
    assert!(yaml.contains("shots:"));
    assert!(yaml.contains("landing_x:"));

    let csv = fs::read_to_string(tmp.path().join("shots.csv")).unwrap();
    assert!(csv.starts_with("shot,force_n,angle_deg,landing_x_m,zone,score"));
    assert_eq!(csv.lines().count(), 9); // header + 8 shots
}

#[test]
fn test_fire_same_seed_reproduces_measurements() {
    let a = fire_session(6, 77);
    let b = fire_session(6, 77);

    let extract = |dir: &tempfile::TempDir| -> Vec<String> {
        fs::read_to_string(dir.path().join("session.yaml"))
            .unwrap()
            .lines()
            .filter(|l| l.contains("landing_x:"))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(extract(&a), extract(&b));
}

#[test]
fn test_fire_rejects_out_of_range_force() {
    launchlab()
        .args(["fire", "--shots", "3", "--force", "5000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("force"));
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn test_analyze_prints_all_cards() {
    let tmp = fire_session(40, 5);
    launchlab()
        .current_dir(tmp.path())
        .args([
            "analyze",
            "--session",
            "session.yaml",
            "--lsl",
            "40",
            "--usl",
            "160",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Descriptive statistics"))
        .stdout(predicate::str::contains("Anderson-Darling"))
        .stdout(predicate::str::contains("Shapiro-Wilk"))
        .stdout(predicate::str::contains("Kolmogorov-Smirnov"))
        .stdout(predicate::str::contains("Cpk"))
        .stdout(predicate::str::contains("sigma level"));
}

#[test]
fn test_analyze_without_limits_skips_capability() {
    let tmp = fire_session(40, 5);
    launchlab()
        .current_dir(tmp.path())
        .args(["analyze", "--session", "session.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Descriptive statistics"))
        .stdout(predicate::str::contains("Capability").not());
}

#[test]
fn test_analyze_yaml_format_is_parseable() {
    let tmp = fire_session(40, 5);
    let output = launchlab()
        .current_dir(tmp.path())
        .args([
            "analyze",
            "--session",
            "session.yaml",
            "--format",
            "yaml",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_yml::Value =
        serde_yml::from_slice(&output.stdout).expect("analyze --format yaml must emit valid YAML");
    assert!(parsed.get("descriptive").is_some());
    assert!(parsed.get("normality").is_some());
}

#[test]
fn test_analyze_missing_session_is_a_clean_error() {
    launchlab()
        .args(["analyze", "--session", "no-such-file.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-file.yaml"));
}

#[test]
fn test_analyze_inverted_limits_report_the_precondition() {
    let tmp = fire_session(40, 5);
    launchlab()
        .current_dir(tmp.path())
        .args([
            "analyze",
            "--session",
            "session.yaml",
            "--lsl",
            "160",
            "--usl",
            "40",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("USL"));
}

// ============================================================================
// chart
// ============================================================================

#[test]
fn test_chart_prints_limits_and_subgroups() {
    let tmp = fire_session(40, 9);
    launchlab()
        .current_dir(tmp.path())
        .args(["chart", "--session", "session.yaml", "--subgroup-size", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("X-bar/R chart"))
        .stdout(predicate::str::contains("8 subgroups of 5"))
        .stdout(predicate::str::contains("UCL"))
        .stdout(predicate::str::contains("sigma (R-bar/d2)"));
}

#[test]
fn test_chart_reports_dropped_trailing_shots() {
    let tmp = fire_session(23, 9);
    launchlab()
        .current_dir(tmp.path())
        .args(["chart", "--session", "session.yaml", "--subgroup-size", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 subgroups of 5"))
        .stdout(predicate::str::contains("3 trailing shots dropped"));
}

#[test]
fn test_chart_rejects_unsupported_subgroup_size() {
    let tmp = fire_session(40, 9);
    launchlab()
        .current_dir(tmp.path())
        .args(["chart", "--session", "session.yaml", "--subgroup-size", "15"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2..=10"));
}

#[test]
fn test_chart_sketch_renders() {
    let tmp = fire_session(40, 9);
    launchlab()
        .current_dir(tmp.path())
        .args([
            "chart",
            "--session",
            "session.yaml",
            "--subgroup-size",
            "5",
            "--sketch",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("UCL"));
}

// ============================================================================
// doe
// ============================================================================

#[test]
fn test_doe_plan_prints_eight_runs_for_three_factors() {
    launchlab()
        .args([
            "doe",
            "plan",
            "--factor",
            "force=200,300",
            "--factor",
            "angle=35,55",
            "--factor",
            "weight=0,1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 factors, 8 runs"))
        .stdout(predicate::str::contains("pending"));
}

#[test]
fn test_doe_plan_half_fraction() {
    launchlab()
        .args([
            "doe",
            "plan",
            "--half",
            "--factor",
            "force=200,300",
            "--factor",
            "angle=35,55",
            "--factor",
            "weight=0,1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 factors, 4 runs"));
}

#[test]
fn test_doe_plan_rejects_malformed_factor() {
    launchlab()
        .args(["doe", "plan", "--factor", "force=banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name=low,high"));
}

#[test]
fn test_doe_demo_estimates_effects() {
    launchlab()
        .args(["doe", "demo", "--seed", "12", "--shots-per-run", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main effects"))
        .stdout(predicate::str::contains("grand mean landing"))
        .stdout(predicate::str::contains("force"));
}

// ============================================================================
// completions
// ============================================================================

#[test]
fn test_completions_generate() {
    launchlab()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("launchlab"));
}
