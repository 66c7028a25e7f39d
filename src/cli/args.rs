//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::sim::{WeightClass, WindDirection};
use crate::stats::Alpha;

#[derive(Parser, Debug)]
#[command(
    name = "launchlab",
    version,
    about = "Catapult simulation engine for SPC and DOE training",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fire a series of shots and record the measurement session
    Fire(FireArgs),

    /// Descriptive, normality, and capability analysis of a session
    Analyze(AnalyzeArgs),

    /// X-bar/R control chart with Nelson rule detection
    Chart(ChartArgs),

    /// Plan and analyze two-level factorial experiments
    #[command(subcommand)]
    Doe(DoeCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Projectile weight class
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WeightArg {
    Light,
    Medium,
    Heavy,
}

impl From<WeightArg> for WeightClass {
    fn from(value: WeightArg) -> Self {
        match value {
            WeightArg::Light => WeightClass::Light,
            WeightArg::Medium => WeightClass::Medium,
            WeightArg::Heavy => WeightClass::Heavy,
        }
    }
}

/// Wind direction relative to the shot
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindDirArg {
    Tailwind,
    Headwind,
}

impl From<WindDirArg> for WindDirection {
    fn from(value: WindDirArg) -> Self {
        match value {
            WindDirArg::Tailwind => WindDirection::Tailwind,
            WindDirArg::Headwind => WindDirection::Headwind,
        }
    }
}

/// Significance level for normality verdicts
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlphaArg {
    /// alpha = 0.10
    A10,
    /// alpha = 0.05
    A05,
    /// alpha = 0.025
    A025,
    /// alpha = 0.01
    A01,
}

impl From<AlphaArg> for Alpha {
    fn from(value: AlphaArg) -> Self {
        match value {
            AlphaArg::A10 => Alpha::A10,
            AlphaArg::A05 => Alpha::A05,
            AlphaArg::A025 => Alpha::A025,
            AlphaArg::A01 => Alpha::A01,
        }
    }
}

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable tables and cards
    Table,
    Yaml,
    Json,
}

#[derive(Args, Debug)]
pub struct FireArgs {
    /// Number of shots to fire
    #[arg(long, short = 'n', default_value_t = 30)]
    pub shots: usize,

    /// Launch force in newtons (the default lands a medium projectile
    /// near the 100 m target center)
    #[arg(long, default_value_t = 125.0)]
    pub force: f64,

    /// Launch angle in degrees
    #[arg(long, default_value_t = 45.0)]
    pub angle: f64,

    /// Projectile weight class
    #[arg(long, value_enum, default_value_t = WeightArg::Medium)]
    pub weight: WeightArg,

    /// Wind speed in m/s (no wind when omitted)
    #[arg(long)]
    pub wind_speed: Option<f64>,

    /// Wind direction
    #[arg(long, value_enum, default_value_t = WindDirArg::Tailwind)]
    pub wind_dir: WindDirArg,

    /// Enable air resistance
    #[arg(long)]
    pub drag: bool,

    /// Shot-to-shot force variation (standard deviation, N)
    #[arg(long, default_value_t = 6.0)]
    pub noise_force: f64,

    /// Shot-to-shot angle variation (standard deviation, degrees)
    #[arg(long, default_value_t = 0.8)]
    pub noise_angle: f64,

    /// RNG seed for a reproducible series
    #[arg(long)]
    pub seed: Option<u64>,

    /// Draw a braille sketch of the nominal flight arc
    #[arg(long)]
    pub sketch: bool,

    /// Write the session to this YAML file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Export the raw shot measurements to CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Session file written by `launchlab fire --out`
    #[arg(long)]
    pub session: PathBuf,

    /// Lower specification limit for the landing position, m
    #[arg(long)]
    pub lsl: Option<f64>,

    /// Upper specification limit for the landing position, m
    #[arg(long)]
    pub usl: Option<f64>,

    /// Target landing position for Cpm (defaults to the spec midpoint)
    #[arg(long)]
    pub target: Option<f64>,

    /// Significance level for the normality verdicts
    #[arg(long, value_enum, default_value_t = AlphaArg::A05)]
    pub alpha: AlphaArg,

    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    pub format: FormatArg,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Session file written by `launchlab fire --out`
    #[arg(long)]
    pub session: PathBuf,

    /// Measurements per subgroup (2..=10)
    #[arg(long, default_value_t = 5)]
    pub subgroup_size: usize,

    /// Draw a braille sketch of the X-bar chart
    #[arg(long)]
    pub sketch: bool,

    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    pub format: FormatArg,
}

#[derive(Subcommand, Debug)]
pub enum DoeCommands {
    /// Print the design matrix for a set of factors
    Plan(DoePlanArgs),

    /// Run a built-in force/angle/weight experiment through the
    /// simulator and estimate effects
    Demo(DoeDemoArgs),
}

#[derive(Args, Debug)]
pub struct DoePlanArgs {
    /// Factor as name=low,high (repeatable), e.g. --factor force=200,300
    #[arg(long = "factor", required = true)]
    pub factors: Vec<String>,

    /// Generate the 2^(k-1) half fraction instead of the full design
    #[arg(long)]
    pub half: bool,
}

#[derive(Args, Debug)]
pub struct DoeDemoArgs {
    /// Shots fired (and averaged) per design row
    #[arg(long, default_value_t = 3)]
    pub shots_per_run: usize,

    /// RNG seed for a reproducible experiment
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
