//! Session files - CLI-owned persistence of fired shot series
//!
//! The engine itself never persists anything; the CLI stores each
//! firing session as a plain YAML file and feeds the recorded
//! measurements back into the analysis commands.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use miette::{miette, IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

use crate::sim::{LaunchSettings, ProcessNoise, Shot};

/// One recorded firing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub created: DateTime<Utc>,

    /// Nominal settings the series was fired with
    pub settings: LaunchSettings,

    pub noise: ProcessNoise,

    /// Shots in firing order
    pub shots: Vec<Shot>,
}

impl SessionFile {
    pub fn new(settings: LaunchSettings, noise: ProcessNoise, shots: Vec<Shot>) -> Self {
        Self {
            created: Utc::now(),
            settings,
            noise,
            shots,
        }
    }

    /// Landing positions in firing order - the measurement series fed
    /// to the analysis layers
    pub fn measurements(&self) -> Vec<f64> {
        self.shots.iter().map(|s| s.landing_x).collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yml::to_string(self).into_diagnostic()?;
        fs::write(path, yaml)
            .map_err(|e| miette!("failed to write session file {}: {e}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| miette!("failed to read session file {}: {e}", path.display()))?;
        serde_yml::from_str(&raw)
            .map_err(|e| miette!("failed to parse session file {}: {e}", path.display()))
    }

    /// Export the per-shot measurements as CSV
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| miette!("failed to create {}: {e}", path.display()))?;
        writer
            .write_record(["shot", "force_n", "angle_deg", "landing_x_m", "zone", "score"])
            .into_diagnostic()?;
        for (i, shot) in self.shots.iter().enumerate() {
            writer
                .write_record([
                    (i + 1).to_string(),
                    format!("{:.3}", shot.force_applied),
                    format!("{:.3}", shot.angle_applied),
                    format!("{:.4}", shot.landing_x),
                    shot.zone.map_or_else(|| "miss".to_string(), |z| z.to_string()),
                    shot.score.total.to_string(),
                ])
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()?;
        Ok(())
    }
}
