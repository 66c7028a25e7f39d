//! `launchlab fire` - fire a shot series and record the session

use console::style;
use miette::{IntoDiagnostic, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::args::FireArgs;
use crate::cli::session::SessionFile;
use crate::cli::viz;
use crate::sim::{fire, simulate, LaunchSettings, ProcessNoise, Shot, TargetLayout, Wind};
use crate::stats::describe;

#[derive(Tabled)]
struct ShotRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "FORCE (N)")]
    force: String,
    #[tabled(rename = "ANGLE (deg)")]
    angle: String,
    #[tabled(rename = "LANDING (m)")]
    landing: String,
    #[tabled(rename = "ZONE")]
    zone: String,
    #[tabled(rename = "SCORE")]
    score: u32,
}

impl ShotRow {
    fn from_shot(number: usize, shot: &Shot) -> Self {
        Self {
            number,
            force: format!("{:.1}", shot.force_applied),
            angle: format!("{:.2}", shot.angle_applied),
            landing: format!("{:.2}", shot.landing_x),
            zone: shot
                .zone
                .map_or_else(|| "miss".to_string(), |z| format!("ring {}", z + 1)),
            score: shot.score.total,
        }
    }
}

pub fn run(args: FireArgs) -> Result<()> {
    let mut settings = LaunchSettings::new(args.force, args.angle, args.weight.into())
        .into_diagnostic()?
        .with_air_resistance(args.drag);
    if let Some(speed) = args.wind_speed {
        settings = settings.with_wind(Wind::new(speed, args.wind_dir.into()).into_diagnostic()?);
    }
    let noise = ProcessNoise::new(args.noise_force, args.noise_angle).into_diagnostic()?;
    let target = TargetLayout::standard();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut shots = Vec::with_capacity(args.shots);
    for _ in 0..args.shots {
        shots.push(fire(&settings, &noise, &target, &mut rng).into_diagnostic()?);
    }

    let rows: Vec<ShotRow> = shots
        .iter()
        .enumerate()
        .map(|(i, s)| ShotRow::from_shot(i + 1, s))
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let measurements: Vec<f64> = shots.iter().map(|s| s.landing_x).collect();
    if let Ok(stats) = describe(&measurements) {
        println!(
            "\n{} {} shots   mean {:.2} m   std-dev {:.3} m   range {:.2} m",
            style("◆").cyan(),
            shots.len(),
            stats.mean,
            stats.std_dev,
            stats.range,
        );
    }
    let total: u32 = shots.iter().map(|s| s.score.total).sum();
    println!("{} total score {}", style("◆").cyan(), total);

    if args.sketch {
        let nominal = simulate(&settings).into_diagnostic()?;
        println!("\n{}", viz::trajectory_sketch(&nominal));
    }

    let session = SessionFile::new(settings, noise, shots);
    if let Some(path) = &args.out {
        session.save(path)?;
        println!("{} session saved to {}", style("✓").green(), path.display());
    }
    if let Some(path) = &args.csv {
        session.export_csv(path)?;
        println!("{} measurements exported to {}", style("✓").green(), path.display());
    }

    Ok(())
}
