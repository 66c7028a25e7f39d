//! `launchlab doe` - factorial experiment planning and the built-in
//! simulator-driven demo

use console::style;
use miette::{miette, IntoDiagnostic, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::args::{DoeCommands, DoeDemoArgs, DoePlanArgs};
use crate::doe::{EffectAnalysis, Factor, FactorialDesign};
use crate::sim::{fire, LaunchSettings, ProcessNoise, TargetLayout, WeightClass};

pub fn run(cmd: DoeCommands) -> Result<()> {
    match cmd {
        DoeCommands::Plan(args) => run_plan(args),
        DoeCommands::Demo(args) => run_demo(args),
    }
}

/// Parse a factor given as name=low,high
fn parse_factor(raw: &str) -> Result<Factor> {
    let err = || miette!("factor '{raw}' must be name=low,high, e.g. force=200,300");
    let (name, levels) = raw.split_once('=').ok_or_else(err)?;
    let (low, high) = levels.split_once(',').ok_or_else(err)?;
    let low: f64 = low.trim().parse().map_err(|_| err())?;
    let high: f64 = high.trim().parse().map_err(|_| err())?;
    if name.trim().is_empty() {
        return Err(err());
    }
    Ok(Factor::new(name.trim(), low, high))
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "RUN")]
    run: usize,
    #[tabled(rename = "PATTERN")]
    pattern: String,
    #[tabled(rename = "SETTINGS")]
    settings: String,
    #[tabled(rename = "RESPONSE")]
    response: String,
}

fn design_rows(design: &FactorialDesign) -> Vec<RunRow> {
    design
        .runs()
        .iter()
        .map(|run| RunRow {
            run: run.index + 1,
            pattern: run.levels.iter().map(ToString::to_string).collect(),
            settings: design
                .factors()
                .iter()
                .enumerate()
                .map(|(j, f)| format!("{}={}", f.name, run.setting(design.factors(), j)))
                .collect::<Vec<_>>()
                .join("  "),
            response: run
                .response
                .map_or_else(|| "pending".to_string(), |y| format!("{y:.2}")),
        })
        .collect()
}

fn run_plan(args: DoePlanArgs) -> Result<()> {
    let factors = args
        .factors
        .iter()
        .map(|raw| parse_factor(raw))
        .collect::<Result<Vec<_>>>()?;

    let design = if args.half {
        FactorialDesign::half_fraction(factors).into_diagnostic()?
    } else {
        FactorialDesign::full(factors).into_diagnostic()?
    };

    println!(
        "{} {} design: {} factors, {} runs",
        style("◆").cyan(),
        if args.half { "half-fraction" } else { "full factorial" },
        design.factors().len(),
        design.runs().len()
    );
    println!("{}", Table::new(design_rows(&design)).with(Style::rounded()));
    Ok(())
}

/// The built-in experiment: how force, angle, and weight drive the
/// landing distance, with the simulator standing in for the process.
fn run_demo(args: DoeDemoArgs) -> Result<()> {
    if args.shots_per_run == 0 {
        return Err(miette!("--shots-per-run must be at least 1"));
    }

    let factors = vec![
        Factor::new("force", 140.0, 200.0),
        Factor::new("angle", 35.0, 55.0),
        Factor::new("weight", 0.0, 1.0), // 0 = light, 1 = heavy
    ];
    let mut design = FactorialDesign::full(factors).into_diagnostic()?;

    let target = TargetLayout::standard();
    let noise = ProcessNoise::new(3.0, 0.4).into_diagnostic()?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let runs: Vec<(usize, f64, f64, bool)> = design
        .runs()
        .iter()
        .map(|run| {
            (
                run.index,
                run.setting(design.factors(), 0),
                run.setting(design.factors(), 1),
                run.setting(design.factors(), 2) > 0.5,
            )
        })
        .collect();

    for (index, force, angle, heavy) in runs {
        let weight = if heavy {
            WeightClass::Heavy
        } else {
            WeightClass::Light
        };
        let settings = LaunchSettings::new(force, angle, weight)
            .into_diagnostic()?
            .with_air_resistance(true);

        let mut total = 0.0;
        for _ in 0..args.shots_per_run {
            total += fire(&settings, &noise, &target, &mut rng)
                .into_diagnostic()?
                .landing_x;
        }
        design
            .record_response(index, total / args.shots_per_run as f64)
            .into_diagnostic()?;
    }

    println!(
        "{} full factorial over force/angle/weight, {} shot(s) per run",
        style("◆").cyan(),
        args.shots_per_run
    );
    println!("{}", Table::new(design_rows(&design)).with(Style::rounded()));

    let analysis = design.effects().into_diagnostic()?;
    print_effects(&analysis);
    Ok(())
}

fn print_effects(analysis: &EffectAnalysis) {
    println!(
        "\n{} grand mean landing {:.2} m",
        style("◆").cyan(),
        analysis.grand_mean
    );
    println!("  main effects (mean high - mean low, ranked):");
    let mut ranked: Vec<_> = analysis.main_effects.iter().collect();
    ranked.sort_by_key(|e| e.rank);
    for effect in ranked {
        println!(
            "    {}. {:<8} {:>+9.3} m  (low {:.2}, high {:.2})",
            effect.rank, effect.factor_name, effect.effect, effect.low_mean, effect.high_mean
        );
    }
    if !analysis.interactions.is_empty() {
        println!("  pairwise interactions:");
        for interaction in &analysis.interactions {
            println!(
                "    {}x{} {:>+9.3} m",
                interaction.factor_names.0, interaction.factor_names.1, interaction.effect
            );
        }
    }
}
