//! `launchlab analyze` - descriptive, normality, and capability cards
//! for a recorded session

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::args::{AnalyzeArgs, FormatArg};
use crate::cli::session::SessionFile;
use crate::stats::{
    describe, normality_report, CapabilityAnalysis, CapabilityStudy, DescriptiveStats,
    NormalityReport, NormalityTestResult, Rated, SpecLimits,
};

/// Everything the command computed, for structured output formats
#[derive(Serialize)]
struct AnalysisReport {
    descriptive: DescriptiveStats,
    normality: NormalityReport,
    capability: Option<CapabilityAnalysis>,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let session = SessionFile::load(&args.session)?;
    let measurements = session.measurements();

    let descriptive = describe(&measurements).into_diagnostic()?;
    let normality = normality_report(&measurements, args.alpha.into()).into_diagnostic()?;

    let capability = match (args.lsl, args.usl) {
        (None, None) => None,
        (lsl, usl) => {
            let mut limits = SpecLimits::new(lsl, usl).into_diagnostic()?;
            if let Some(target) = args.target {
                limits = limits.with_target(target);
            }
            Some(
                CapabilityStudy::new(limits)
                    .analyze(&measurements, None)
                    .into_diagnostic()?,
            )
        }
    };

    let report = AnalysisReport {
        descriptive,
        normality,
        capability,
    };

    match args.format {
        FormatArg::Yaml => print!("{}", serde_yml::to_string(&report).into_diagnostic()?),
        FormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?)
        }
        FormatArg::Table => print_cards(&report),
    }
    Ok(())
}

fn print_cards(report: &AnalysisReport) {
    let d = &report.descriptive;
    println!("{} Descriptive statistics (n = {})", style("◆").cyan(), d.n);
    println!("  mean      {:>10.3} m", d.mean);
    println!("  std-dev   {:>10.4} m  (population {:.4})", d.std_dev, d.std_dev_population);
    println!("  min / max {:>10.3} / {:.3} m  (range {:.3})", d.min, d.max, d.range);
    println!("  quartiles {:>10.3} / {:.3} / {:.3}", d.q1, d.median, d.q3);
    if let Some(skew) = d.skewness {
        println!("  skewness  {:>10.4}", skew);
    }
    if let Some(kurt) = d.kurtosis {
        println!("  kurtosis  {:>10.4}", kurt);
    }

    let n = &report.normality;
    println!(
        "\n{} Normality (alpha = {})",
        style("◆").cyan(),
        n.alpha.value()
    );
    for test in [&n.anderson_darling, &n.shapiro_wilk, &n.kolmogorov_smirnov] {
        print_test_line(test);
    }
    let verdict = if n.all_passed() {
        style("consistent with a normal process").green()
    } else {
        style("NOT consistent with a normal process").red()
    };
    println!("  overall: {verdict}");

    if let Some(c) = &report.capability {
        println!("\n{} Capability", style("◆").cyan());
        if c.approximate {
            println!(
                "  {}",
                style("(within-subgroup sigma unavailable; short-term indices use overall sigma)")
                    .dim()
            );
        }
        print_index_line("Cp", c.cp.as_ref());
        print_index_line("Cpk", Some(&c.cpk));
        print_index_line("Pp", c.pp.as_ref());
        print_index_line("Ppk", Some(&c.ppk));
        print_index_line("Cpm", c.cpm.as_ref());
        println!("  sigma level {:>8.2}", c.sigma_level);
        println!("  DPMO        {:>8.0}", c.dpmo);
        println!("  yield       {:>8.3} %", c.yield_percent);
    }
}

fn print_test_line(test: &NormalityTestResult) {
    let verdict = if test.passed {
        style("pass").green()
    } else {
        style("fail").red()
    };
    let critical = test
        .critical_value
        .map_or_else(String::new, |cv| format!("  critical {cv:.3}"));
    println!(
        "  {:<20} statistic {:.4}{}  p {:.4}  [{}]",
        test.test.to_string(),
        test.statistic,
        critical,
        test.p_value,
        verdict
    );
}

fn print_index_line(name: &str, index: Option<&Rated>) {
    if let Some(rated) = index {
        println!("  {:<4} {:>8.3}  ({})", name, rated.value, rated.rating);
    }
}
