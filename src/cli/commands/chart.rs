//! `launchlab chart` - X-bar/R control chart with Nelson rule
//! detection for a recorded session

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::args::{ChartArgs, FormatArg};
use crate::cli::session::SessionFile;
use crate::cli::viz;
use crate::spc::{partition_subgroups, scan, LimitPosition, NelsonViolation, XbarRChart};

#[derive(Serialize)]
struct ChartReport {
    chart: XbarRChart,
    sigma_within: f64,
    violations: Vec<NelsonViolation>,
}

#[derive(Tabled)]
struct SubgroupRow {
    #[tabled(rename = "SUBGROUP")]
    index: usize,
    #[tabled(rename = "X-BAR")]
    mean: String,
    #[tabled(rename = "RANGE")]
    range: String,
    #[tabled(rename = "POSITION")]
    position: String,
}

pub fn run(args: ChartArgs) -> Result<()> {
    let session = SessionFile::load(&args.session)?;
    let measurements = session.measurements();

    let subgroups = partition_subgroups(&measurements, args.subgroup_size).into_diagnostic()?;
    let dropped = measurements.len() - subgroups.len() * args.subgroup_size;
    let chart = XbarRChart::build(&subgroups).into_diagnostic()?;
    let violations = scan(&chart.xbar_points, &chart.xbar_limits);

    if args.format != FormatArg::Table {
        let report = ChartReport {
            sigma_within: chart.sigma_within(),
            chart,
            violations,
        };
        match args.format {
            FormatArg::Yaml => print!("{}", serde_yml::to_string(&report).into_diagnostic()?),
            FormatArg::Json => {
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?)
            }
            FormatArg::Table => unreachable!(),
        }
        return Ok(());
    }

    println!(
        "{} X-bar/R chart  ({} subgroups of {}{})",
        style("◆").cyan(),
        subgroups.len(),
        args.subgroup_size,
        if dropped > 0 {
            format!(", {dropped} trailing shots dropped")
        } else {
            String::new()
        },
    );
    println!(
        "  X-bar: UCL {:.3}  CL {:.3}  LCL {:.3}",
        chart.xbar_limits.ucl, chart.xbar_limits.cl, chart.xbar_limits.lcl
    );
    println!(
        "  R:     UCL {:.3}  CL {:.3}  LCL {:.3}",
        chart.r_limits.ucl, chart.r_limits.cl, chart.r_limits.lcl
    );
    println!("  sigma (R-bar/d2) {:.4}", chart.sigma_within());

    let rows: Vec<SubgroupRow> = chart
        .xbar_points
        .iter()
        .zip(&chart.r_points)
        .map(|(x, r)| SubgroupRow {
            index: x.index + 1,
            mean: format!("{:.3}", x.value),
            range: format!("{:.3}", r.value),
            position: match x.position {
                LimitPosition::Inside => "inside".to_string(),
                LimitPosition::AboveUcl => "ABOVE UCL".to_string(),
                LimitPosition::BelowLcl => "BELOW LCL".to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if violations.is_empty() {
        println!("{} no Nelson rule violations - process in control", style("✓").green());
    } else {
        println!(
            "{} {} Nelson rule violation(s):",
            style("✗").red(),
            violations.len()
        );
        for v in &violations {
            println!(
                "  rule {} [{}] points {}..{}: {}",
                v.rule.number(),
                v.severity,
                v.span.0 + 1,
                v.span.1 + 1,
                v.description
            );
        }
    }

    if args.sketch {
        println!("\n{}", viz::control_chart_sketch(&chart.xbar_points, &chart.xbar_limits));
    }

    Ok(())
}
