//! Terminal visualization using braille graphics
//!
//! Renders the X-bar control chart and trajectory arcs as compact
//! Unicode braille sketches for quick inspection without leaving the
//! terminal.

use drawille::Canvas;

use crate::sim::Trajectory;
use crate::spc::{ChartPoint, ControlLimits};

/// Canvas size for the control chart sketch
const CHART_WIDTH: u32 = 120;
const CHART_HEIGHT: u32 = 40;

/// Canvas size for the trajectory sketch
const ARC_WIDTH: u32 = 120;
const ARC_HEIGHT: u32 = 32;

/// Render an X-bar chart: points connected by lines, with the center
/// line and both control limits drawn across the canvas.
pub fn control_chart_sketch(points: &[ChartPoint], limits: &ControlLimits) -> String {
    if points.is_empty() {
        return "  (no subgroups)".to_string();
    }

    let mut canvas = Canvas::new(CHART_WIDTH, CHART_HEIGHT);

    // View range: the limits plus 20% headroom, widened to include
    // any runaway points
    let mut view_min = limits.lcl;
    let mut view_max = limits.ucl;
    for p in points {
        view_min = view_min.min(p.value);
        view_max = view_max.max(p.value);
    }
    let margin = (view_max - view_min) * 0.2;
    view_min -= margin;
    view_max += margin;
    let span = view_max - view_min;

    let scale_y = |value: f64| -> u32 {
        let frac = ((value - view_min) / span).clamp(0.0, 1.0);
        ((1.0 - frac) * (CHART_HEIGHT - 1) as f64) as u32
    };
    let scale_x = |index: usize| -> u32 {
        if points.len() == 1 {
            return 0;
        }
        (index as f64 / (points.len() - 1) as f64 * (CHART_WIDTH - 1) as f64) as u32
    };

    // Horizontal reference lines (dashed)
    for line in [limits.ucl, limits.cl, limits.lcl] {
        let y = scale_y(line);
        let mut x = 0;
        while x < CHART_WIDTH {
            canvas.set(x, y);
            x += 3;
        }
    }

    // Points connected in sequence
    for pair in points.windows(2) {
        canvas.line(
            scale_x(pair[0].index),
            scale_y(pair[0].value),
            scale_x(pair[1].index),
            scale_y(pair[1].value),
        );
    }
    for p in points {
        let (x, y) = (scale_x(p.index), scale_y(p.value));
        canvas.set(x, y);
        canvas.set(x, y.saturating_sub(1));
        canvas.set(x, (y + 1).min(CHART_HEIGHT - 1));
    }

    let mut output = String::new();
    output.push_str(&canvas.frame());
    output.push_str(&format!(
        "\n  UCL {:.3}   CL {:.3}   LCL {:.3}",
        limits.ucl, limits.cl, limits.lcl
    ));
    output
}

/// Render a flight arc: height against downrange distance.
pub fn trajectory_sketch(trajectory: &Trajectory) -> String {
    let mut canvas = Canvas::new(ARC_WIDTH, ARC_HEIGHT);

    let max_x = trajectory.landing_x.max(1e-6);
    let max_y = trajectory.peak_height.max(1e-6);

    for point in &trajectory.points {
        let px = (point.position.x / max_x * (ARC_WIDTH - 1) as f64).clamp(0.0, (ARC_WIDTH - 1) as f64);
        let py = (1.0 - point.position.y / max_y).clamp(0.0, 1.0) * (ARC_HEIGHT - 1) as f64;
        canvas.set(px as u32, py as u32);
    }

    // Ground line
    for x in 0..ARC_WIDTH {
        canvas.set(x, ARC_HEIGHT - 1);
    }

    let mut output = String::new();
    output.push_str(&canvas.frame());
    output.push_str(&format!(
        "\n  range {:.1} m   peak {:.1} m   flight {:.2} s",
        trajectory.landing_x, trajectory.peak_height, trajectory.flight_time
    ));
    output
}
