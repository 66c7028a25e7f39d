//! Nelson rule pattern detection
//!
//! Scans a sequence of classified chart points against the eight
//! Nelson tests for special causes. Each rule is evaluated per point
//! using a window that ends at that point - no look-ahead - so
//! violations surface causally as data accumulates and the same scan
//! serves batch and incremental callers. A point may trigger several
//! rules at once; every triggered violation is reported.

use serde::{Deserialize, Serialize};

use super::chart::{ChartPoint, ControlLimits};

/// The eight Nelson tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NelsonRule {
    /// Rule 1: a single point beyond 3 sigma
    BeyondThreeSigma,
    /// Rule 2: 9 consecutive points on one side of center
    NineOneSide,
    /// Rule 3: 6 consecutive points steadily increasing or decreasing
    SixTrending,
    /// Rule 4: 14 consecutive points alternating up and down
    FourteenAlternating,
    /// Rule 5: 2 of 3 consecutive points beyond 2 sigma, same side
    TwoOfThreeBeyondTwoSigma,
    /// Rule 6: 4 of 5 consecutive points beyond 1 sigma, same side
    FourOfFiveBeyondOneSigma,
    /// Rule 7: 15 consecutive points within 1 sigma of center
    FifteenWithinOneSigma,
    /// Rule 8: 8 consecutive points beyond 1 sigma, both sides, none
    /// within 1 sigma
    EightBeyondOneSigma,
}

impl NelsonRule {
    /// Canonical rule number, 1..=8
    pub fn number(self) -> u8 {
        match self {
            NelsonRule::BeyondThreeSigma => 1,
            NelsonRule::NineOneSide => 2,
            NelsonRule::SixTrending => 3,
            NelsonRule::FourteenAlternating => 4,
            NelsonRule::TwoOfThreeBeyondTwoSigma => 5,
            NelsonRule::FourOfFiveBeyondOneSigma => 6,
            NelsonRule::FifteenWithinOneSigma => 7,
            NelsonRule::EightBeyondOneSigma => 8,
        }
    }

    /// Window length the rule inspects
    pub fn window(self) -> usize {
        match self {
            NelsonRule::BeyondThreeSigma => 1,
            NelsonRule::NineOneSide => 9,
            NelsonRule::SixTrending => 6,
            NelsonRule::FourteenAlternating => 14,
            NelsonRule::TwoOfThreeBeyondTwoSigma => 3,
            NelsonRule::FourOfFiveBeyondOneSigma => 5,
            NelsonRule::FifteenWithinOneSigma => 15,
            NelsonRule::EightBeyondOneSigma => 8,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            NelsonRule::BeyondThreeSigma => Severity::Critical,
            NelsonRule::NineOneSide
            | NelsonRule::TwoOfThreeBeyondTwoSigma
            | NelsonRule::FourOfFiveBeyondOneSigma => Severity::High,
            NelsonRule::SixTrending
            | NelsonRule::FourteenAlternating
            | NelsonRule::FifteenWithinOneSigma
            | NelsonRule::EightBeyondOneSigma => Severity::Moderate,
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            NelsonRule::BeyondThreeSigma => "point beyond the 3-sigma control limits",
            NelsonRule::NineOneSide => "9 consecutive points on one side of the center line",
            NelsonRule::SixTrending => "6 consecutive points steadily increasing or decreasing",
            NelsonRule::FourteenAlternating => "14 consecutive points alternating up and down",
            NelsonRule::TwoOfThreeBeyondTwoSigma => {
                "2 of 3 consecutive points beyond 2 sigma on the same side"
            }
            NelsonRule::FourOfFiveBeyondOneSigma => {
                "4 of 5 consecutive points beyond 1 sigma on the same side"
            }
            NelsonRule::FifteenWithinOneSigma => {
                "15 consecutive points within 1 sigma of the center line"
            }
            NelsonRule::EightBeyondOneSigma => {
                "8 consecutive points beyond 1 sigma with none near center"
            }
        }
    }
}

/// How strongly a violation signals an out-of-control process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Moderate,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Moderate => write!(f, "moderate"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One detected out-of-control pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NelsonViolation {
    pub rule: NelsonRule,

    /// Inclusive (first, last) point indices of the pattern window
    pub span: (usize, usize),

    pub severity: Severity,
    pub description: String,
}

impl NelsonViolation {
    fn at(rule: NelsonRule, span: (usize, usize)) -> Self {
        let description = if span.0 == span.1 {
            format!("{} at point {}", rule.pattern(), span.1)
        } else {
            format!("{} ending at point {}", rule.pattern(), span.1)
        };
        Self {
            rule,
            span,
            severity: rule.severity(),
            description,
        }
    }
}

/// Scan classified X-bar (or R) points against all eight Nelson rules.
///
/// `points` must be in firing order; each rule inspects only the
/// window ending at the point it reports on. Violations are returned
/// sorted by the index of their last point, then by rule number.
pub fn scan(points: &[ChartPoint], limits: &ControlLimits) -> Vec<NelsonViolation> {
    let sigma = limits.sigma();
    let mut violations = Vec::new();

    for (i, point) in points.iter().enumerate() {
        check_rule1(point, limits, &mut violations);
        check_rule2(points, i, limits, &mut violations);
        check_rule3(points, i, &mut violations);
        check_rule4(points, i, &mut violations);
        check_rule5(points, i, limits, sigma, &mut violations);
        check_rule6(points, i, limits, sigma, &mut violations);
        check_rule7(points, i, limits, sigma, &mut violations);
        check_rule8(points, i, limits, sigma, &mut violations);
    }

    violations.sort_by_key(|v| (v.span.1, v.rule.number()));
    violations
}

/// Window of the last `len` points ending at `i`, if that many exist.
fn window(points: &[ChartPoint], i: usize, len: usize) -> Option<&[ChartPoint]> {
    (i + 1 >= len).then(|| &points[i + 1 - len..=i])
}

fn check_rule1(point: &ChartPoint, limits: &ControlLimits, out: &mut Vec<NelsonViolation>) {
    if point.value > limits.ucl || point.value < limits.lcl {
        out.push(NelsonViolation::at(
            NelsonRule::BeyondThreeSigma,
            (point.index, point.index),
        ));
    }
}

fn check_rule2(
    points: &[ChartPoint],
    i: usize,
    limits: &ControlLimits,
    out: &mut Vec<NelsonViolation>,
) {
    let Some(w) = window(points, i, NelsonRule::NineOneSide.window()) else {
        return;
    };
    let all_above = w.iter().all(|p| p.value > limits.cl);
    let all_below = w.iter().all(|p| p.value < limits.cl);
    if all_above || all_below {
        out.push(NelsonViolation::at(
            NelsonRule::NineOneSide,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule3(points: &[ChartPoint], i: usize, out: &mut Vec<NelsonViolation>) {
    let Some(w) = window(points, i, NelsonRule::SixTrending.window()) else {
        return;
    };
    let increasing = w.windows(2).all(|p| p[1].value > p[0].value);
    let decreasing = w.windows(2).all(|p| p[1].value < p[0].value);
    if increasing || decreasing {
        out.push(NelsonViolation::at(
            NelsonRule::SixTrending,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule4(points: &[ChartPoint], i: usize, out: &mut Vec<NelsonViolation>) {
    let Some(w) = window(points, i, NelsonRule::FourteenAlternating.window()) else {
        return;
    };
    // Direction of each consecutive step: must flip every time, with
    // no flat steps
    let alternating = w.windows(3).all(|p| {
        let d1 = p[1].value - p[0].value;
        let d2 = p[2].value - p[1].value;
        d1 != 0.0 && d2 != 0.0 && (d1 > 0.0) != (d2 > 0.0)
    }) && w[1].value != w[0].value;
    if alternating {
        out.push(NelsonViolation::at(
            NelsonRule::FourteenAlternating,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule5(
    points: &[ChartPoint],
    i: usize,
    limits: &ControlLimits,
    sigma: f64,
    out: &mut Vec<NelsonViolation>,
) {
    let Some(w) = window(points, i, NelsonRule::TwoOfThreeBeyondTwoSigma.window()) else {
        return;
    };
    let above = w.iter().filter(|p| p.value > limits.cl + 2.0 * sigma).count();
    let below = w.iter().filter(|p| p.value < limits.cl - 2.0 * sigma).count();
    if above >= 2 || below >= 2 {
        out.push(NelsonViolation::at(
            NelsonRule::TwoOfThreeBeyondTwoSigma,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule6(
    points: &[ChartPoint],
    i: usize,
    limits: &ControlLimits,
    sigma: f64,
    out: &mut Vec<NelsonViolation>,
) {
    let Some(w) = window(points, i, NelsonRule::FourOfFiveBeyondOneSigma.window()) else {
        return;
    };
    let above = w.iter().filter(|p| p.value > limits.cl + sigma).count();
    let below = w.iter().filter(|p| p.value < limits.cl - sigma).count();
    if above >= 4 || below >= 4 {
        out.push(NelsonViolation::at(
            NelsonRule::FourOfFiveBeyondOneSigma,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule7(
    points: &[ChartPoint],
    i: usize,
    limits: &ControlLimits,
    sigma: f64,
    out: &mut Vec<NelsonViolation>,
) {
    let Some(w) = window(points, i, NelsonRule::FifteenWithinOneSigma.window()) else {
        return;
    };
    if w.iter()
        .all(|p| (p.value - limits.cl).abs() <= sigma)
    {
        out.push(NelsonViolation::at(
            NelsonRule::FifteenWithinOneSigma,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

fn check_rule8(
    points: &[ChartPoint],
    i: usize,
    limits: &ControlLimits,
    sigma: f64,
    out: &mut Vec<NelsonViolation>,
) {
    let Some(w) = window(points, i, NelsonRule::EightBeyondOneSigma.window()) else {
        return;
    };
    let none_within = w.iter().all(|p| (p.value - limits.cl).abs() > sigma);
    let has_above = w.iter().any(|p| p.value > limits.cl);
    let has_below = w.iter().any(|p| p.value < limits.cl);
    if none_within && has_above && has_below {
        out.push(NelsonViolation::at(
            NelsonRule::EightBeyondOneSigma,
            (w[0].index, w[w.len() - 1].index),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spc::chart::LimitPosition;

    const LIMITS: ControlLimits = ControlLimits {
        ucl: 13.0,
        cl: 10.0,
        lcl: 7.0,
    }; // sigma = 1.0

    fn points(values: &[f64]) -> Vec<ChartPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ChartPoint {
                index: i,
                value: v,
                sigma_distance: v - LIMITS.cl,
                position: if v > LIMITS.ucl {
                    LimitPosition::AboveUcl
                } else if v < LIMITS.lcl {
                    LimitPosition::BelowLcl
                } else {
                    LimitPosition::Inside
                },
            })
            .collect()
    }

    fn rules_fired(violations: &[NelsonViolation]) -> Vec<u8> {
        violations.iter().map(|v| v.rule.number()).collect()
    }

    #[test]
    fn test_rule1_only_for_isolated_extreme_point() {
        // Mixed-side stable points, then one at 3.5 sigma: rule 1 and
        // nothing else may fire
        let pts = points(&[10.2, 9.8, 10.1, 9.9, 10.2, 9.8, 10.1, 13.5]);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![1]);
        assert_eq!(violations[0].span, (7, 7));
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_rule1_below_lcl() {
        let pts = points(&[10.0, 6.5, 10.0]);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![1]);
        assert_eq!(violations[0].span, (1, 1));
    }

    #[test]
    fn test_rule2_fires_exactly_at_ninth_point() {
        // 9 points just above center, alternating by a hair to dodge
        // rules 3 and 4
        let values: Vec<f64> = (0..9)
            .map(|i| if i % 2 == 0 { 10.2 } else { 10.3 })
            .collect();
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![2]);
        assert_eq!(violations[0].span, (0, 8));

        // One fewer point: nothing fires
        let pts = points(&values[..8]);
        assert!(scan(&pts, &LIMITS).is_empty());
    }

    #[test]
    fn test_rule2_fires_again_while_run_continues() {
        let values: Vec<f64> = (0..10)
            .map(|i| if i % 2 == 0 { 10.2 } else { 10.3 })
            .collect();
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        let spans: Vec<_> = violations.iter().map(|v| v.span).collect();
        assert_eq!(spans, vec![(0, 8), (1, 9)]);
    }

    #[test]
    fn test_rule3_trend_up_and_down() {
        let up = points(&[9.0, 9.2, 9.4, 9.6, 9.8, 10.0]);
        let violations = scan(&up, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![3]);

        let down = points(&[11.0, 10.8, 10.6, 10.4, 10.2, 10.0]);
        assert_eq!(rules_fired(&scan(&down, &LIMITS)), vec![3]);

        // A flat step breaks the trend
        let flat = points(&[9.0, 9.2, 9.4, 9.4, 9.8, 10.0]);
        assert!(scan(&flat, &LIMITS).is_empty());
    }

    #[test]
    fn test_rule4_fourteen_alternating() {
        let values: Vec<f64> = (0..14)
            .map(|i| if i % 2 == 0 { 9.6 } else { 10.4 })
            .collect();
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![4]);
        assert_eq!(violations[0].span, (0, 13));

        let pts = points(&values[..13]);
        assert!(scan(&pts, &LIMITS).is_empty());
    }

    #[test]
    fn test_rule5_two_of_three_beyond_two_sigma() {
        // Two of three above cl + 2 sigma = 12.0, middle point benign
        let pts = points(&[12.5, 10.0, 12.5]);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![5]);
        assert_eq!(violations[0].span, (0, 2));
    }

    #[test]
    fn test_rule5_opposite_sides_do_not_combine() {
        // One beyond +2 sigma, one beyond -2 sigma: same-side
        // requirement not met
        let pts = points(&[12.5, 10.0, 7.5]);
        assert!(scan(&pts, &LIMITS).is_empty());
    }

    #[test]
    fn test_rule6_four_of_five_beyond_one_sigma() {
        // Four of five above cl + sigma = 11.0, staggered against
        // rules 3/4
        let pts = points(&[11.5, 11.2, 10.0, 11.4, 11.3]);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![6]);
    }

    #[test]
    fn test_rule7_fifteen_hugging_center() {
        let values: Vec<f64> = (0..15)
            .map(|i| 10.0 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        assert!(rules_fired(&violations).contains(&7));
        assert!(!rules_fired(&violations).contains(&8));
    }

    #[test]
    fn test_rule8_mixture_avoiding_center() {
        // Two up, two down keeps runs shorter than rule 2's nine and
        // alternation shorter than rule 4's fourteen
        let values = [11.5, 11.6, 8.5, 8.4, 11.5, 11.6, 8.5, 8.4];
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        assert_eq!(rules_fired(&violations), vec![8]);
        assert_eq!(violations[0].span, (0, 7));
    }

    #[test]
    fn test_rule8_requires_both_sides() {
        // Eight beyond 1 sigma but all above center: a shift, not a
        // mixture - rule 8 must stay quiet (rule 2 fires at 9, not 8)
        let values = [11.5, 11.6, 11.5, 11.6, 11.5, 11.6, 11.5, 11.6];
        let pts = points(&values);
        let violations = scan(&pts, &LIMITS);
        assert!(!rules_fired(&violations).contains(&8));
    }

    #[test]
    fn test_overlapping_rules_all_reported() {
        // 9 increasing points on one side: rule 2 at the 9th and rule
        // 3 from the 6th onward, none suppressed
        let values: Vec<f64> = (0..9).map(|i| 10.1 + 0.2 * i as f64).collect();
        let pts = points(&values);
        let fired = rules_fired(&scan(&pts, &LIMITS));
        assert!(fired.contains(&2));
        assert!(fired.contains(&3));
    }

    #[test]
    fn test_scan_is_causal() {
        // Violations found in a prefix must be identical to the same
        // prefix of a longer scan
        let values: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { 10.2 } else { 10.3 })
            .collect();
        let pts = points(&values);
        let full = scan(&pts, &LIMITS);
        let prefix = scan(&pts[..9], &LIMITS);
        let full_early: Vec<_> = full.iter().filter(|v| v.span.1 <= 8).collect();
        assert_eq!(prefix.len(), full_early.len());
        for (a, b) in prefix.iter().zip(full_early) {
            assert_eq!(a.rule, b.rule);
            assert_eq!(a.span, b.span);
        }
    }

    #[test]
    fn test_quiet_random_sequence() {
        let pts = points(&[10.2, 9.7, 10.4, 9.9, 10.1, 9.6, 10.3, 9.8]);
        assert!(scan(&pts, &LIMITS).is_empty());
    }
}
