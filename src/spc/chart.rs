//! X-bar and R control chart construction
//!
//! Builds center lines and control limits from a sequence of
//! completed, same-size subgroups, classifies every subgroup statistic
//! against its limits, and exposes the within-subgroup sigma estimate
//! (R-bar / d2) consumed by the capability layer.

use serde::{Deserialize, Serialize};

use super::constants::SpcConstants;
use super::SpcError;

/// An ordered, fixed-size group of consecutive measurements.
///
/// Immutable once built; partial subgroups are never constructed (see
/// [`partition_subgroups`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subgroup {
    /// Zero-based position in firing order
    pub index: usize,
    values: Vec<f64>,
}

impl Subgroup {
    /// Build a subgroup from consecutive measurements.
    ///
    /// # Errors
    ///
    /// `UnsupportedSubgroupSize` when the size is outside 2..=10,
    /// `NonFiniteMeasurement` on NaN or infinite values.
    pub fn new(index: usize, values: Vec<f64>) -> Result<Self, SpcError> {
        if !(2..=10).contains(&values.len()) {
            return Err(SpcError::UnsupportedSubgroupSize { size: values.len() });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SpcError::NonFiniteMeasurement { index });
        }
        Ok(Self { index, values })
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn range(&self) -> f64 {
        let mut min = self.values[0];
        let mut max = self.values[0];
        for &v in &self.values[1..] {
            min = min.min(v);
            max = max.max(v);
        }
        max - min
    }
}

/// Partition a measurement series into complete subgroups of `size`,
/// in firing order. A trailing partial group is discarded, never
/// analyzed.
pub fn partition_subgroups(measurements: &[f64], size: usize) -> Result<Vec<Subgroup>, SpcError> {
    if !(2..=10).contains(&size) {
        return Err(SpcError::UnsupportedSubgroupSize { size });
    }
    measurements
        .chunks_exact(size)
        .enumerate()
        .map(|(i, chunk)| Subgroup::new(i, chunk.to_vec()))
        .collect()
}

/// Center line and control limits for one chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    pub ucl: f64,
    pub cl: f64,
    pub lcl: f64,
}

impl ControlLimits {
    /// One-sigma zone width, from the 3-sigma limit spread
    pub fn sigma(&self) -> f64 {
        (self.ucl - self.cl) / 3.0
    }
}

/// Where a point sits relative to its control limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPosition {
    Inside,
    AboveUcl,
    BelowLcl,
}

/// A classified point on a control chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Subgroup sequence index
    pub index: usize,

    /// The plotted statistic (subgroup mean or range)
    pub value: f64,

    /// Signed distance from the center line in sigma units
    pub sigma_distance: f64,

    pub position: LimitPosition,
}

/// A built X-bar/R chart: limits, classified points, and the
/// within-subgroup sigma estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XbarRChart {
    pub subgroup_size: usize,

    /// X-double-bar: grand mean of subgroup means
    pub grand_mean: f64,

    /// R-bar: mean subgroup range
    pub mean_range: f64,

    pub xbar_limits: ControlLimits,
    pub r_limits: ControlLimits,

    pub xbar_points: Vec<ChartPoint>,
    pub r_points: Vec<ChartPoint>,
}

impl XbarRChart {
    /// Build the chart from completed subgroups.
    ///
    /// All subgroups must share one size n in 2..=10; the A2/D3/D4
    /// factors are looked up for that n. X-bar limits are
    /// X-double-bar +/- A2 * R-bar; R limits are D4 * R-bar and
    /// D3 * R-bar.
    ///
    /// # Errors
    ///
    /// `InsufficientSubgroups` below 2 subgroups,
    /// `MismatchedSubgroupSize` on inconsistent sizes,
    /// `UnsupportedSubgroupSize` outside the constant table,
    /// `DegenerateSubgroups` when R-bar is zero.
    pub fn build(subgroups: &[Subgroup]) -> Result<Self, SpcError> {
        if subgroups.len() < 2 {
            return Err(SpcError::InsufficientSubgroups {
                required: 2,
                actual: subgroups.len(),
            });
        }

        let n = subgroups[0].size();
        for sg in subgroups {
            if sg.size() != n {
                return Err(SpcError::MismatchedSubgroupSize {
                    index: sg.index,
                    expected: n,
                    actual: sg.size(),
                });
            }
        }
        let constants = SpcConstants::for_subgroup_size(n)?;

        let k = subgroups.len() as f64;
        let grand_mean = subgroups.iter().map(Subgroup::mean).sum::<f64>() / k;
        let mean_range = subgroups.iter().map(Subgroup::range).sum::<f64>() / k;

        if mean_range < 1e-300 {
            return Err(SpcError::DegenerateSubgroups);
        }

        let xbar_limits = ControlLimits {
            ucl: grand_mean + constants.a2 * mean_range,
            cl: grand_mean,
            lcl: grand_mean - constants.a2 * mean_range,
        };
        let r_limits = ControlLimits {
            ucl: constants.d4 * mean_range,
            cl: mean_range,
            lcl: constants.d3 * mean_range,
        };

        let xbar_points = subgroups
            .iter()
            .map(|sg| classify(sg.index, sg.mean(), &xbar_limits))
            .collect();
        let r_points = subgroups
            .iter()
            .map(|sg| classify(sg.index, sg.range(), &r_limits))
            .collect();

        Ok(Self {
            subgroup_size: n,
            grand_mean,
            mean_range,
            xbar_limits,
            r_limits,
            xbar_points,
            r_points,
        })
    }

    /// Within-subgroup sigma estimate R-bar / d2, the short-term sigma
    /// fed to [`crate::stats::CapabilityStudy::analyze`].
    pub fn sigma_within(&self) -> f64 {
        // Table lookup cannot fail: build() already validated n
        let constants = SpcConstants::for_subgroup_size(self.subgroup_size)
            .expect("subgroup size validated at build");
        self.mean_range / constants.d2
    }

    /// true when every point on both charts is inside its limits
    pub fn in_control(&self) -> bool {
        self.xbar_points
            .iter()
            .chain(self.r_points.iter())
            .all(|p| p.position == LimitPosition::Inside)
    }
}

fn classify(index: usize, value: f64, limits: &ControlLimits) -> ChartPoint {
    let position = if value > limits.ucl {
        LimitPosition::AboveUcl
    } else if value < limits.lcl {
        LimitPosition::BelowLcl
    } else {
        LimitPosition::Inside
    };
    let sigma = limits.sigma();
    ChartPoint {
        index,
        value,
        sigma_distance: if sigma > 0.0 {
            (value - limits.cl) / sigma
        } else {
            0.0
        },
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subgroups_from(rows: &[&[f64]]) -> Vec<Subgroup> {
        rows.iter()
            .enumerate()
            .map(|(i, r)| Subgroup::new(i, r.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_subgroup_statistics() {
        let sg = Subgroup::new(0, vec![4.0, 6.0, 5.0, 7.0, 3.0]).unwrap();
        assert_eq!(sg.size(), 5);
        assert!((sg.mean() - 5.0).abs() < 1e-12);
        assert!((sg.range() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_subgroup_size_bounds() {
        assert!(matches!(
            Subgroup::new(0, vec![1.0]),
            Err(SpcError::UnsupportedSubgroupSize { size: 1 })
        ));
        assert!(matches!(
            Subgroup::new(0, vec![0.0; 11]),
            Err(SpcError::UnsupportedSubgroupSize { size: 11 })
        ));
    }

    #[test]
    fn test_partition_drops_trailing_partial() {
        let data: Vec<f64> = (0..23).map(|i| i as f64).collect();
        let groups = partition_subgroups(&data, 5).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[3].values(), &[15.0, 16.0, 17.0, 18.0, 19.0]);
        assert_eq!(groups[0].index, 0);
        assert_eq!(groups[3].index, 3);
    }

    #[test]
    fn test_partition_rejects_bad_size() {
        let data = [1.0; 30];
        assert!(partition_subgroups(&data, 1).is_err());
        assert!(partition_subgroups(&data, 15).is_err());
    }

    #[test]
    fn test_limits_match_hand_computation_n5() {
        // Two subgroups of 5 with known means and ranges
        let groups = subgroups_from(&[
            &[10.0, 11.0, 9.0, 10.5, 9.5],  // mean 10.0, range 2.0
            &[12.0, 11.0, 13.0, 11.5, 12.5], // mean 12.0, range 2.0
        ]);
        let chart = XbarRChart::build(&groups).unwrap();

        assert!((chart.grand_mean - 11.0).abs() < 1e-12);
        assert!((chart.mean_range - 2.0).abs() < 1e-12);

        // For n=5: A2 = 0.577, D3 = 0, D4 = 2.114
        // UCL_X = 11.0 + 0.577 * 2.0 = 12.154 (to 3 decimal places)
        assert!((chart.xbar_limits.ucl - 12.154).abs() < 5e-4);
        assert!((chart.xbar_limits.lcl - 9.846).abs() < 5e-4);
        assert!((chart.r_limits.ucl - 4.228).abs() < 5e-4);
        assert!((chart.r_limits.lcl).abs() < 1e-12);
    }

    #[test]
    fn test_sigma_within_is_rbar_over_d2() {
        let groups = subgroups_from(&[
            &[10.0, 11.0, 9.0, 10.5, 9.5],
            &[12.0, 11.0, 13.0, 11.5, 12.5],
        ]);
        let chart = XbarRChart::build(&groups).unwrap();
        assert!((chart.sigma_within() - 2.0 / 2.326).abs() < 1e-9);
    }

    #[test]
    fn test_point_classification() {
        let groups = subgroups_from(&[
            &[10.0, 10.2, 9.8],
            &[10.1, 9.9, 10.0],
            &[10.0, 10.1, 9.9],
            &[14.0, 14.2, 13.8], // far above the others
        ]);
        let chart = XbarRChart::build(&groups).unwrap();
        assert_eq!(chart.xbar_points[3].position, LimitPosition::AboveUcl);
        assert!(chart.xbar_points[3].sigma_distance > 3.0);
        assert!(!chart.in_control());
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let groups = vec![
            Subgroup::new(0, vec![1.0, 2.0, 3.0]).unwrap(),
            Subgroup::new(1, vec![1.0, 2.0]).unwrap(),
        ];
        assert!(matches!(
            XbarRChart::build(&groups),
            Err(SpcError::MismatchedSubgroupSize {
                index: 1,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_degenerate_ranges_rejected() {
        let groups = subgroups_from(&[&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]]);
        assert!(matches!(
            XbarRChart::build(&groups),
            Err(SpcError::DegenerateSubgroups)
        ));
    }

    #[test]
    fn test_single_subgroup_insufficient() {
        let groups = subgroups_from(&[&[1.0, 2.0, 3.0]]);
        assert!(matches!(
            XbarRChart::build(&groups),
            Err(SpcError::InsufficientSubgroups {
                required: 2,
                actual: 1
            })
        ));
    }
}
