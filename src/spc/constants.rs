//! SPC control-chart constants
//!
//! Standard factors for variables charts, indexed by subgroup size
//! n = 2..=10. Embedded configuration data, not runtime state.

use super::SpcError;

/// A2 factors for X-bar chart limits: UCL/LCL = X-double-bar +/- A2 * R-bar.
const A2: [f64; 9] = [1.880, 1.023, 0.729, 0.577, 0.483, 0.419, 0.373, 0.337, 0.308];

/// D3 factors for the R chart lower limit: LCL_R = D3 * R-bar.
const D3: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 0.0, 0.076, 0.136, 0.184, 0.223];

/// D4 factors for the R chart upper limit: UCL_R = D4 * R-bar.
const D4: [f64; 9] = [3.267, 2.575, 2.282, 2.114, 2.004, 1.924, 1.864, 1.816, 1.777];

/// d2 factors for the within-subgroup sigma estimate: sigma = R-bar / d2.
const D2: [f64; 9] = [1.128, 1.693, 2.059, 2.326, 2.534, 2.704, 2.847, 2.970, 3.078];

/// The chart factors for one subgroup size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpcConstants {
    pub n: usize,
    pub a2: f64,
    pub d3: f64,
    pub d4: f64,
    pub d2: f64,
}

impl SpcConstants {
    /// Look up the factors for subgroup size `n`.
    ///
    /// # Errors
    ///
    /// `UnsupportedSubgroupSize` outside 2..=10.
    pub fn for_subgroup_size(n: usize) -> Result<Self, SpcError> {
        if !(2..=10).contains(&n) {
            return Err(SpcError::UnsupportedSubgroupSize { size: n });
        }
        let i = n - 2;
        Ok(Self {
            n,
            a2: A2[i],
            d3: D3[i],
            d4: D4[i],
            d2: D2[i],
        })
    }
}
