//! Landing-position scoring
//!
//! Maps a downrange landing position to a target zone and a score
//! breakdown. Zones are concentric rings around the target center,
//! resolved by a distance-based containment test; landing outside
//! every ring is a miss with a zero breakdown, not a failure.

use serde::{Deserialize, Serialize};

use super::SimError;

/// Largest distance bonus, awarded for a dead-center hit
const DISTANCE_BONUS_MAX: f64 = 25.0;

/// One scoring ring around the target center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRing {
    /// Containment radius, m (a landing within this distance of
    /// center and outside all smaller rings belongs to this ring)
    pub radius: f64,

    pub base_score: u32,

    /// Flat bonus for reaching this ring
    pub zone_bonus: u32,
}

/// The scoring target: a center position and disjoint concentric rings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetLayout {
    /// Downrange position of the target center, m
    pub center_x: f64,

    rings: Vec<TargetRing>,
}

/// Score components for one landing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Base score of the containing ring
    pub base: u32,

    /// Flat ring bonus
    pub zone_bonus: u32,

    /// Linear falloff bonus inside the innermost ring
    pub distance_bonus: u32,

    pub total: u32,
}

impl ScoreBreakdown {
    /// The zero breakdown for a miss
    pub const MISS: ScoreBreakdown = ScoreBreakdown {
        base: 0,
        zone_bonus: 0,
        distance_bonus: 0,
        total: 0,
    };
}

impl TargetLayout {
    /// Build a layout from rings ordered innermost first.
    ///
    /// # Errors
    ///
    /// `InvalidTargetLayout` unless the radii are positive and
    /// strictly increasing (which makes the zones disjoint by
    /// construction).
    pub fn new(center_x: f64, rings: Vec<TargetRing>) -> Result<Self, SimError> {
        if rings.is_empty() || !center_x.is_finite() {
            return Err(SimError::InvalidTargetLayout);
        }
        let increasing = rings.windows(2).all(|w| w[0].radius < w[1].radius);
        if !increasing || rings[0].radius <= 0.0 || rings.iter().any(|r| !r.radius.is_finite()) {
            return Err(SimError::InvalidTargetLayout);
        }
        Ok(Self { center_x, rings })
    }

    /// The standard training target: bullseye at 100 m with three
    /// rings
    pub fn standard() -> Self {
        Self {
            center_x: 100.0,
            rings: vec![
                TargetRing {
                    radius: 5.0,
                    base_score: 100,
                    zone_bonus: 50,
                },
                TargetRing {
                    radius: 10.0,
                    base_score: 50,
                    zone_bonus: 20,
                },
                TargetRing {
                    radius: 20.0,
                    base_score: 25,
                    zone_bonus: 0,
                },
            ],
        }
    }

    pub fn rings(&self) -> &[TargetRing] {
        &self.rings
    }

    /// Score a landing position.
    ///
    /// Returns the containing ring index (innermost first) and the
    /// breakdown; `(None, MISS)` outside all rings.
    pub fn score(&self, landing_x: f64) -> (Option<usize>, ScoreBreakdown) {
        let distance = (landing_x - self.center_x).abs();

        let Some((zone, ring)) = self
            .rings
            .iter()
            .enumerate()
            .find(|(_, r)| distance <= r.radius)
        else {
            return (None, ScoreBreakdown::MISS);
        };

        // Linear falloff bonus applies only inside the innermost ring
        let distance_bonus = if zone == 0 {
            (DISTANCE_BONUS_MAX * (1.0 - distance / ring.radius)).round() as u32
        } else {
            0
        };

        let breakdown = ScoreBreakdown {
            base: ring.base_score,
            zone_bonus: ring.zone_bonus,
            distance_bonus,
            total: ring.base_score + ring.zone_bonus + distance_bonus,
        };
        (Some(zone), breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullseye_scores_maximum() {
        let target = TargetLayout::standard();
        let (zone, score) = target.score(100.0);
        assert_eq!(zone, Some(0));
        assert_eq!(score.base, 100);
        assert_eq!(score.zone_bonus, 50);
        assert_eq!(score.distance_bonus, 25);
        assert_eq!(score.total, 175);
    }

    #[test]
    fn test_distance_bonus_falls_off_linearly() {
        let target = TargetLayout::standard();
        // Half way out of the bullseye: half the bonus
        let (_, mid) = target.score(102.5);
        assert_eq!(mid.distance_bonus, 13); // 25 * 0.5 rounded
        // Edge of the bullseye: no bonus
        let (_, edge) = target.score(105.0);
        assert_eq!(edge.distance_bonus, 0);
    }

    #[test]
    fn test_outer_rings_by_containment() {
        let target = TargetLayout::standard();
        let (zone, score) = target.score(92.0); // 8 m out
        assert_eq!(zone, Some(1));
        assert_eq!(score.total, 70);

        let (zone, score) = target.score(115.0); // 15 m out
        assert_eq!(zone, Some(2));
        assert_eq!(score.total, 25);
    }

    #[test]
    fn test_short_and_long_sides_are_symmetric() {
        let target = TargetLayout::standard();
        let (zone_short, score_short) = target.score(93.0);
        let (zone_long, score_long) = target.score(107.0);
        assert_eq!(zone_short, zone_long);
        assert_eq!(score_short, score_long);
    }

    #[test]
    fn test_miss_is_zero_not_error() {
        let target = TargetLayout::standard();
        let (zone, score) = target.score(150.0);
        assert_eq!(zone, None);
        assert_eq!(score, ScoreBreakdown::MISS);

        let (zone, _) = target.score(-10.0);
        assert_eq!(zone, None);
    }

    #[test]
    fn test_ring_boundary_is_inclusive() {
        let target = TargetLayout::standard();
        let (zone, _) = target.score(120.0); // exactly 20 m out
        assert_eq!(zone, Some(2));
        let (zone, _) = target.score(120.001);
        assert_eq!(zone, None);
    }

    #[test]
    fn test_layout_validation() {
        // Radii must strictly increase
        let rings = vec![
            TargetRing {
                radius: 10.0,
                base_score: 50,
                zone_bonus: 0,
            },
            TargetRing {
                radius: 5.0,
                base_score: 100,
                zone_bonus: 0,
            },
        ];
        assert!(matches!(
            TargetLayout::new(100.0, rings),
            Err(SimError::InvalidTargetLayout)
        ));
        assert!(TargetLayout::new(100.0, vec![]).is_err());
    }
}
