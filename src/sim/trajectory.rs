//! Trajectory simulation
//!
//! Discrete-time integration of projectile motion from launch
//! parameters. The velocity is stepped from the instantaneous
//! acceleration and the position from the average of the old and new
//! velocities, which makes the zero-drag flight exact under constant
//! gravity; the analytic range formula v^2 sin(2 theta) / g then
//! serves as a test oracle. Integration stops when the vertical
//! position crosses the ground plane, and the landing point is
//! linearly interpolated between the straddling samples rather than
//! taken from the last sample.

use chrono::{DateTime, Utc};
use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::scoring::{ScoreBreakdown, TargetLayout};
use super::SimError;

/// Gravitational acceleration, m/s^2
pub const GRAVITY: f64 = 9.81;

/// Air density at sea level, kg/m^3
pub const AIR_DENSITY: f64 = 1.225;

/// Drag coefficient of the (spherical) projectile
pub const DRAG_COEFFICIENT: f64 = 0.47;

/// Duration over which the launch force acts, s. Launch speed is
/// force * IMPULSE_DURATION / mass.
pub const IMPULSE_DURATION: f64 = 0.25;

/// Horizontal acceleration imparted per m/s of wind, 1/s
pub const WIND_COUPLING: f64 = 0.08;

/// Integration step, s. Small enough that the no-drag landing agrees
/// with the closed-form range within 1e-3 relative (verified in the
/// test suite).
pub const TIME_STEP: f64 = 1e-3;

/// Trajectory points are recorded every this many integration steps
const PATH_DECIMATION: usize = 10;

/// Simulated-time cutoff for the divergence guard, s
const MAX_FLIGHT_TIME: f64 = 120.0;

const FORCE_RANGE: (f64, f64) = (10.0, 1000.0);
const ANGLE_RANGE: (f64, f64) = (5.0, 85.0);

/// Projectile weight class.
///
/// Closed set: mass and drag area are fixed per class, enforced at
/// construction rather than checked at use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl WeightClass {
    /// Projectile mass, kg
    pub fn mass(self) -> f64 {
        match self {
            WeightClass::Light => 0.5,
            WeightClass::Medium => 1.0,
            WeightClass::Heavy => 2.0,
        }
    }

    /// Drag reference area, m^2
    pub fn drag_area(self) -> f64 {
        match self {
            WeightClass::Light => 0.010,
            WeightClass::Medium => 0.014,
            WeightClass::Heavy => 0.018,
        }
    }
}

impl std::fmt::Display for WeightClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightClass::Light => write!(f, "light"),
            WeightClass::Medium => write!(f, "medium"),
            WeightClass::Heavy => write!(f, "heavy"),
        }
    }
}

/// Which way the wind blows relative to the launch direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindDirection {
    /// With the shot (+x)
    Tailwind,
    /// Against the shot (-x)
    Headwind,
}

impl WindDirection {
    fn sign(self) -> f64 {
        match self {
            WindDirection::Tailwind => 1.0,
            WindDirection::Headwind => -1.0,
        }
    }
}

/// Constant wind acting on the shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Wind speed, m/s
    pub speed: f64,
    pub direction: WindDirection,
}

impl Wind {
    pub fn new(speed: f64, direction: WindDirection) -> Result<Self, SimError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(SimError::InvalidWind { speed });
        }
        Ok(Self { speed, direction })
    }

    /// Constant horizontal acceleration contributed by the wind
    fn accel_x(&self) -> f64 {
        self.direction.sign() * self.speed * WIND_COUPLING
    }
}

/// Launch parameters for one shot. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Launch force, N
    pub force: f64,

    /// Launch angle above horizontal, degrees
    pub angle_deg: f64,

    pub weight: WeightClass,

    pub wind: Option<Wind>,

    /// Enable the quadratic drag term
    pub air_resistance: bool,
}

impl LaunchSettings {
    /// Validate and build launch settings.
    ///
    /// # Errors
    ///
    /// `InvalidForce` / `InvalidAngle` outside the supported ranges.
    pub fn new(force: f64, angle_deg: f64, weight: WeightClass) -> Result<Self, SimError> {
        if !force.is_finite() || !(FORCE_RANGE.0..=FORCE_RANGE.1).contains(&force) {
            return Err(SimError::InvalidForce {
                force,
                min: FORCE_RANGE.0,
                max: FORCE_RANGE.1,
            });
        }
        if !angle_deg.is_finite() || !(ANGLE_RANGE.0..=ANGLE_RANGE.1).contains(&angle_deg) {
            return Err(SimError::InvalidAngle {
                angle: angle_deg,
                min: ANGLE_RANGE.0,
                max: ANGLE_RANGE.1,
            });
        }
        Ok(Self {
            force,
            angle_deg,
            weight,
            wind: None,
            air_resistance: false,
        })
    }

    pub fn with_wind(mut self, wind: Wind) -> Self {
        self.wind = Some(wind);
        self
    }

    pub fn with_air_resistance(mut self, enabled: bool) -> Self {
        self.air_resistance = enabled;
        self
    }

    /// Launch speed derived from force and projectile mass, m/s
    pub fn launch_speed(&self) -> f64 {
        self.force * IMPULSE_DURATION / self.weight.mass()
    }
}

/// One sample along a simulated flight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Time since launch, s
    pub time: f64,

    /// (downrange, height) position, m
    pub position: Vector2<f64>,

    /// Velocity components, m/s
    pub velocity: Vector2<f64>,
}

/// A completed flight: the sampled path and the landing summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Ordered path samples from launch to (interpolated) landing
    pub points: Vec<TrajectoryPoint>,

    /// Interpolated downrange landing position, m
    pub landing_x: f64,

    /// Interpolated time of flight, s
    pub flight_time: f64,

    /// Greatest height reached, m
    pub peak_height: f64,
}

/// Instantaneous acceleration for the current velocity
fn acceleration(settings: &LaunchSettings, velocity: Vector2<f64>) -> Vector2<f64> {
    let mut acc = Vector2::new(0.0, -GRAVITY);

    if settings.air_resistance {
        let speed = velocity.norm();
        // Quadratic drag opposing the velocity, scaled by mass
        let factor = 0.5 * AIR_DENSITY * DRAG_COEFFICIENT * settings.weight.drag_area() * speed
            / settings.weight.mass();
        acc -= velocity * factor;
    }

    if let Some(wind) = settings.wind {
        acc.x += wind.accel_x();
    }

    acc
}

/// Integrate a flight from launch to landing.
///
/// # Errors
///
/// `Diverged` if the projectile has not returned to the ground plane
/// within the simulated-time cutoff (cannot happen for valid settings;
/// the guard bounds the loop regardless).
pub fn simulate(settings: &LaunchSettings) -> Result<Trajectory, SimError> {
    let speed = settings.launch_speed();
    let angle = settings.angle_deg.to_radians();

    let mut time = 0.0;
    let mut position = Vector2::new(0.0, 0.0);
    let mut velocity = Vector2::new(speed * angle.cos(), speed * angle.sin());

    let mut points = vec![TrajectoryPoint {
        time,
        position,
        velocity,
    }];
    let mut peak_height = 0.0_f64;
    let mut step = 0_usize;

    loop {
        let acc = acceleration(settings, velocity);
        let new_velocity = velocity + acc * TIME_STEP;
        let new_position = position + (velocity + new_velocity) * (0.5 * TIME_STEP);
        time += TIME_STEP;
        step += 1;

        if new_position.y <= 0.0 && position.y > 0.0 {
            // Interpolate the ground crossing between the straddling
            // samples instead of taking the last one
            let frac = position.y / (position.y - new_position.y);
            let landing_x = position.x + frac * (new_position.x - position.x);
            let flight_time = time - TIME_STEP + frac * TIME_STEP;
            points.push(TrajectoryPoint {
                time: flight_time,
                position: Vector2::new(landing_x, 0.0),
                velocity: new_velocity,
            });
            return Ok(Trajectory {
                points,
                landing_x,
                flight_time,
                peak_height,
            });
        }

        position = new_position;
        velocity = new_velocity;
        peak_height = peak_height.max(position.y);

        if step % PATH_DECIMATION == 0 {
            points.push(TrajectoryPoint {
                time,
                position,
                velocity,
            });
        }

        if time > MAX_FLIGHT_TIME {
            return Err(SimError::Diverged {
                max_time: MAX_FLIGHT_TIME,
            });
        }
    }
}

/// Shot-to-shot process variation applied when firing.
///
/// Gaussian jitter on the force and angle actually delivered, so a
/// repeated series forms a realistic measurement sample. Use
/// [`ProcessNoise::NONE`] for deterministic shots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessNoise {
    /// Standard deviation of the delivered force, N
    pub force_sd: f64,

    /// Standard deviation of the delivered angle, degrees
    pub angle_sd: f64,
}

impl ProcessNoise {
    pub const NONE: ProcessNoise = ProcessNoise {
        force_sd: 0.0,
        angle_sd: 0.0,
    };

    pub fn new(force_sd: f64, angle_sd: f64) -> Result<Self, SimError> {
        if !force_sd.is_finite() || force_sd < 0.0 || !angle_sd.is_finite() || angle_sd < 0.0 {
            return Err(SimError::InvalidNoise);
        }
        Ok(Self { force_sd, angle_sd })
    }
}

/// Box-Muller normal sample
fn gaussian<R: Rng>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 {
        return mean;
    }
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    let z = (-2.0_f64 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + sd * z
}

/// Shot identifier, SHOT-<ulid>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotId(String);

impl ShotId {
    pub fn new() -> Self {
        Self(format!("SHOT-{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fired and scored shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    pub fired_at: DateTime<Utc>,

    /// Force actually delivered after process noise, N
    pub force_applied: f64,

    /// Angle actually delivered after process noise, degrees
    pub angle_applied: f64,

    /// Downrange landing position, m
    pub landing_x: f64,

    /// Index of the ring the shot landed in, innermost first; `None`
    /// for a miss
    pub zone: Option<usize>,

    pub score: ScoreBreakdown,
}

/// Fire one shot: perturb the settings with process noise, simulate
/// the flight, and score the landing.
pub fn fire<R: Rng>(
    settings: &LaunchSettings,
    noise: &ProcessNoise,
    target: &TargetLayout,
    rng: &mut R,
) -> Result<Shot, SimError> {
    let force = gaussian(rng, settings.force, noise.force_sd).clamp(FORCE_RANGE.0, FORCE_RANGE.1);
    let angle =
        gaussian(rng, settings.angle_deg, noise.angle_sd).clamp(ANGLE_RANGE.0, ANGLE_RANGE.1);

    let perturbed = LaunchSettings {
        force,
        angle_deg: angle,
        ..*settings
    };
    let trajectory = simulate(&perturbed)?;
    let (zone, score) = target.score(trajectory.landing_x);

    Ok(Shot {
        id: ShotId::new(),
        fired_at: Utc::now(),
        force_applied: force,
        angle_applied: angle,
        landing_x: trajectory.landing_x,
        zone,
        score,
    })
}
