//! Simulated walker configuration
//!
//! Every parameter has a default, so an empty `[device.simulation]` section
//! produces a 7.5 m square room walked at 2 steps per second.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── speed_factor, random_seed     # Simulation control
//! ├── idle_ms                       # Standing still before the first step
//! ├── GaitConfig                    # Cadence and heel-strike pulse
//! ├── legs: [WalkLeg]               # Route as (steps, heading) pairs
//! ├── NoiseConfig                   # Per-sensor Gaussian noise, dropouts
//! ├── AvailabilityConfig            # Which sensors the phone reports
//! └── fail_first_opens              # Exercise the retry path
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::SensorAvailability;

/// One straight stretch of the walk
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WalkLeg {
    /// Number of steps on this stretch
    pub steps: u32,
    /// Compass heading while walking it (degrees, 0 = magnetic North)
    pub heading_deg: f64,
}

impl WalkLeg {
    pub fn new(steps: u32, heading_deg: f64) -> Self {
        Self { steps, heading_deg }
    }
}

/// Walking gait parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GaitConfig {
    /// Steps per second
    #[serde(default = "default_cadence_hz")]
    pub cadence_hz: f64,

    /// Peak heel-strike acceleration above gravity (m/s²)
    #[serde(default = "default_pulse_amplitude")]
    pub pulse_amplitude: f64,

    /// Heel-strike pulse half width (ms)
    #[serde(default = "default_pulse_width_ms")]
    pub pulse_width_ms: f64,

    /// Gravity magnitude (m/s²)
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Horizontal geomagnetic field strength (μT)
    #[serde(default = "default_field_strength")]
    pub field_strength_ut: f64,
}

fn default_cadence_hz() -> f64 {
    2.0
}
fn default_pulse_amplitude() -> f64 {
    4.0
}
fn default_pulse_width_ms() -> f64 {
    40.0
}
fn default_gravity() -> f64 {
    9.81
}
fn default_field_strength() -> f64 {
    30.0
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            cadence_hz: default_cadence_hz(),
            pulse_amplitude: default_pulse_amplitude(),
            pulse_width_ms: default_pulse_width_ms(),
            gravity: default_gravity(),
            field_strength_ut: default_field_strength(),
        }
    }
}

/// Sensor noise model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NoiseConfig {
    /// Accelerometer stddev per axis (m/s²)
    #[serde(default = "default_accel_stddev")]
    pub accel_stddev: f64,

    /// Magnetometer stddev per axis (μT)
    #[serde(default = "default_mag_stddev")]
    pub mag_stddev: f64,

    /// Gyroscope stddev per axis (rad/s)
    #[serde(default = "default_gyro_stddev")]
    pub gyro_stddev: f64,

    /// Probability that a magnetometer reading comes back as NaN
    #[serde(default)]
    pub mag_dropout_rate: f64,
}

fn default_accel_stddev() -> f64 {
    0.05
}
fn default_mag_stddev() -> f64 {
    0.2
}
fn default_gyro_stddev() -> f64 {
    0.01
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            accel_stddev: default_accel_stddev(),
            mag_stddev: default_mag_stddev(),
            gyro_stddev: default_gyro_stddev(),
            mag_dropout_rate: 0.0,
        }
    }
}

/// Which sensors the simulated phone reports
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AvailabilityConfig {
    #[serde(default = "default_true")]
    pub accelerometer: bool,
    #[serde(default = "default_true")]
    pub magnetometer: bool,
    #[serde(default = "default_true")]
    pub gyroscope: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            accelerometer: true,
            magnetometer: true,
            gyroscope: true,
        }
    }
}

impl From<AvailabilityConfig> for SensorAvailability {
    fn from(config: AvailabilityConfig) -> Self {
        SensorAvailability::new(config.accelerometer, config.magnetometer, config.gyroscope)
    }
}

/// Root simulation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Time compression (2.0 = twice real time)
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Noise seed (0 = random each run)
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Standing still before the first step (ms)
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,

    #[serde(default)]
    pub gait: GaitConfig,

    /// Route, walked in order; after the last leg the walker stands still
    #[serde(default = "default_legs")]
    pub legs: Vec<WalkLeg>,

    #[serde(default)]
    pub noise: NoiseConfig,

    #[serde(default)]
    pub availability: AvailabilityConfig,

    /// Fail the first N open calls
    #[serde(default)]
    pub fail_first_opens: u32,
}

fn default_speed_factor() -> f64 {
    1.0
}
fn default_random_seed() -> u64 {
    42
}
fn default_idle_ms() -> u64 {
    1000
}
fn default_legs() -> Vec<WalkLeg> {
    vec![
        WalkLeg::new(10, 0.0),
        WalkLeg::new(10, 90.0),
        WalkLeg::new(10, 180.0),
        WalkLeg::new(10, 270.0),
    ]
}

impl SimulationConfig {
    /// Total steps over all legs
    pub fn total_steps(&self) -> u32 {
        self.legs.iter().map(|leg| leg.steps).sum()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed_factor: default_speed_factor(),
            random_seed: default_random_seed(),
            idle_ms: default_idle_ms(),
            gait: GaitConfig::default(),
            legs: default_legs(),
            noise: NoiseConfig::default(),
            availability: AvailabilityConfig::default(),
            fail_first_opens: 0,
        }
    }
}
