//! Kinematic walker model
//!
//! Converts a route of legs into sensor readings as a function of simulation
//! time. The phone is held flat, screen up, top edge pointing along the walk
//! direction.
//!
//! ## Timeline
//!
//! ```text
//! |---- idle ----|-- step 0 --|-- step 1 --| ... |-- step N-1 --|---- standing ----
//!                      ^            ^                   ^
//!                 heel strike  heel strike         heel strike
//! ```
//!
//! Each step slot lasts `1 / cadence_hz`; the heel strike sits in the middle
//! of its slot. The heading of a slot is the heading of the leg that step
//! belongs to, so turns happen between strikes.
//!
//! ## Sensor Outputs
//!
//! - **Accelerometer**: `(0, 0, g + pulse(t))` plus noise. The pulse is a
//!   triangle of height `pulse_amplitude` and half width `pulse_width_ms`.
//! - **Magnetometer**: horizontal field `(B cos θ, B sin θ, 0)` plus noise, so
//!   `atan2(my, mx)` reads back the heading θ.
//! - **Gyroscope**: noise only (turns are instantaneous).

use super::config::{SimulationConfig, WalkLeg};
use super::noise::NoiseGenerator;
use crate::core::types::{SensorKind, SensorSample};

/// Walker state derived from the route
pub struct WalkerSimulator {
    config: SimulationConfig,
    noise: NoiseGenerator,
    /// Heading of every step, flattened from the legs
    step_headings: Vec<f64>,
    step_period_us: f64,
    idle_us: f64,
}

impl WalkerSimulator {
    pub fn new(config: &SimulationConfig, noise: NoiseGenerator) -> Self {
        let step_headings = config
            .legs
            .iter()
            .flat_map(|leg: &WalkLeg| std::iter::repeat_n(leg.heading_deg, leg.steps as usize))
            .collect();
        let cadence = config.gait.cadence_hz.max(0.1);

        Self {
            config: config.clone(),
            noise,
            step_headings,
            step_period_us: 1_000_000.0 / cadence,
            idle_us: config.idle_ms as f64 * 1000.0,
        }
    }

    /// Total number of heel strikes on the route
    pub fn total_steps(&self) -> usize {
        self.step_headings.len()
    }

    /// Simulation time of heel strike `step` (µs)
    pub fn strike_time_us(&self, step: usize) -> f64 {
        self.idle_us + (step as f64 + 0.5) * self.step_period_us
    }

    /// Whether every step of the route has been taken by time `t_us`
    pub fn is_finished(&self, t_us: u64) -> bool {
        let end = self.idle_us + self.total_steps() as f64 * self.step_period_us;
        t_us as f64 >= end
    }

    /// True heading at time `t_us` (degrees)
    ///
    /// Before the first step the walker faces the first leg; after the last
    /// step it keeps facing the last one.
    pub fn heading_at(&self, t_us: u64) -> f64 {
        let Some(last) = self.step_headings.len().checked_sub(1) else {
            return 0.0;
        };
        let t = t_us as f64 - self.idle_us;
        if t < 0.0 {
            return self.step_headings[0];
        }
        let slot = (t / self.step_period_us) as usize;
        self.step_headings[slot.min(last)]
    }

    /// Heel-strike acceleration above gravity at time `t_us` (m/s²)
    pub fn pulse_at(&self, t_us: u64) -> f64 {
        if self.step_headings.is_empty() {
            return 0.0;
        }
        let t = t_us as f64;
        let position = (t - self.idle_us) / self.step_period_us - 0.5;
        let nearest = position.round().clamp(0.0, (self.total_steps() - 1) as f64) as usize;

        let width_us = self.config.gait.pulse_width_ms * 1000.0;
        let dt = (t - self.strike_time_us(nearest)).abs();
        if width_us <= 0.0 || dt >= width_us {
            return 0.0;
        }
        self.config.gait.pulse_amplitude * (1.0 - dt / width_us)
    }

    /// Generate one reading of `kind` at time `t_us`
    pub fn sample(&mut self, kind: SensorKind, t_us: u64) -> SensorSample {
        let [x, y, z] = match kind {
            SensorKind::Accelerometer => self.accelerometer(t_us),
            SensorKind::Magnetometer => self.magnetometer(t_us),
            SensorKind::Gyroscope => self.gyroscope(),
        };
        SensorSample::new(kind, x, y, z, t_us)
    }

    fn accelerometer(&mut self, t_us: u64) -> [f64; 3] {
        let n = self.noise.gaussian3(self.config.noise.accel_stddev);
        let vertical = self.config.gait.gravity + self.pulse_at(t_us);
        [n[0], n[1], vertical + n[2]]
    }

    fn magnetometer(&mut self, t_us: u64) -> [f64; 3] {
        if self.noise.chance(self.config.noise.mag_dropout_rate) {
            return [f64::NAN; 3];
        }
        let theta = self.heading_at(t_us).to_radians();
        let b = self.config.gait.field_strength_ut;
        let n = self.noise.gaussian3(self.config.noise.mag_stddev);
        [b * theta.cos() + n[0], b * theta.sin() + n[1], n[2]]
    }

    fn gyroscope(&mut self) -> [f64; 3] {
        self.noise.gaussian3(self.config.noise.gyro_stddev)
    }
}
