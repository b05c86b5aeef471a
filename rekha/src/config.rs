//! Rekha configuration file
//!
//! Every section and field has a serde default, so an empty file is a valid
//! configuration and a partial file only overrides what it names.
//!
//! ```toml
//! [mapping]
//! step_length_m = 0.72
//! update_interval_ms = 20
//!
//! [step_detector]
//! window_size = 7
//! threshold = 1.5
//! debounce_ms = 300
//!
//! [loop_closure]
//! min_points = 10
//! closure_distance_m = 0.5
//!
//! [simplify]
//! tolerance_m = 0.1
//!
//! [calibration]
//! duration_ms = 3000
//! sample_interval_ms = 100
//! min_samples = 5
//!
//! [sensors]
//! startup_timeout_ms = 2000
//!
//! [sensors.retry]
//! max_attempts = 3
//!
//! [device]
//! type = "mock"
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::mapping::simplify::DEFAULT_TOLERANCE;
use pada_io::{DeviceConfig, SourceConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Position integration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Distance covered by one step (m)
    #[serde(default = "default_step_length")]
    pub step_length_m: f64,

    /// Sensor update interval requested while mapping (ms)
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
}

fn default_step_length() -> f64 {
    0.75
}
fn default_update_interval() -> u64 {
    20
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            step_length_m: default_step_length(),
            update_interval_ms: default_update_interval(),
        }
    }
}

/// Step detector tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepDetectorConfig {
    /// Sliding window length (samples)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Deviation from the window mean that counts as a step (m/s²)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Minimum time between accepted steps (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_window_size() -> usize {
    7
}
fn default_threshold() -> f64 {
    1.5
}
fn default_debounce_ms() -> u64 {
    300
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_threshold(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Loop closure thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoopClosureConfig {
    /// Points required before closure is considered
    #[serde(default = "default_min_points")]
    pub min_points: usize,

    /// Start/end distance that counts as closed (m)
    #[serde(default = "default_closure_distance")]
    pub closure_distance_m: f64,
}

fn default_min_points() -> usize {
    10
}
fn default_closure_distance() -> f64 {
    0.5
}

impl Default for LoopClosureConfig {
    fn default() -> Self {
        Self {
            min_points: default_min_points(),
            closure_distance_m: default_closure_distance(),
        }
    }
}

/// Outline simplification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimplifyConfig {
    /// Douglas-Peucker tolerance (m)
    #[serde(default = "default_tolerance")]
    pub tolerance_m: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            tolerance_m: default_tolerance(),
        }
    }
}

/// Compass calibration window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalibrationConfig {
    /// Length of the collection window (ms of sample time)
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Spacing between collected headings (ms of sample time)
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Fewest headings that make a valid calibration
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Sensor update interval requested while calibrating (ms)
    #[serde(default = "default_calibration_update_interval")]
    pub update_interval_ms: u64,
}

fn default_duration_ms() -> u64 {
    3000
}
fn default_sample_interval_ms() -> u64 {
    100
}
fn default_min_samples() -> usize {
    5
}
fn default_calibration_update_interval() -> u64 {
    50
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            sample_interval_ms: default_sample_interval_ms(),
            min_samples: default_min_samples(),
            update_interval_ms: default_calibration_update_interval(),
        }
    }
}

/// Logging defaults for the binary
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RekhaConfig {
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub step_detector: StepDetectorConfig,
    #[serde(default)]
    pub loop_closure: LoopClosureConfig,
    #[serde(default)]
    pub simplify: SimplifyConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub sensors: SourceConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RekhaConfig {
    /// Load and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RekhaConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as TOML
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the algorithms cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.mapping.step_length_m.is_finite() && self.mapping.step_length_m > 0.0) {
            return Err(Error::Config(format!(
                "mapping.step_length_m must be positive, got {}",
                self.mapping.step_length_m
            )));
        }
        if self.mapping.update_interval_ms == 0 || self.calibration.update_interval_ms == 0 {
            return Err(Error::Config(
                "sensor update intervals must be positive".to_string(),
            ));
        }
        if self.step_detector.window_size == 0 {
            return Err(Error::Config(
                "step_detector.window_size must be at least 1".to_string(),
            ));
        }
        if !(self.step_detector.threshold.is_finite() && self.step_detector.threshold >= 0.0) {
            return Err(Error::Config(format!(
                "step_detector.threshold must be non-negative, got {}",
                self.step_detector.threshold
            )));
        }
        if self.loop_closure.min_points == 0 {
            return Err(Error::Config(
                "loop_closure.min_points must be at least 1".to_string(),
            ));
        }
        if !(self.loop_closure.closure_distance_m.is_finite()
            && self.loop_closure.closure_distance_m > 0.0)
        {
            return Err(Error::Config(format!(
                "loop_closure.closure_distance_m must be positive, got {}",
                self.loop_closure.closure_distance_m
            )));
        }
        if !(self.simplify.tolerance_m.is_finite() && self.simplify.tolerance_m >= 0.0) {
            return Err(Error::Config(format!(
                "simplify.tolerance_m must be non-negative, got {}",
                self.simplify.tolerance_m
            )));
        }
        if self.calibration.sample_interval_ms == 0 {
            return Err(Error::Config(
                "calibration.sample_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
