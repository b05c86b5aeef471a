//! Core data types for room tracing.
//!
//! - [`Point`]: 2D point in meters, local frame
//! - [`Wall`]: Validated room outline (≥ 3 points)
//! - [`HeadingEstimate`], [`CalibrationOffset`]: Compass angles in [0, 360)
//! - [`StepEvent`]: A detected footstep
//! - [`StepUpdate`]: Track snapshot published after each step

mod point;
mod wall;

pub use point::Point;
pub use wall::{MIN_WALL_POINTS, Wall};

use crate::core::math::normalize_degrees;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compass heading in degrees, always in [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct HeadingEstimate(f64);

impl HeadingEstimate {
    #[inline]
    pub fn new(degrees: f64) -> Self {
        Self(normalize_degrees(degrees))
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl fmt::Display for HeadingEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

/// Additive heading correction in degrees, always in [0, 360)
///
/// Produced by a completed calibration; zero means uncalibrated.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct CalibrationOffset(f64);

impl CalibrationOffset {
    #[inline]
    pub fn new(degrees: f64) -> Self {
        Self(normalize_degrees(degrees))
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl fmt::Display for CalibrationOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

/// A detected footstep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Timestamp of the accelerometer sample that triggered it (µs)
    pub timestamp_us: u64,
}

/// Track snapshot published after every accepted step
#[derive(Debug, Clone, PartialEq)]
pub struct StepUpdate {
    /// Every point so far, starting at the origin
    pub points: Vec<Point>,
    /// Heading used for the latest step (degrees)
    pub heading_deg: f64,
    /// Steps taken
    pub steps: u32,
    /// Distance walked (m)
    pub distance_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_normalized_on_construction() {
        assert_eq!(HeadingEstimate::new(-10.0).degrees(), 350.0);
        assert_eq!(HeadingEstimate::new(360.0).degrees(), 0.0);
        assert_eq!(CalibrationOffset::new(450.0).degrees(), 90.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(HeadingEstimate::new(12.345).to_string(), "12.3°");
        assert_eq!(CalibrationOffset::default().to_string(), "0.0°");
    }
}
