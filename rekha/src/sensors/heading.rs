//! Compass heading from magnetometer samples.
//!
//! The phone is assumed level. Heading is `atan2(my, mx)` in degrees,
//! normalized to [0, 360), plus the calibration offset. There is no
//! smoothing or tilt compensation; every sample stands alone.

use crate::core::math::normalize_degrees;
use crate::core::types::{CalibrationOffset, HeadingEstimate};
use pada_io::SensorSample;

/// Stateless heading estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingEstimator;

impl HeadingEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Heading before any calibration offset is applied
    #[inline]
    pub fn raw_heading(&self, sample: &SensorSample) -> HeadingEstimate {
        HeadingEstimate::new(sample.y.atan2(sample.x).to_degrees())
    }

    /// Calibrated heading: `(raw + offset) mod 360`
    #[inline]
    pub fn compute(&self, sample: &SensorSample, offset: CalibrationOffset) -> HeadingEstimate {
        let raw = self.raw_heading(sample).degrees();
        HeadingEstimate::new(normalize_degrees(raw + offset.degrees()))
    }
}
