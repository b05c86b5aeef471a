//! Compass calibration.
//!
//! Collects raw (uncalibrated) headings while the user stands still facing
//! magnetic North, then derives the offset that maps the averaged reading to
//! 0°.
//!
//! # Usage
//!
//! ```
//! use rekha::config::CalibrationConfig;
//! use rekha::sensors::calibration::CalibrationSession;
//!
//! let mut session = CalibrationSession::new(CalibrationConfig::default());
//!
//! // One raw heading per 100 ms of sample time, for 3 s
//! for i in 0..30u64 {
//!     session.offer(i * 100_000, 92.0);
//! }
//!
//! let offset = session.finish().unwrap();
//! assert_eq!(offset.degrees(), 268.0);
//! ```
//!
//! # Computation
//!
//! 1. Require at least `min_samples` headings
//! 2. Sort ascending; with more than two, drop the lowest and highest
//! 3. Arithmetic mean of the rest
//! 4. `offset = (360 − mean) mod 360`
//!
//! The mean is linear, not circular. Readings that straddle North
//! (e.g. 359° and 1°) average to 180°; calibrate facing North only where
//! the raw heading does not wrap.

use crate::config::CalibrationConfig;
use crate::core::types::CalibrationOffset;
use crate::error::{Error, Result};

/// Heading accumulator for one calibration run
#[derive(Debug)]
pub struct CalibrationSession {
    config: CalibrationConfig,
    samples: Vec<f64>,
    started_us: Option<u64>,
    last_accepted_us: Option<u64>,
    cancelled: bool,
}

impl CalibrationSession {
    pub fn new(config: CalibrationConfig) -> Self {
        let expected = (config.duration_ms / config.sample_interval_ms.max(1)) as usize + 1;
        Self {
            config,
            samples: Vec::with_capacity(expected),
            started_us: None,
            last_accepted_us: None,
            cancelled: false,
        }
    }

    /// Offer a raw heading observed at `timestamp_us`.
    ///
    /// Accepted when it is the first one or at least `sample_interval_ms`
    /// after the last accepted heading, and it is finite. Returns whether it
    /// was kept.
    pub fn offer(&mut self, timestamp_us: u64, raw_heading_deg: f64) -> bool {
        if self.cancelled || !raw_heading_deg.is_finite() {
            return false;
        }
        let interval_us = self.config.sample_interval_ms.saturating_mul(1000);
        if let Some(last) = self.last_accepted_us
            && timestamp_us.saturating_sub(last) < interval_us
        {
            return false;
        }

        self.started_us.get_or_insert(timestamp_us);
        self.last_accepted_us = Some(timestamp_us);
        self.samples.push(raw_heading_deg);
        true
    }

    /// Add a heading without time gating. Non-finite values are ignored.
    pub fn add_sample(&mut self, raw_heading_deg: f64) {
        if !self.cancelled && raw_heading_deg.is_finite() {
            self.samples.push(raw_heading_deg);
        }
    }

    /// Whether `duration_ms` of sample time has passed since the first
    /// accepted heading
    pub fn is_window_elapsed(&self, timestamp_us: u64) -> bool {
        self.started_us.is_some_and(|start| {
            timestamp_us.saturating_sub(start) >= self.config.duration_ms.saturating_mul(1000)
        })
    }

    /// Headings collected so far
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Abandon this run; `finish` will report `CalibrationCancelled`
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Trimmed mean of the collected headings
    pub fn average(&self) -> Result<f64> {
        let required = self.config.min_samples;
        if self.samples.len() < required {
            return Err(Error::InsufficientSamples {
                collected: self.samples.len(),
                required,
            });
        }

        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        let kept = if sorted.len() > 2 {
            &sorted[1..sorted.len() - 1]
        } else {
            &sorted[..]
        };
        if kept.is_empty() {
            return Err(Error::InsufficientSamples {
                collected: self.samples.len(),
                required: required.max(1),
            });
        }

        let mean = kept.iter().sum::<f64>() / kept.len() as f64;
        if !mean.is_finite() {
            return Err(Error::InsufficientSamples {
                collected: self.samples.len(),
                required,
            });
        }
        Ok(mean)
    }

    /// Compute the offset, or explain why there is none
    pub fn finish(&self) -> Result<CalibrationOffset> {
        if self.cancelled {
            return Err(Error::CalibrationCancelled);
        }
        let avg = self.average()?;
        let offset = CalibrationOffset::new(360.0 - avg);
        log::info!(
            "Calibration: {} headings, mean {:.1}°, offset {}",
            self.samples.len(),
            avg,
            offset
        );
        Ok(offset)
    }

    /// Start over with an empty window
    pub fn reset(&mut self) {
        self.samples.clear();
        self.started_us = None;
        self.last_accepted_us = None;
        self.cancelled = false;
    }
}
