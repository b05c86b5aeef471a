//! Footstep detection from accelerometer magnitude.
//!
//! Each sample's magnitude `|a|` is compared with the mean of a short sliding
//! window (which includes the sample itself). A deviation above `threshold`
//! is a step, unless the previous step was less than `debounce_ms` ago.
//!
//! ```text
//! |a| ─▶ [ window of N ] ─▶ mean
//!  │                          │
//!  └──── |a| − mean > thr ────┴──▶ debounce ──▶ StepEvent
//! ```
//!
//! No steps are reported until the window has filled, and a device lying
//! still never steps: its magnitude never leaves the window mean.

use std::collections::VecDeque;

use crate::config::StepDetectorConfig;
use crate::core::types::StepEvent;
use pada_io::SensorSample;

/// Sliding-window step detector
#[derive(Debug)]
pub struct StepDetector {
    config: StepDetectorConfig,
    window: VecDeque<f64>,
    sum: f64,
    last_step_us: Option<u64>,
    total_steps: u64,
}

impl StepDetector {
    pub fn new(config: StepDetectorConfig) -> Self {
        let capacity = config.window_size.max(1);
        Self {
            config,
            window: VecDeque::with_capacity(capacity),
            sum: 0.0,
            last_step_us: None,
            total_steps: 0,
        }
    }

    /// Feed one accelerometer sample.
    ///
    /// Returns a [`StepEvent`] stamped with the sample's timestamp when a step
    /// is accepted.
    pub fn on_sample(&mut self, sample: &SensorSample) -> Option<StepEvent> {
        let magnitude = sample.magnitude();
        if !magnitude.is_finite() {
            return None;
        }

        let capacity = self.config.window_size.max(1);
        if self.window.len() == capacity
            && let Some(oldest) = self.window.pop_front()
        {
            self.sum -= oldest;
        }
        self.window.push_back(magnitude);
        self.sum += magnitude;

        if self.window.len() < capacity {
            return None;
        }

        let avg = self.sum / capacity as f64;
        if (magnitude - avg).abs() <= self.config.threshold {
            return None;
        }

        let debounce_us = self.config.debounce_ms.saturating_mul(1000);
        let debounced = self
            .last_step_us
            .is_some_and(|last| sample.timestamp_us.saturating_sub(last) < debounce_us);
        if debounced {
            return None;
        }

        self.last_step_us = Some(sample.timestamp_us);
        self.total_steps += 1;
        log::debug!(
            "Step {} at {}us (|a|={:.2}, mean={:.2})",
            self.total_steps,
            sample.timestamp_us,
            magnitude,
            avg
        );
        Some(StepEvent {
            timestamp_us: sample.timestamp_us,
        })
    }

    /// Whether the window has filled and detection is active
    pub fn is_warm(&self) -> bool {
        self.window.len() >= self.config.window_size.max(1)
    }

    /// Steps accepted since creation or the last reset
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Clear the window and the last step time
    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
        self.last_step_us = None;
        self.total_steps = 0;
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(StepDetectorConfig::default())
    }
}
