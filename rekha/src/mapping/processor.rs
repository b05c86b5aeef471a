//! Position integration from steps and headings.
//!
//! Every accepted step moves the track one step length along the current
//! compass heading:
//!
//! ```text
//! Δ = L · (sin θ, cos θ)      θ = heading, 0° = +y (North), 90° = +x (East)
//! ```
//!
//! The processor owns the whole [`TrackState`]. It is driven from a single
//! thread; readers get copies.

use crate::config::{LoopClosureConfig, SimplifyConfig};
use crate::core::math::heading_vector;
use crate::core::types::{CalibrationOffset, HeadingEstimate, Point, StepEvent, StepUpdate};
use crate::error::{Error, Result};
use crate::mapping::simplify::simplify;

/// Points a track needs before it can auto-complete on loop closure
const AUTO_CLOSE_MIN_POINTS: usize = 10;

/// Mutable state of one mapping session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    /// Never empty; starts at the origin
    pub points: Vec<Point>,
    pub heading: HeadingEstimate,
    pub calibration_offset: CalibrationOffset,
    pub step_count: u32,
    /// Non-decreasing within a session (m)
    pub total_distance: f64,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            points: vec![Point::origin()],
            heading: HeadingEstimate::default(),
            calibration_offset: CalibrationOffset::default(),
            step_count: 0,
            total_distance: 0.0,
        }
    }
}

/// Dead-reckoning position integrator
#[derive(Debug, Clone)]
pub struct MappingProcessor {
    step_length_m: f64,
    loop_closure: LoopClosureConfig,
    tolerance_m: f64,
    state: TrackState,
}

impl MappingProcessor {
    /// Processor with default loop closure and simplification settings
    pub fn new(step_length_m: f64) -> Self {
        Self {
            step_length_m,
            loop_closure: LoopClosureConfig::default(),
            tolerance_m: SimplifyConfig::default().tolerance_m,
            state: TrackState::default(),
        }
    }

    pub fn with_loop_closure(mut self, config: LoopClosureConfig) -> Self {
        self.loop_closure = config;
        self
    }

    pub fn with_simplify(mut self, config: SimplifyConfig) -> Self {
        self.tolerance_m = config.tolerance_m;
        self
    }

    /// Start a new track at the origin.
    ///
    /// Clears heading, counters and the calibration offset.
    pub fn reset(&mut self) {
        self.state = TrackState::default();
    }

    pub fn set_calibration_offset(&mut self, offset: CalibrationOffset) {
        self.state.calibration_offset = offset;
    }

    pub fn calibration_offset(&self) -> CalibrationOffset {
        self.state.calibration_offset
    }

    /// Record the latest heading
    pub fn update_heading(&mut self, heading: HeadingEstimate) {
        self.state.heading = heading;
    }

    /// Advance the track by one step along `heading`
    pub fn on_step_event(&mut self, step: StepEvent, heading: HeadingEstimate) {
        let (sin, cos) = heading_vector(heading.degrees());
        let dx = self.step_length_m * sin;
        let dy = self.step_length_m * cos;
        let last = self.last_point();
        let next = last.offset(dx, dy);

        self.state.points.push(next);
        self.state.step_count += 1;
        self.state.total_distance += next.distance(&last);
        self.state.heading = heading;

        log::debug!(
            "Step {} at {}us: heading {}, position ({:.2}, {:.2})",
            self.state.step_count,
            step.timestamp_us,
            heading,
            next.x,
            next.y
        );
    }

    /// Whether the walk has come back to its start.
    ///
    /// False until the track has `min_points` points; then true when the
    /// last point is within `closure_distance_m` of the first.
    pub fn check_loop_closure(&self) -> bool {
        let points = &self.state.points;
        if points.len() < self.loop_closure.min_points {
            return false;
        }
        let first = points[0];
        first.distance(&self.last_point()) < self.loop_closure.closure_distance_m
    }

    /// Loop closed on a track long enough to end the session by itself
    pub fn is_loop_complete(&self) -> bool {
        self.check_loop_closure() && self.state.points.len() > AUTO_CLOSE_MIN_POINTS
    }

    /// Close the outline and simplify it.
    ///
    /// Tracks with fewer than three points come back unchanged. Otherwise the
    /// first point is appended and the result is Douglas-Peucker simplified.
    pub fn close_loop(&self) -> Vec<Point> {
        let points = &self.state.points;
        if points.len() < 3 {
            return points.clone();
        }
        let mut closed = Vec::with_capacity(points.len() + 1);
        closed.extend_from_slice(points);
        closed.push(points[0]);
        simplify(&closed, self.tolerance_m)
    }

    pub fn points(&self) -> Vec<Point> {
        self.state.points.clone()
    }

    pub fn current_heading(&self) -> HeadingEstimate {
        self.state.heading
    }

    pub fn total_distance(&self) -> f64 {
        self.state.total_distance
    }

    pub fn step_count(&self) -> u32 {
        self.state.step_count
    }

    /// Copy of the whole track state
    pub fn state(&self) -> TrackState {
        self.state.clone()
    }

    /// Track snapshot for publishing
    pub fn snapshot(&self) -> StepUpdate {
        StepUpdate {
            points: self.state.points.clone(),
            heading_deg: self.state.heading.degrees(),
            steps: self.state.step_count,
            distance_m: self.state.total_distance,
        }
    }

    pub fn step_length(&self) -> f64 {
        self.step_length_m
    }

    /// Derive step length from a walk of known length and apply it.
    ///
    /// Returns the per-step length, for storing in settings.
    pub fn calibrate_step_length(&mut self, known_distance_m: f64, steps: u32) -> Result<f64> {
        if steps == 0 {
            return Err(Error::Config(
                "step length calibration needs at least one step".to_string(),
            ));
        }
        if !(known_distance_m.is_finite() && known_distance_m > 0.0) {
            return Err(Error::Config(format!(
                "calibration distance must be positive, got {}",
                known_distance_m
            )));
        }
        self.step_length_m = known_distance_m / steps as f64;
        log::info!(
            "Step length calibrated: {:.3} m ({} steps over {:.2} m)",
            self.step_length_m,
            steps,
            known_distance_m
        );
        Ok(self.step_length_m)
    }

    fn last_point(&self) -> Point {
        self.state
            .points
            .last()
            .copied()
            .unwrap_or_else(Point::origin)
    }
}
