//! Sensor processing layer.
//!
//! Turns raw samples from `pada-io` into steps and headings.
//!
//! # Contents
//!
//! - [`step_detector`]: Footsteps from accelerometer magnitude
//! - [`heading`]: Compass heading from the magnetometer
//! - [`calibration`]: Compass offset from a standing North-facing window

pub mod calibration;
pub mod heading;
pub mod step_detector;

pub use calibration::CalibrationSession;
pub use heading::HeadingEstimator;
pub use step_detector::StepDetector;
