//! PadaIO - Motion sensor abstraction for walk-based room tracing
//!
//! This library turns a phone-like device's accelerometer, magnetometer and
//! gyroscope into a single timestamped sample stream with availability
//! probing, bounded start-up retries and numeric validation.
//!
//! ## Features
//!
//! - `mock`: Enable the simulated walker device for hardware-free testing

pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod retry;
pub mod source;

// Re-export commonly used types
pub use config::{DeviceConfig, RetryConfig, SourceConfig};
pub use core::driver::SensorDriver;
pub use core::types::{SensorAvailability, SensorKind, SensorSample};
pub use devices::create_device;
pub use devices::scripted::ScriptedDriver;
pub use error::{Error, Result};
pub use source::{SampleStream, SensorSource};

#[cfg(feature = "mock")]
pub use devices::mock::SimulatedWalkDriver;
#[cfg(feature = "mock")]
pub use devices::mock::config::{SimulationConfig, WalkLeg};
