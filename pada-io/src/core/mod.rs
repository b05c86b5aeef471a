//! Core abstractions for sensor drivers.
//!
//! - [`driver::SensorDriver`]: Trait to implement for new hardware
//! - [`types`]: Sensor samples, availability, and the stream channel

pub mod driver;
pub mod types;
