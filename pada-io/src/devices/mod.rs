//! Device implementations

#[cfg(feature = "mock")]
pub mod mock;
pub mod scripted;

use crate::config::DeviceConfig;
use crate::core::driver::SensorDriver;
use crate::error::{Error, Result};

/// Create a sensor driver based on device configuration
pub fn create_device(config: &DeviceConfig) -> Result<Box<dyn SensorDriver>> {
    match config.device_type.as_str() {
        #[cfg(feature = "mock")]
        "mock" => {
            let simulation = config.simulation.clone().unwrap_or_default();
            let driver = mock::SimulatedWalkDriver::new(config.name.clone(), simulation);
            Ok(Box::new(driver))
        }
        _ => Err(Error::UnknownDevice(config.device_type.clone())),
    }
}
