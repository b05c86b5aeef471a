//! Error types for PadaIO

use crate::core::types::SensorKind;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// PadaIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration is structurally valid but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required sensor is missing on this device
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(SensorKind),

    /// Sensors are present but produced no data within the startup timeout
    #[error("No sensor data after {attempts} start attempts")]
    SensorInitTimeout {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Driver failed to open its subscriptions
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// `start` called on a source that is already streaming
    #[error("Sensor source already running")]
    AlreadyRunning,

    /// Sample stream closed (driver stopped)
    #[error("Sensor stream disconnected")]
    Disconnected,

    /// Device type in configuration is not known
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),
}
