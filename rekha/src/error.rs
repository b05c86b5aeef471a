//! Error types for Rekha

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rekha error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sensor layer failure (missing sensor, start timeout, disconnect)
    #[error("Sensor error: {0}")]
    Sensor(#[from] pada_io::Error),

    /// Calibration window closed with too few usable headings
    #[error("Calibration collected {collected} samples, {required} required")]
    InsufficientSamples { collected: usize, required: usize },

    /// Track too short to form a wall
    #[error("Wall needs at least 3 points, track has {count}")]
    InsufficientPoints { count: usize },

    /// Calibration cancelled before its window elapsed
    #[error("Calibration cancelled")]
    CalibrationCancelled,

    /// Sensors are held by another operation
    #[error("Sensors busy: {0} in progress")]
    Busy(&'static str),

    #[error("No mapping session in progress")]
    NoActiveSession,

    #[error("No calibration in progress")]
    NoActiveCalibration,

    /// Worker thread could not be spawned or panicked
    #[error("Worker thread failed: {0}")]
    Worker(String),

    /// Configuration value out of range
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
