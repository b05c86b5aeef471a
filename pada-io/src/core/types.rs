//! Core data types for motion sensors and their sample stream.
//!
//! Key types for device implementers:
//! - [`SensorSample`]: One timestamped three-axis reading
//! - [`SensorAvailability`]: Which sensors a device can deliver
//! - [`SampleSender`]: Channel end a driver pushes samples into

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Motion sensor kinds delivered by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Linear acceleration including gravity (m/s²)
    Accelerometer,
    /// Magnetic field (μT)
    Magnetometer,
    /// Angular velocity (rad/s)
    Gyroscope,
}

impl SensorKind {
    /// All kinds, in stream order
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Accelerometer,
        SensorKind::Magnetometer,
        SensorKind::Gyroscope,
    ];

    /// Position of this kind in per-kind arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            SensorKind::Accelerometer => 0,
            SensorKind::Magnetometer => 1,
            SensorKind::Gyroscope => 2,
        }
    }

    /// Whether mapping cannot run without this sensor
    #[inline]
    pub fn is_required(self) -> bool {
        !matches!(self, SensorKind::Gyroscope)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::Gyroscope => "gyroscope",
        };
        f.write_str(name)
    }
}

/// A single three-axis sensor reading
///
/// `timestamp_us` is monotonic microseconds since the source started
/// streaming. Samples are immutable and consumed transiently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_us: u64,
}

impl SensorSample {
    /// Create a new sample
    #[inline]
    pub fn new(kind: SensorKind, x: f64, y: f64, z: f64, timestamp_us: u64) -> Self {
        Self {
            kind,
            x,
            y,
            z,
            timestamp_us,
        }
    }

    /// Euclidean norm of the axis triplet
    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// True when every axis is a finite number
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Sensor availability reported by a device probe
///
/// Step detection is derived from the accelerometer, so `pedometer` always
/// mirrors `accelerometer`. The only constructor enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorAvailability {
    accelerometer: bool,
    magnetometer: bool,
    gyroscope: bool,
    pedometer: bool,
}

impl SensorAvailability {
    /// Build availability flags; `pedometer` follows `accelerometer`
    pub fn new(accelerometer: bool, magnetometer: bool, gyroscope: bool) -> Self {
        Self {
            accelerometer,
            magnetometer,
            gyroscope,
            pedometer: accelerometer,
        }
    }

    /// Everything present
    pub fn all() -> Self {
        Self::new(true, true, true)
    }

    pub fn accelerometer(&self) -> bool {
        self.accelerometer
    }

    pub fn magnetometer(&self) -> bool {
        self.magnetometer
    }

    pub fn gyroscope(&self) -> bool {
        self.gyroscope
    }

    pub fn pedometer(&self) -> bool {
        self.pedometer
    }

    /// Availability of a given kind
    pub fn has(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Accelerometer => self.accelerometer,
            SensorKind::Magnetometer => self.magnetometer,
            SensorKind::Gyroscope => self.gyroscope,
        }
    }

    /// First required sensor that is missing, if any
    pub fn missing_required(&self) -> Option<SensorKind> {
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.is_required() && !self.has(*kind))
    }
}

/// Sending half of a sample stream
pub type SampleSender = Sender<SensorSample>;

/// Receiving half of a sample stream
pub type SampleReceiver = Receiver<SensorSample>;

/// Create the bounded channel a driver streams samples through
///
/// Drivers use `try_send` so a stalled consumer never blocks the sensor
/// thread; overflowing samples are dropped and counted by the driver.
pub fn create_sample_channel(capacity: usize) -> (SampleSender, SampleReceiver) {
    crossbeam_channel::bounded(capacity.max(1))
}
