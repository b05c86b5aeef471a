//! SensorDriver trait definition

use crate::core::types::{SampleSender, SensorAvailability};
use crate::error::Result;
use std::time::Duration;

/// Device driver trait for motion sensor hardware
pub trait SensorDriver: Send {
    /// Human readable device name (used in logs)
    fn name(&self) -> &str;

    /// Report which sensors this device can deliver
    fn probe(&mut self) -> SensorAvailability;

    /// Subscribe to every available sensor
    ///
    /// The driver should:
    /// 1. Start its internal reader thread(s)
    /// 2. Push one sample per available sensor every `interval` (best-effort)
    /// 3. Use `try_send` so a slow consumer never blocks the reader
    ///
    /// Returning an error means nothing was started.
    fn open(&mut self, interval: Duration, sender: SampleSender) -> Result<()>;

    /// Release all subscriptions and join reader threads
    ///
    /// Must be idempotent; the driver has to be re-openable afterwards.
    fn close(&mut self);

    /// Samples dropped because the stream channel was full
    fn dropped_samples(&self) -> u64 {
        0
    }
}
