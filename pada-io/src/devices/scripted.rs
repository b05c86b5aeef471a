//! Scripted replay driver
//!
//! Replays a fixed list of samples (recorded data or synthetic test input)
//! through the normal driver interface. Unlike a live sensor, replay applies
//! backpressure instead of dropping samples when the consumer is slow, so a
//! given script always produces the same stream.
//!
//! Pacing follows sample timestamps divided by `speed_factor`; a factor of
//! `0.0` replays as fast as the consumer reads.

use crate::core::driver::SensorDriver;
use crate::core::types::{SampleSender, SensorAvailability, SensorSample};
use crate::error::{Error, Result};
use crossbeam_channel::SendTimeoutError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Poll period while waiting for the consumer or for shutdown
const POLL: Duration = Duration::from_millis(10);

/// Driver that replays a fixed sample script
pub struct ScriptedDriver {
    name: String,
    samples: Arc<Vec<SensorSample>>,
    availability: SensorAvailability,
    speed_factor: f64,
    hold_open: bool,
    failed_opens_remaining: u32,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScriptedDriver {
    /// Replay `samples` as fast as they are consumed, all sensors available
    pub fn new(samples: Vec<SensorSample>) -> Self {
        Self {
            name: "Scripted replay".to_string(),
            samples: Arc::new(samples),
            availability: SensorAvailability::all(),
            speed_factor: 0.0,
            hold_open: true,
            failed_opens_remaining: 0,
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Override the probed availability
    pub fn with_availability(mut self, availability: SensorAvailability) -> Self {
        self.availability = availability;
        self
    }

    /// Fail the first `count` calls to `open`
    pub fn with_failed_opens(mut self, count: u32) -> Self {
        self.failed_opens_remaining = count;
        self
    }

    /// Pace replay by sample timestamps (1.0 = real time)
    pub fn with_speed_factor(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor.max(0.0);
        self
    }

    /// Close the stream once the script is exhausted
    ///
    /// By default the stream stays open (silent) until `close`, like a live
    /// sensor that stopped reporting.
    pub fn finish_on_end(mut self) -> Self {
        self.hold_open = false;
        self
    }

    /// Number of samples in the script
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the script is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SensorDriver for ScriptedDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&mut self) -> SensorAvailability {
        self.availability
    }

    fn open(&mut self, _interval: Duration, sender: SampleSender) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::AlreadyRunning);
        }
        if self.failed_opens_remaining > 0 {
            self.failed_opens_remaining -= 1;
            return Err(Error::InitializationFailed(
                "scripted open failure".to_string(),
            ));
        }

        self.shutdown.store(false, Ordering::Relaxed);
        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);
        let availability = self.availability;
        let speed_factor = self.speed_factor;
        let hold_open = self.hold_open;

        let handle = thread::Builder::new()
            .name("scripted-replay".to_string())
            .spawn(move || {
                replay_loop(
                    &samples,
                    availability,
                    speed_factor,
                    hold_open,
                    &shutdown,
                    sender,
                );
            })
            .map_err(|e| Error::InitializationFailed(format!("spawn failed: {}", e)))?;

        self.handle = Some(handle);
        log::debug!("Scripted replay opened ({} samples)", self.samples.len());
        Ok(())
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScriptedDriver {
    fn drop(&mut self) {
        self.close();
    }
}

fn replay_loop(
    samples: &[SensorSample],
    availability: SensorAvailability,
    speed_factor: f64,
    hold_open: bool,
    shutdown: &AtomicBool,
    sender: SampleSender,
) {
    let mut previous_us: Option<u64> = None;

    for sample in samples.iter().filter(|s| availability.has(s.kind)) {
        if speed_factor > 0.0 {
            if let Some(prev) = previous_us {
                let gap_us = sample.timestamp_us.saturating_sub(prev) as f64 / speed_factor;
                if gap_us > 0.0 {
                    thread::sleep(Duration::from_micros(gap_us as u64));
                }
            }
            previous_us = Some(sample.timestamp_us);
        }

        let mut pending = *sample;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            match sender.send_timeout(pending, POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(s)) => pending = s,
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    }

    if hold_open {
        while !shutdown.load(Ordering::Relaxed) {
            thread::sleep(POLL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SensorKind, create_sample_channel};

    fn script() -> Vec<SensorSample> {
        vec![
            SensorSample::new(SensorKind::Accelerometer, 0.0, 0.0, 9.8, 0),
            SensorSample::new(SensorKind::Gyroscope, 0.0, 0.0, 0.0, 0),
            SensorSample::new(SensorKind::Magnetometer, 20.0, 0.0, 0.0, 0),
        ]
    }

    #[test]
    fn test_replay_in_order_and_finish() {
        let mut driver = ScriptedDriver::new(script()).finish_on_end();
        let (tx, rx) = create_sample_channel(1);

        driver.open(Duration::from_millis(20), tx).unwrap();
        let replayed: Vec<SensorSample> = rx.iter().collect();
        driver.close();

        assert_eq!(replayed, script());
    }

    #[test]
    fn test_unavailable_kinds_filtered() {
        let mut driver = ScriptedDriver::new(script())
            .with_availability(SensorAvailability::new(true, true, false))
            .finish_on_end();
        let (tx, rx) = create_sample_channel(8);

        driver.open(Duration::from_millis(20), tx).unwrap();
        let replayed: Vec<SensorSample> = rx.iter().collect();
        driver.close();

        assert_eq!(replayed.len(), 2);
        assert!(replayed.iter().all(|s| s.kind != SensorKind::Gyroscope));
    }

    #[test]
    fn test_failed_opens_then_success() {
        let mut driver = ScriptedDriver::new(script()).with_failed_opens(1);

        let (tx, _rx) = create_sample_channel(8);
        assert!(driver.open(Duration::from_millis(20), tx).is_err());

        let (tx, rx) = create_sample_channel(8);
        assert!(driver.open(Duration::from_millis(20), tx).is_ok());
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_ok());
        driver.close();
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut driver = ScriptedDriver::new(script());
        let (tx, _rx) = create_sample_channel(8);
        driver.open(Duration::from_millis(20), tx).unwrap();
        driver.close();
        driver.close();
    }
}
