//! Sensor source adapter.
//!
//! Wraps a [`SensorDriver`] and turns it into a single ordered
//! [`SampleStream`]. The source owns the start/stop lifecycle:
//!
//! ```text
//! start(interval)
//!   ├── probe()            → SensorUnavailable(kind) if a required sensor is missing
//!   └── for attempt in 0..max_attempts
//!         ├── open(interval, tx)
//!         ├── wait ≤ startup_timeout for first sample
//!         ├── ok   → SampleStream (first sample retained)
//!         └── fail → close(), sleep(backoff(attempt))
//!   → SensorInitTimeout / last init error
//! ```
//!
//! The driver is owned by value. Whoever holds the `SensorSource` holds the
//! hardware subscription; sessions take it and hand it back when they end.

use crate::config::SourceConfig;
use crate::core::driver::SensorDriver;
use crate::core::types::{
    SampleReceiver, SensorAvailability, SensorKind, SensorSample, create_sample_channel,
};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crossbeam_channel::RecvTimeoutError;
use std::thread;
use std::time::{Duration, Instant};

/// Sensor source adapter
pub struct SensorSource {
    driver: Box<dyn SensorDriver>,
    config: SourceConfig,
    policy: RetryPolicy,
    availability: Option<SensorAvailability>,
    running: bool,
}

impl SensorSource {
    /// Wrap a driver with the given source configuration
    pub fn new(driver: Box<dyn SensorDriver>, config: SourceConfig) -> Self {
        let policy = RetryPolicy::new(&config.retry);
        Self {
            driver,
            config,
            policy,
            availability: None,
            running: false,
        }
    }

    /// Device name reported by the driver
    pub fn device_name(&self) -> &str {
        self.driver.name()
    }

    /// Source configuration
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Whether the driver is currently streaming
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Probe the device and cache the result
    pub fn probe(&mut self) -> SensorAvailability {
        let availability = self.driver.probe();
        self.availability = Some(availability);
        availability
    }

    /// Availability from the most recent probe
    ///
    /// Returns `false` until the device has been probed (by `probe` or `start`).
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.availability.is_some_and(|a| a.has(kind))
    }

    /// Availability from the most recent probe, if any
    pub fn availability(&self) -> Option<SensorAvailability> {
        self.availability
    }

    /// Samples the driver dropped because the consumer fell behind
    pub fn dropped_samples(&self) -> u64 {
        self.driver.dropped_samples()
    }

    /// Start streaming at `update_interval_ms`
    ///
    /// Resolves within `max_attempts * startup_timeout` plus backoff; it never
    /// waits indefinitely. On success the first sample has already been
    /// observed and is the first item the returned stream yields.
    pub fn start(&mut self, update_interval_ms: u64) -> Result<SampleStream> {
        if self.running {
            return Err(Error::AlreadyRunning);
        }
        if update_interval_ms == 0 {
            return Err(Error::Config(
                "sensor update interval must be positive".to_string(),
            ));
        }

        let availability = self.probe();
        if let Some(kind) = availability.missing_required() {
            log::error!("{}: required {} not available", self.driver.name(), kind);
            return Err(Error::SensorUnavailable(kind));
        }
        if !availability.gyroscope() {
            log::warn!(
                "{}: gyroscope not available, continuing without it",
                self.driver.name()
            );
        }

        let interval = Duration::from_millis(update_interval_ms);
        let max_attempts = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..max_attempts {
            match self.try_open(interval, availability) {
                Ok(stream) => {
                    self.running = true;
                    log::info!(
                        "{}: streaming at {}ms (attempt {}/{})",
                        self.driver.name(),
                        update_interval_ms,
                        attempt + 1,
                        max_attempts
                    );
                    return Ok(stream);
                }
                Err(e) => {
                    log::warn!(
                        "{}: start attempt {}/{} failed: {}",
                        self.driver.name(),
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                    if self.policy.should_retry(attempt) {
                        thread::sleep(self.policy.backoff(attempt));
                    }
                }
            }
        }

        let error = match last_error {
            Some(Error::SensorInitTimeout { .. }) | None => Error::SensorInitTimeout {
                attempts: max_attempts,
            },
            Some(e) => e,
        };
        log::error!("{}: giving up: {}", self.driver.name(), error);
        Err(error)
    }

    /// Stop streaming and release all driver subscriptions
    ///
    /// Safe to call repeatedly; the source can be started again afterwards.
    pub fn stop(&mut self) {
        if self.running {
            self.driver.close();
            self.running = false;
            log::info!("{}: stopped", self.driver.name());
        }
    }

    fn try_open(
        &mut self,
        interval: Duration,
        availability: SensorAvailability,
    ) -> Result<SampleStream> {
        let (tx, rx) = create_sample_channel(self.config.channel_capacity);

        if let Err(e) = self.driver.open(interval, tx) {
            self.driver.close();
            return Err(e);
        }

        match rx.recv_timeout(self.config.startup_timeout()) {
            Ok(first) => Ok(SampleStream::new(
                rx,
                Some(first),
                availability,
                self.config.max_consecutive_invalid,
            )),
            Err(_) => {
                self.driver.close();
                Err(Error::SensorInitTimeout { attempts: 1 })
            }
        }
    }
}

impl Drop for SensorSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ordered, validated sample stream from a running [`SensorSource`]
///
/// Samples with NaN or infinite axes are discarded. A sensor kind that keeps
/// producing them for more than `max_consecutive_invalid` samples in a row is
/// reported as unavailable.
pub struct SampleStream {
    receiver: SampleReceiver,
    pending: Option<SensorSample>,
    availability: SensorAvailability,
    invalid_runs: [u32; 3],
    max_consecutive_invalid: u32,
    received: u64,
    discarded: u64,
}

impl SampleStream {
    fn new(
        receiver: SampleReceiver,
        pending: Option<SensorSample>,
        availability: SensorAvailability,
        max_consecutive_invalid: u32,
    ) -> Self {
        Self {
            receiver,
            pending,
            availability,
            invalid_runs: [0; 3],
            max_consecutive_invalid,
            received: 0,
            discarded: 0,
        }
    }

    /// Availability probed when the stream was opened
    pub fn availability(&self) -> SensorAvailability {
        self.availability
    }

    /// Valid samples delivered so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Non-finite samples discarded so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Wait up to `timeout` for the next valid sample
    ///
    /// Returns `Ok(None)` on timeout and [`Error::Disconnected`] once the
    /// driver has been closed and the buffer is drained.
    pub fn next_sample(&mut self, timeout: Duration) -> Result<Option<SensorSample>> {
        let deadline = Instant::now() + timeout;
        loop {
            let sample = match self.pending.take() {
                Some(sample) => sample,
                None => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.receiver.recv_timeout(remaining) {
                        Ok(sample) => sample,
                        Err(RecvTimeoutError::Timeout) => return Ok(None),
                        Err(RecvTimeoutError::Disconnected) => return Err(Error::Disconnected),
                    }
                }
            };

            if let Some(valid) = self.validate(sample)? {
                return Ok(Some(valid));
            }
        }
    }

    fn validate(&mut self, sample: SensorSample) -> Result<Option<SensorSample>> {
        let idx = sample.kind.index();

        if sample.is_finite() {
            self.invalid_runs[idx] = 0;
            self.received += 1;
            return Ok(Some(sample));
        }

        self.discarded += 1;
        self.invalid_runs[idx] += 1;
        log::debug!(
            "Discarded non-finite {} sample at {}us ({} in a row)",
            sample.kind,
            sample.timestamp_us,
            self.invalid_runs[idx]
        );

        if self.invalid_runs[idx] > self.max_consecutive_invalid {
            log::error!(
                "{} produced {} consecutive invalid samples",
                sample.kind,
                self.invalid_runs[idx]
            );
            return Err(Error::SensorUnavailable(sample.kind));
        }
        Ok(None)
    }
}
