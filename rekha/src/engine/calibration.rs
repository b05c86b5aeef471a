//! Timed compass calibration on its own thread.
//!
//! Starts the sensors, feeds raw magnetometer headings into a
//! [`CalibrationSession`] for `duration_ms` of sample time, then hands back
//! the sensor source and the result. The window is measured on sample
//! timestamps, so a time-compressed simulated device calibrates just as a
//! real one does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pada_io::{SampleStream, SensorKind, SensorSource};

use crate::config::CalibrationConfig;
use crate::core::types::CalibrationOffset;
use crate::engine::session::StartError;
use crate::error::{Error, Result};
use crate::sensors::{CalibrationSession, HeadingEstimator};

/// Stream poll period; bounds how quickly `cancel` is observed
const POLL: Duration = Duration::from_millis(50);

/// Running calibration
pub struct CalibrationHandle {
    source: SensorSource,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Result<CalibrationOffset>>,
}

impl CalibrationHandle {
    /// Start the sensors and begin collecting headings.
    ///
    /// The user should be standing still, facing magnetic North.
    pub fn start(
        mut source: SensorSource,
        config: CalibrationConfig,
    ) -> std::result::Result<Self, StartError> {
        let stream = match source.start(config.update_interval_ms) {
            Ok(stream) => stream,
            Err(e) => {
                return Err(StartError {
                    sensors: source,
                    error: e.into(),
                });
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name("rekha-calibration".into())
            .spawn(move || run_calibration(stream, config, &thread_cancel));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                source.stop();
                return Err(StartError {
                    sensors: source,
                    error: Error::Worker(format!("failed to spawn calibration thread: {}", e)),
                });
            }
        };

        log::info!("Calibration started on {}", source.device_name());
        Ok(Self {
            source,
            cancel,
            handle,
        })
    }

    /// Abandon the run; `wait` will report `CalibrationCancelled`
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether the collection window has closed (or the run failed)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run ends, release the sensors and return the offset
    pub fn wait(mut self) -> (SensorSource, Result<CalibrationOffset>) {
        let result = match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(Error::Worker("calibration thread panicked".to_string())),
        };
        self.source.stop();
        (self.source, result)
    }
}

fn run_calibration(
    mut stream: SampleStream,
    config: CalibrationConfig,
    cancel: &AtomicBool,
) -> Result<CalibrationOffset> {
    let estimator = HeadingEstimator::new();
    let stall_limit = Duration::from_millis(config.duration_ms.max(1000));
    let mut session = CalibrationSession::new(config);
    let mut last_heading_at = Instant::now();

    loop {
        if cancel.load(Ordering::Acquire) {
            session.cancel();
            break;
        }

        let sample = match stream.next_sample(POLL)? {
            Some(sample) if sample.kind == SensorKind::Magnetometer => sample,
            _ => {
                if last_heading_at.elapsed() > stall_limit {
                    log::warn!(
                        "No magnetometer data for {:?}, ending calibration early",
                        stall_limit
                    );
                    break;
                }
                continue;
            }
        };
        last_heading_at = Instant::now();

        let raw = estimator.raw_heading(&sample);
        if session.offer(sample.timestamp_us, raw.degrees()) {
            log::debug!("Calibration heading {} at {}us", raw, sample.timestamp_us);
        }
        if session.is_window_elapsed(sample.timestamp_us) {
            break;
        }
    }

    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pada_io::{ScriptedDriver, SensorSample, SourceConfig};

    fn facing(heading_deg: f64, seconds: u64) -> Vec<SensorSample> {
        let theta = heading_deg.to_radians();
        (0..seconds * 50)
            .map(|i| {
                SensorSample::new(
                    SensorKind::Magnetometer,
                    30.0 * theta.cos(),
                    30.0 * theta.sin(),
                    0.0,
                    i * 20_000,
                )
            })
            .collect()
    }

    fn source(samples: Vec<SensorSample>) -> SensorSource {
        SensorSource::new(
            Box::new(ScriptedDriver::new(samples)),
            SourceConfig::default(),
        )
    }

    #[test]
    fn test_calibration_offset_from_window() {
        let handle =
            CalibrationHandle::start(source(facing(30.0, 5)), CalibrationConfig::default())
                .unwrap();
        let (sensors, result) = handle.wait();
        assert!(!sensors.is_running());
        assert_relative_eq!(result.unwrap().degrees(), 330.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_feed_is_insufficient() {
        // 0.3 s of data then silence: 3 headings collected
        let config = CalibrationConfig {
            duration_ms: 1000,
            ..CalibrationConfig::default()
        };
        let samples: Vec<_> = facing(0.0, 1).into_iter().take(15).collect();
        let handle = CalibrationHandle::start(source(samples), config).unwrap();
        let (_sensors, result) = handle.wait();
        assert!(matches!(
            result,
            Err(Error::InsufficientSamples {
                collected: 3,
                required: 5
            })
        ));
    }

    #[test]
    fn test_cancel_before_window() {
        // Real-time pacing keeps the window open long enough to cancel
        let driver = ScriptedDriver::new(facing(0.0, 10)).with_speed_factor(1.0);
        let sensors = SensorSource::new(Box::new(driver), SourceConfig::default());
        let handle = CalibrationHandle::start(sensors, CalibrationConfig::default()).unwrap();

        thread::sleep(Duration::from_millis(200));
        assert!(!handle.is_finished());
        handle.cancel();

        let (sensors, result) = handle.wait();
        assert!(matches!(result, Err(Error::CalibrationCancelled)));
        assert!(!sensors.is_running());
    }

    #[test]
    fn test_missing_magnetometer_fails_to_start() {
        let driver = ScriptedDriver::new(facing(0.0, 1))
            .with_availability(pada_io::SensorAvailability::new(true, false, false));
        let sensors = SensorSource::new(Box::new(driver), SourceConfig::default());
        let Err(err) = CalibrationHandle::start(sensors, CalibrationConfig::default()) else {
            panic!("calibration should not start without a magnetometer");
        };
        assert!(matches!(
            err.error,
            Error::Sensor(pada_io::Error::SensorUnavailable(SensorKind::Magnetometer))
        ));
    }
}
