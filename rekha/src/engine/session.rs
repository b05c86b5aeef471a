//! Mapping session - the single consumer of the sample stream.
//!
//! This thread:
//! - Receives every sample from the started [`SensorSource`]
//! - Feeds accelerometer samples to the step detector
//! - Turns magnetometer samples into calibrated headings
//! - Applies each accepted step to the mapping processor, in sample order,
//!   with the most recent heading
//! - Publishes a [`SessionEvent`] per step, on loop closure and on faults
//!
//! The thread is the only writer of the track. Everyone else sees copies
//! through the event channel, and the final wall is produced on `stop`.
//!
//! ```text
//! SensorSource ──▶ SampleStream ──▶ [rekha-mapping] ──▶ Receiver<SessionEvent>
//!      ▲                                  │
//!      └──────── stop(): (source, wall) ◀─┘
//! ```

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pada_io::{SampleStream, SensorKind, SensorSource};

use crate::config::{LoopClosureConfig, RekhaConfig, SimplifyConfig, StepDetectorConfig};
use crate::core::types::{CalibrationOffset, StepUpdate, Wall};
use crate::error::{Error, Result};
use crate::mapping::MappingProcessor;
use crate::sensors::{HeadingEstimator, StepDetector};

/// Stream poll period; bounds how long `stop` waits for the thread
const POLL: Duration = Duration::from_millis(50);

/// Mapping session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Distance per step (m)
    pub step_length_m: f64,
    /// Requested sensor update interval (ms)
    pub sensor_update_interval_ms: u64,
    pub step_detector: StepDetectorConfig,
    pub loop_closure: LoopClosureConfig,
    pub simplify: SimplifyConfig,
}

impl SessionConfig {
    /// Session with default detector, loop closure and simplification
    pub fn new(step_length_m: f64, sensor_update_interval_ms: u64) -> Self {
        Self {
            step_length_m,
            sensor_update_interval_ms,
            step_detector: StepDetectorConfig::default(),
            loop_closure: LoopClosureConfig::default(),
            simplify: SimplifyConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&RekhaConfig::default())
    }
}

impl From<&RekhaConfig> for SessionConfig {
    fn from(config: &RekhaConfig) -> Self {
        Self {
            step_length_m: config.mapping.step_length_m,
            sensor_update_interval_ms: config.mapping.update_interval_ms,
            step_detector: config.step_detector.clone(),
            loop_closure: config.loop_closure.clone(),
            simplify: config.simplify.clone(),
        }
    }
}

/// Published by the mapping thread
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A step was accepted; full track snapshot
    Step(StepUpdate),
    /// The walk returned to its start; the session has completed
    LoopClosed,
    /// The sample stream failed; the session has ended
    Fault(String),
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Tracking,
    /// Terminal: loop closed, fault, or stopped
    Completed,
}

/// Failed start; the sensor source is handed back
pub struct StartError {
    pub sensors: SensorSource,
    pub error: Error,
}

impl StartError {
    pub fn into_parts(self) -> (SensorSource, Error) {
        (self.sensors, self.error)
    }
}

impl std::fmt::Debug for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartError")
            .field("device", &self.sensors.device_name())
            .field("error", &self.error)
            .finish()
    }
}

/// Running mapping session
pub struct MappingSession {
    source: SensorSource,
    shutdown: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
    events: Receiver<SessionEvent>,
    handle: JoinHandle<MappingProcessor>,
}

impl MappingSession {
    /// Reset a fresh track, start the sensors and spawn the mapping thread.
    ///
    /// `calibration_offset` is applied to every heading of this session.
    pub fn start(
        mut source: SensorSource,
        config: SessionConfig,
        calibration_offset: CalibrationOffset,
    ) -> std::result::Result<Self, StartError> {
        let stream = match source.start(config.sensor_update_interval_ms) {
            Ok(stream) => stream,
            Err(e) => {
                return Err(StartError {
                    sensors: source,
                    error: e.into(),
                });
            }
        };

        let mut processor = MappingProcessor::new(config.step_length_m)
            .with_loop_closure(config.loop_closure.clone())
            .with_simplify(config.simplify.clone());
        processor.reset();
        processor.set_calibration_offset(calibration_offset);
        let detector = StepDetector::new(config.step_detector.clone());

        let shutdown = Arc::new(AtomicBool::new(false));
        let completed = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = unbounded();

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_completed = Arc::clone(&completed);
        let spawned = thread::Builder::new()
            .name("rekha-mapping".into())
            .spawn(move || {
                let processor = run_mapping_loop(
                    stream,
                    processor,
                    detector,
                    &thread_shutdown,
                    &event_tx,
                );
                thread_completed.store(true, Ordering::Release);
                processor
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                source.stop();
                return Err(StartError {
                    sensors: source,
                    error: Error::Worker(format!("failed to spawn mapping thread: {}", e)),
                });
            }
        };

        log::info!(
            "Mapping session started on {} (step {:.2} m, offset {})",
            source.device_name(),
            config.step_length_m,
            calibration_offset
        );

        Ok(Self {
            source,
            shutdown,
            completed,
            events: event_rx,
            handle,
        })
    }

    /// Event channel; clones share one queue
    ///
    /// After `LoopClosed` or `Fault` the thread has ended; call `stop` to
    /// collect the wall and release the sensors.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events.clone()
    }

    pub fn state(&self) -> SessionState {
        if self.completed.load(Ordering::Acquire) {
            SessionState::Completed
        } else {
            SessionState::Tracking
        }
    }

    /// Stop tracking, release the sensors and build the wall.
    ///
    /// Returns the sensor source in every case. The wall is the closed,
    /// simplified track, or `InsufficientPoints` when two points or fewer
    /// were recorded.
    pub fn stop(mut self) -> (SensorSource, Result<Wall>) {
        self.shutdown.store(true, Ordering::Release);
        self.source.stop();

        let processor = match self.handle.join() {
            Ok(processor) => processor,
            Err(_) => {
                return (
                    self.source,
                    Err(Error::Worker("mapping thread panicked".to_string())),
                );
            }
        };

        let count = processor.points().len();
        let wall = if count <= 2 {
            Err(Error::InsufficientPoints { count })
        } else {
            Wall::new(processor.close_loop())
        };

        match &wall {
            Ok(w) => log::info!(
                "Mapping session stopped: {} steps, {:.2} m walked, {} wall points",
                processor.step_count(),
                processor.total_distance(),
                w.len()
            ),
            Err(e) => log::warn!("Mapping session stopped without a wall: {}", e),
        }

        (self.source, wall)
    }
}

/// Consumer loop; returns the processor with the final track
fn run_mapping_loop(
    mut stream: SampleStream,
    mut processor: MappingProcessor,
    mut detector: StepDetector,
    shutdown: &AtomicBool,
    events: &Sender<SessionEvent>,
) -> MappingProcessor {
    let estimator = HeadingEstimator::new();
    let mut gyro_samples: u64 = 0;

    log::debug!("Mapping loop started");

    while !shutdown.load(Ordering::Acquire) {
        let sample = match stream.next_sample(POLL) {
            Ok(Some(sample)) => sample,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::Acquire) {
                    log::error!("Mapping stream failed: {}", e);
                    let _ = events.send(SessionEvent::Fault(e.to_string()));
                }
                break;
            }
        };

        match sample.kind {
            SensorKind::Accelerometer => {
                let Some(step) = detector.on_sample(&sample) else {
                    continue;
                };
                let heading = processor.current_heading();
                processor.on_step_event(step, heading);
                let _ = events.send(SessionEvent::Step(processor.snapshot()));

                if processor.is_loop_complete() {
                    log::info!(
                        "Loop closed after {} steps ({:.2} m)",
                        processor.step_count(),
                        processor.total_distance()
                    );
                    let _ = events.send(SessionEvent::LoopClosed);
                    break;
                }
            }
            SensorKind::Magnetometer => {
                let heading = estimator.compute(&sample, processor.calibration_offset());
                processor.update_heading(heading);
            }
            SensorKind::Gyroscope => gyro_samples += 1,
        }
    }

    log::debug!(
        "Mapping loop ended: {} samples, {} discarded, {} gyro",
        stream.received(),
        stream.discarded(),
        gyro_samples
    );
    processor
}
