//! RoomTracer - owns the sensors and the calibration offset.
//!
//! Mapping and calibration both need exclusive use of the sensor source, so
//! the source is moved into whichever operation is active and handed back
//! when it ends. Starting one while the other runs fails with `Busy`.
//!
//! | Operation | Sensors | Offset |
//! |-----------|---------|--------|
//! | `start_mapping_session` | moved into the session | read |
//! | `stop_mapping_session` | returned | unchanged |
//! | `start_calibration` | moved into the runner | unchanged |
//! | `wait_calibration` | returned | replaced on success |
//! | `cancel_calibration` | returned | unchanged |

use crossbeam_channel::Receiver;
use pada_io::{SensorSource, create_device};

use crate::config::RekhaConfig;
use crate::core::types::{CalibrationOffset, Wall};
use crate::engine::calibration::CalibrationHandle;
use crate::engine::session::{MappingSession, SessionConfig, SessionEvent, SessionState};
use crate::error::{Error, Result};

/// Entry point for tracing rooms
pub struct RoomTracer {
    source: Option<SensorSource>,
    mapping: Option<MappingSession>,
    calibration: Option<CalibrationHandle>,
    offset: CalibrationOffset,
    config: RekhaConfig,
}

impl RoomTracer {
    /// Tracer over an existing sensor source, with a zero offset
    pub fn new(source: SensorSource, config: RekhaConfig) -> Self {
        Self {
            source: Some(source),
            mapping: None,
            calibration: None,
            offset: CalibrationOffset::default(),
            config,
        }
    }

    /// Build the configured device and wrap it in a sensor source
    pub fn from_config(config: RekhaConfig) -> Result<Self> {
        config.validate()?;
        let driver = create_device(&config.device)?;
        let source = SensorSource::new(driver, config.sensors.clone());
        Ok(Self::new(source, config))
    }

    pub fn config(&self) -> &RekhaConfig {
        &self.config
    }

    /// Start tracing a new room from the origin.
    ///
    /// Returns the event channel of the new session.
    pub fn start_mapping_session(
        &mut self,
        session: SessionConfig,
    ) -> Result<Receiver<SessionEvent>> {
        let source = self.take_idle_source()?;
        match MappingSession::start(source, session, self.offset) {
            Ok(mapping) => {
                let events = mapping.events();
                self.mapping = Some(mapping);
                Ok(events)
            }
            Err(e) => {
                let (source, error) = e.into_parts();
                self.source = Some(source);
                Err(error)
            }
        }
    }

    /// Stop the active session and return the traced wall
    pub fn stop_mapping_session(&mut self) -> Result<Wall> {
        let mapping = self.mapping.take().ok_or(Error::NoActiveSession)?;
        let (source, wall) = mapping.stop();
        self.source = Some(source);
        wall
    }

    /// State of the active session, if any
    pub fn mapping_state(&self) -> Option<SessionState> {
        self.mapping.as_ref().map(MappingSession::state)
    }

    pub fn is_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    /// Begin a compass calibration with the configured window.
    ///
    /// The user must stand still facing magnetic North until it completes.
    pub fn start_calibration(&mut self) -> Result<()> {
        let source = self.take_idle_source()?;
        match CalibrationHandle::start(source, self.config.calibration.clone()) {
            Ok(handle) => {
                self.calibration = Some(handle);
                Ok(())
            }
            Err(e) => {
                let (source, error) = e.into_parts();
                self.source = Some(source);
                Err(error)
            }
        }
    }

    /// Whether a calibration is running
    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    /// Whether the running calibration has finished collecting
    pub fn is_calibration_finished(&self) -> bool {
        self.calibration
            .as_ref()
            .is_some_and(CalibrationHandle::is_finished)
    }

    /// Block until the calibration completes.
    ///
    /// On success the new offset replaces the current one; on failure the
    /// current offset is kept.
    pub fn wait_calibration(&mut self) -> Result<CalibrationOffset> {
        let handle = self.calibration.take().ok_or(Error::NoActiveCalibration)?;
        let (source, result) = handle.wait();
        self.source = Some(source);

        match result {
            Ok(offset) => {
                log::info!("Calibration offset {} -> {}", self.offset, offset);
                self.offset = offset;
                Ok(offset)
            }
            Err(e) => {
                log::warn!("Calibration failed, keeping offset {}: {}", self.offset, e);
                Err(e)
            }
        }
    }

    /// Abandon the running calibration; the offset is left unchanged
    pub fn cancel_calibration(&mut self) -> Result<()> {
        let handle = self.calibration.take().ok_or(Error::NoActiveCalibration)?;
        handle.cancel();
        let (source, result) = handle.wait();
        self.source = Some(source);
        if let Ok(offset) = result {
            log::debug!("Calibration finished before cancel, discarding {}", offset);
        }
        log::info!("Calibration cancelled");
        Ok(())
    }

    pub fn calibration_offset(&self) -> CalibrationOffset {
        self.offset
    }

    /// Replace the offset directly (e.g. one saved from an earlier run)
    pub fn set_calibration_offset(&mut self, offset: CalibrationOffset) {
        self.offset = offset;
    }

    fn take_idle_source(&mut self) -> Result<SensorSource> {
        if self.mapping.is_some() {
            return Err(Error::Busy("mapping session"));
        }
        if self.calibration.is_some() {
            return Err(Error::Busy("calibration"));
        }
        self.source.take().ok_or(Error::Busy("sensor handover"))
    }
}

impl Drop for RoomTracer {
    fn drop(&mut self) {
        if let Some(handle) = self.calibration.take() {
            handle.cancel();
            let _ = handle.wait();
        }
        if let Some(mapping) = self.mapping.take() {
            let _ = mapping.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pada_io::{ScriptedDriver, SensorKind, SensorSample, SourceConfig};

    /// Phone held still facing `heading_deg`, 50 Hz
    fn standing(heading_deg: f64, seconds: u64) -> Vec<SensorSample> {
        let theta = heading_deg.to_radians();
        (0..seconds * 50)
            .flat_map(|i| {
                let t = i * 20_000;
                [
                    SensorSample::new(SensorKind::Accelerometer, 0.0, 0.0, 9.81, t),
                    SensorSample::new(
                        SensorKind::Magnetometer,
                        30.0 * theta.cos(),
                        30.0 * theta.sin(),
                        0.0,
                        t,
                    ),
                ]
            })
            .collect()
    }

    fn tracer(samples: Vec<SensorSample>) -> RoomTracer {
        let source = SensorSource::new(
            Box::new(ScriptedDriver::new(samples)),
            SourceConfig::default(),
        );
        RoomTracer::new(source, RekhaConfig::default())
    }

    #[test]
    fn test_stop_without_session() {
        let mut tracer = tracer(standing(0.0, 1));
        assert!(matches!(
            tracer.stop_mapping_session(),
            Err(Error::NoActiveSession)
        ));
        assert!(matches!(
            tracer.wait_calibration(),
            Err(Error::NoActiveCalibration)
        ));
    }

    #[test]
    fn test_mapping_blocks_calibration() {
        let mut tracer = tracer(standing(0.0, 4));
        let _events = tracer
            .start_mapping_session(SessionConfig::default())
            .unwrap();
        assert!(tracer.is_mapping());
        assert!(matches!(
            tracer.start_calibration(),
            Err(Error::Busy("mapping session"))
        ));
        assert!(matches!(
            tracer.start_mapping_session(SessionConfig::default()),
            Err(Error::Busy(_))
        ));

        // Standing still: no steps, so no wall
        assert!(matches!(
            tracer.stop_mapping_session(),
            Err(Error::InsufficientPoints { count: 1 })
        ));
        assert!(!tracer.is_mapping());

        // Sensors are back and usable
        tracer.start_calibration().unwrap();
        tracer.wait_calibration().unwrap();
    }

    #[test]
    fn test_calibration_applies_offset() {
        let mut tracer = tracer(standing(90.0, 5));
        tracer.start_calibration().unwrap();
        assert!(tracer.is_calibrating());
        assert!(matches!(
            tracer.start_mapping_session(SessionConfig::default()),
            Err(Error::Busy("calibration"))
        ));

        let offset = tracer.wait_calibration().unwrap();
        assert_relative_eq!(offset.degrees(), 270.0, epsilon = 1e-9);
        assert_eq!(tracer.calibration_offset(), offset);
        assert!(!tracer.is_calibrating());
    }

    #[test]
    fn test_failed_calibration_keeps_offset() {
        // 0.2 s of headings, then silence
        let mut tracer = tracer(standing(45.0, 1).into_iter().take(20).collect());
        tracer.set_calibration_offset(CalibrationOffset::new(10.0));
        tracer.start_calibration().unwrap();

        assert!(matches!(
            tracer.wait_calibration(),
            Err(Error::InsufficientSamples { .. })
        ));
        assert_relative_eq!(tracer.calibration_offset().degrees(), 10.0);
    }

    #[test]
    fn test_cancel_keeps_offset() {
        let source = SensorSource::new(
            Box::new(ScriptedDriver::new(standing(90.0, 10)).with_speed_factor(1.0)),
            SourceConfig::default(),
        );
        let mut tracer = RoomTracer::new(source, RekhaConfig::default());
        tracer.start_calibration().unwrap();
        tracer.cancel_calibration().unwrap();

        assert_eq!(tracer.calibration_offset(), CalibrationOffset::default());
        assert!(!tracer.is_calibrating());
        assert!(matches!(
            tracer.cancel_calibration(),
            Err(Error::NoActiveCalibration)
        ));
    }

    #[test]
    fn test_start_failure_returns_sensors() {
        let driver = ScriptedDriver::new(standing(0.0, 1))
            .with_availability(pada_io::SensorAvailability::new(false, true, true));
        let source = SensorSource::new(Box::new(driver), SourceConfig::default());
        let mut tracer = RoomTracer::new(source, RekhaConfig::default());

        assert!(matches!(
            tracer.start_mapping_session(SessionConfig::default()),
            Err(Error::Sensor(pada_io::Error::SensorUnavailable(
                SensorKind::Accelerometer
            )))
        ));
        // Not stuck in Busy
        assert!(matches!(
            tracer.start_calibration(),
            Err(Error::Sensor(_))
        ));
    }
}
