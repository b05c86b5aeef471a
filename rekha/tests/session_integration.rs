//! End-to-end tracing on the simulated walker
//!
//! Every test runs the full pipeline: walker thread, sensor source, mapping
//! or calibration thread, and the tracer that hands the sensors around.
//! Walks run at 20x real time.

#![cfg(feature = "mock")]

use std::time::Duration;

use approx::assert_relative_eq;
use pada_io::{SensorSource, SimulatedWalkDriver, SimulationConfig, SourceConfig, WalkLeg};
use rekha::{
    CalibrationOffset, Error, Point, RekhaConfig, RoomTracer, SessionConfig, SessionEvent,
    SessionState, StepUpdate, Wall,
};

const SPEED: f64 = 20.0;
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

fn simulation(legs: Vec<WalkLeg>) -> SimulationConfig {
    SimulationConfig {
        speed_factor: SPEED,
        legs,
        ..SimulationConfig::default()
    }
}

fn square(rotation_deg: f64) -> Vec<WalkLeg> {
    [0.0, 90.0, 180.0, 270.0]
        .into_iter()
        .map(|heading| WalkLeg::new(10, heading + rotation_deg))
        .collect()
}

fn tracer(config: SimulationConfig) -> RoomTracer {
    let driver = SimulatedWalkDriver::new("test walker", config);
    let source = SensorSource::new(Box::new(driver), SourceConfig::default());
    RoomTracer::new(source, RekhaConfig::default())
}

/// Collect step updates until the session closes its loop or fails
fn drain(events: &crossbeam_channel::Receiver<SessionEvent>) -> (Vec<StepUpdate>, bool) {
    let mut steps = Vec::new();
    while let Ok(event) = events.recv_timeout(EVENT_TIMEOUT) {
        match event {
            SessionEvent::Step(update) => steps.push(update),
            SessionEvent::LoopClosed => return (steps, true),
            SessionEvent::Fault(message) => panic!("session fault: {}", message),
        }
    }
    (steps, false)
}

fn assert_near(point: Point, x: f64, y: f64, tolerance: f64) {
    assert!(
        point.distance(&Point::new(x, y)) < tolerance,
        "({:.3}, {:.3}) not within {} of ({}, {})",
        point.x,
        point.y,
        tolerance,
        x,
        y
    );
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
fn test_square_walk_auto_closes() {
    let mut tracer = tracer(simulation(square(0.0)));
    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();

    let (steps, closed) = drain(&events);
    assert!(closed, "loop did not close after {} steps", steps.len());
    assert_eq!(steps.len(), 40);
    assert_eq!(tracer.mapping_state(), Some(SessionState::Completed));

    // Updates arrive in order, each one step longer than the last
    for (i, update) in steps.iter().enumerate() {
        assert_eq!(update.steps as usize, i + 1);
        assert_eq!(update.points.len(), i + 2);
    }
    let last = steps.last().unwrap();
    assert_relative_eq!(last.distance_m, 30.0, epsilon = 1e-6);
    assert_near(last.points[40], 0.0, 0.0, 0.5);

    let wall = tracer.stop_mapping_session().unwrap();
    assert!(wall.is_closed());
    assert_eq!(wall.len(), 5);
    assert_relative_eq!(wall.perimeter(), 30.0, epsilon = 0.5);
    assert_relative_eq!(wall.area(), 56.25, epsilon = 2.0);
    assert!(!tracer.is_mapping());
}

#[test]
fn test_manual_stop_mid_walk() {
    let mut tracer = tracer(simulation(vec![WalkLeg::new(30, 90.0)]));
    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();

    // Take five steps East, then stop by hand
    for _ in 0..5 {
        match events.recv_timeout(EVENT_TIMEOUT) {
            Ok(SessionEvent::Step(_)) => {}
            other => panic!("expected a step, got {:?}", other),
        }
    }
    assert_eq!(tracer.mapping_state(), Some(SessionState::Tracking));

    let wall = tracer.stop_mapping_session().unwrap();
    // Straight out and back collapses to three points
    assert!(wall.is_closed());
    assert!(wall.len() >= 3);
    assert!(wall.points().iter().all(|p| p.y.abs() < 0.5));

    // Whatever was queued before stop drains, then the channel is closed
    let _queued = events.try_iter().count();
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_standing_still_has_no_wall() {
    let config = SimulationConfig {
        idle_ms: 60_000,
        ..simulation(square(0.0))
    };
    let mut tracer = tracer(config);
    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();

    assert!(events.recv_timeout(Duration::from_millis(300)).is_err());
    assert!(matches!(
        tracer.stop_mapping_session(),
        Err(Error::InsufficientPoints { count: 1 })
    ));
}

#[test]
fn test_second_session_starts_fresh() {
    let mut tracer = tracer(simulation(square(0.0)));

    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();
    let (first, _) = drain(&events);
    let first_wall = tracer.stop_mapping_session().unwrap();

    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();
    let (second, _) = drain(&events);
    let second_wall = tracer.stop_mapping_session().unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(second[0].points[0], Point::origin());
    assert_eq!(first_wall.len(), second_wall.len());
}

#[test]
fn test_missing_magnetometer_rejected() {
    let mut config = simulation(square(0.0));
    config.availability.magnetometer = false;
    let mut tracer = tracer(config);

    assert!(matches!(
        tracer.start_mapping_session(SessionConfig::default()),
        Err(Error::Sensor(pada_io::Error::SensorUnavailable(
            pada_io::SensorKind::Magnetometer
        )))
    ));
    assert!(!tracer.is_mapping());
}

#[test]
fn test_flaky_open_recovers() {
    let config = SimulationConfig {
        fail_first_opens: 2,
        ..simulation(square(0.0))
    };
    let mut tracer = tracer(config);
    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();
    let (steps, closed) = drain(&events);
    assert!(closed);
    assert_eq!(steps.len(), 40);
    tracer.stop_mapping_session().unwrap();
}

// ============================================================================
// Calibration
// ============================================================================

#[test]
fn test_calibration_straightens_rotated_square() {
    // The phone's magnetometer reads 30° when the user faces North
    let mut tracer = tracer(simulation(square(30.0)));

    tracer.start_calibration().unwrap();
    let offset = tracer.wait_calibration().unwrap();
    assert!((offset.degrees() - 330.0).abs() < 1.0, "offset {}", offset);

    let events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();
    let (steps, closed) = drain(&events);
    assert!(closed);

    let points = &steps.last().unwrap().points;
    assert_near(points[10], 0.0, 7.5, 0.3);
    assert_near(points[20], 7.5, 7.5, 0.5);
    assert_near(points[30], 7.5, 0.0, 0.5);

    let wall: Wall = tracer.stop_mapping_session().unwrap();
    assert_eq!(wall.len(), 5);
}

#[test]
fn test_calibration_busy_while_mapping() {
    let mut tracer = tracer(simulation(square(0.0)));
    let _events = tracer
        .start_mapping_session(SessionConfig::default())
        .unwrap();

    assert!(matches!(tracer.start_calibration(), Err(Error::Busy(_))));
    let _ = tracer.stop_mapping_session();
    tracer.start_calibration().unwrap();
    tracer.wait_calibration().unwrap();
}

#[test]
fn test_cancelled_calibration_keeps_offset() {
    let config = SimulationConfig {
        speed_factor: 1.0,
        ..simulation(square(45.0))
    };
    let mut tracer = tracer(config);
    tracer.set_calibration_offset(CalibrationOffset::new(12.0));

    tracer.start_calibration().unwrap();
    std::thread::sleep(Duration::from_millis(150));
    tracer.cancel_calibration().unwrap();

    assert_relative_eq!(tracer.calibration_offset().degrees(), 12.0);
    assert!(!tracer.is_calibrating());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_tracer_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rekha.toml");

    let mut config = RekhaConfig::default();
    config.device.simulation = Some(simulation(square(0.0)));
    config.to_file(&path).unwrap();

    let loaded = RekhaConfig::from_file(&path).unwrap();
    let session = SessionConfig::from(&loaded);
    let mut tracer = RoomTracer::from_config(loaded).unwrap();

    let events = tracer.start_mapping_session(session).unwrap();
    let (_, closed) = drain(&events);
    assert!(closed);
    let wall = tracer.stop_mapping_session().unwrap();
    assert_eq!(wall.len(), 5);
}

#[test]
fn test_unknown_device_rejected() {
    let mut config = RekhaConfig::default();
    config.device.device_type = "ble-tag".to_string();
    assert!(matches!(
        RoomTracer::from_config(config),
        Err(Error::Sensor(pada_io::Error::UnknownDevice(_)))
    ));
}
