//! Mock device driver for hardware-free walk simulation
//!
//! Simulates a phone carried around a room so the tracing pipeline can be
//! developed and tested without a handset.
//!
//! # Overview
//!
//! | Sensor | Simulation Method |
//! |--------|-------------------|
//! | Accelerometer | Gravity plus one triangular heel-strike pulse per step |
//! | Magnetometer | Horizontal field rotated to the current leg heading |
//! | Gyroscope | Gaussian noise |
//!
//! # Configuration
//!
//! ```toml
//! [device]
//! type = "mock"
//! name = "Simulated phone"
//!
//! [device.simulation]
//! speed_factor = 10.0   # 10x real time
//! random_seed = 42      # 0 = random each run
//!
//! [[device.simulation.legs]]
//! steps = 10
//! heading_deg = 0.0
//! ```
//!
//! # Simulation Loop
//!
//! Simulation time advances by exactly one update interval per tick, so
//! sample timestamps are deterministic. The tick is paced in wall time at
//! `interval / speed_factor`. Every tick emits one sample per available
//! sensor through `try_send`; a full channel drops the sample and counts it.
//!
//! # Thread Model
//!
//! ```text
//! ┌─────────────────┐
//! │  SensorSource   │
//! │     (open)      │
//! └────────┬────────┘
//!          │ spawns
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │  Walker Loop    │────▶│ Sample Channel  │
//! │  (mock-walker)  │     │   (bounded)     │
//! └─────────────────┘     └─────────────────┘
//! ```

pub mod config;
mod noise;
mod walker;

use crate::core::driver::SensorDriver;
use crate::core::types::{SampleSender, SensorAvailability, SensorKind};
use crate::error::{Error, Result};

use config::SimulationConfig;
use noise::NoiseGenerator;
use walker::WalkerSimulator;

use crossbeam_channel::TrySendError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lowest accepted time compression
const MIN_SPEED_FACTOR: f64 = 0.01;

/// Counters shared between the driver and its simulation thread
#[derive(Debug, Default, Clone, Copy)]
struct WalkerStats {
    sent: u64,
    dropped: u64,
}

/// Simulated phone walking a configured route
pub struct SimulatedWalkDriver {
    name: String,
    config: SimulationConfig,
    failed_opens_remaining: u32,
    shutdown: Arc<AtomicBool>,
    stats: Arc<Mutex<WalkerStats>>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedWalkDriver {
    pub fn new(name: impl Into<String>, config: SimulationConfig) -> Self {
        let failed_opens_remaining = config.fail_first_opens;
        Self {
            name: name.into(),
            config,
            failed_opens_remaining,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(WalkerStats::default())),
            handle: None,
        }
    }

    /// Samples delivered to the channel since the last open
    pub fn sent_samples(&self) -> u64 {
        self.stats.lock().sent
    }
}

impl SensorDriver for SimulatedWalkDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&mut self) -> SensorAvailability {
        self.config.availability.into()
    }

    fn open(&mut self, interval: Duration, sender: SampleSender) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::AlreadyRunning);
        }
        if self.failed_opens_remaining > 0 {
            self.failed_opens_remaining -= 1;
            log::debug!(
                "Simulated open failure ({} remaining)",
                self.failed_opens_remaining
            );
            return Err(Error::InitializationFailed(
                "simulated sensor open failure".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(Error::Config("update interval must be positive".to_string()));
        }

        self.shutdown.store(false, Ordering::Relaxed);
        *self.stats.lock() = WalkerStats::default();

        let walker = WalkerSimulator::new(&self.config, NoiseGenerator::new(self.config.random_seed));
        let availability: SensorAvailability = self.config.availability.into();
        let speed_factor = self.config.speed_factor.max(MIN_SPEED_FACTOR);
        let shutdown = Arc::clone(&self.shutdown);
        let stats = Arc::clone(&self.stats);

        let handle = thread::Builder::new()
            .name("mock-walker".to_string())
            .spawn(move || {
                simulation_loop(
                    walker,
                    availability,
                    interval,
                    speed_factor,
                    &shutdown,
                    &stats,
                    sender,
                );
            })
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to spawn walker thread: {}", e))
            })?;

        self.handle = Some(handle);
        log::info!(
            "{} opened: {} steps planned, interval={:?}, speed_factor={}",
            self.name,
            self.config.total_steps(),
            interval,
            speed_factor
        );
        Ok(())
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            let stats = *self.stats.lock();
            log::info!(
                "{} closed: {} samples sent, {} dropped",
                self.name,
                stats.sent,
                stats.dropped
            );
        }
    }

    fn dropped_samples(&self) -> u64 {
        self.stats.lock().dropped
    }
}

impl Drop for SimulatedWalkDriver {
    fn drop(&mut self) {
        self.close();
    }
}

/// Walker simulation loop
fn simulation_loop(
    mut walker: WalkerSimulator,
    availability: SensorAvailability,
    interval: Duration,
    speed_factor: f64,
    shutdown: &AtomicBool,
    stats: &Mutex<WalkerStats>,
    sender: SampleSender,
) {
    let step_us = interval.as_micros() as u64;
    let scaled_interval = Duration::from_secs_f64(interval.as_secs_f64() / speed_factor);
    let kinds: Vec<SensorKind> = SensorKind::ALL
        .into_iter()
        .filter(|kind| availability.has(*kind))
        .collect();

    let mut sim_time_us: u64 = 0;
    let mut reported_finish = false;

    log::debug!("Walker loop started: scaled interval {:?}", scaled_interval);

    while !shutdown.load(Ordering::Relaxed) {
        let tick_start = Instant::now();

        for &kind in &kinds {
            let sample = walker.sample(kind, sim_time_us);
            match sender.try_send(sample) {
                Ok(()) => stats.lock().sent += 1,
                Err(TrySendError::Full(_)) => stats.lock().dropped += 1,
                Err(TrySendError::Disconnected(_)) => {
                    log::debug!("Sample channel closed, walker loop exiting");
                    return;
                }
            }
        }

        if !reported_finish && walker.is_finished(sim_time_us) {
            reported_finish = true;
            log::info!(
                "Simulated walk complete at {:.1}s ({} steps)",
                sim_time_us as f64 / 1e6,
                walker.total_steps()
            );
        }

        sim_time_us += step_us;

        let elapsed = tick_start.elapsed();
        if elapsed < scaled_interval {
            thread::sleep(scaled_interval - elapsed);
        }
    }

    log::debug!("Walker loop terminated");
}
