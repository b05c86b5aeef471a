//! Rekha command line tracer
//!
//! Traces one room on the configured device (the simulated walker by
//! default), prints the resulting wall and optionally saves it.
//!
//! ```bash
//! # Default square walk, 20x faster than real time
//! rekha --speed 20
//!
//! # Calibrate first, custom config, save the outline
//! rekha --config rekha.toml --calibrate --output wall.toml
//! ```

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::RecvTimeoutError;

use rekha::{Error, RekhaConfig, Result, RoomTracer, SessionConfig, SessionEvent, Wall};

/// Trace a room perimeter by dead reckoning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a compass calibration before tracing
    #[arg(long)]
    calibrate: bool,

    /// Simulation speed factor (1.0 = real time); mock device only
    #[arg(long)]
    speed: Option<f64>,

    /// Write the traced wall to this TOML file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Give up if the loop has not closed after this many seconds
    #[arg(long, default_value = "120")]
    timeout: u64,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(2);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} - {}",
            record.level(),
            record.target(),
            record.args()
        )
    })
    .init();

    if let Err(e) = run(&args, config) {
        log::error!("Trace failed: {}", e);
        process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<RekhaConfig> {
    let mut config = match &args.config {
        Some(path) => RekhaConfig::from_file(path)?,
        None => RekhaConfig::default(),
    };

    if let Some(speed) = args.speed {
        apply_speed(&mut config, speed)?;
    }
    Ok(config)
}

#[cfg(feature = "mock")]
fn apply_speed(config: &mut RekhaConfig, speed: f64) -> Result<()> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(Error::Config(format!("speed must be positive, got {}", speed)));
    }
    config
        .device
        .simulation
        .get_or_insert_with(Default::default)
        .speed_factor = speed;
    Ok(())
}

#[cfg(not(feature = "mock"))]
fn apply_speed(_config: &mut RekhaConfig, _speed: f64) -> Result<()> {
    Err(Error::Config(
        "--speed requires the simulated device".to_string(),
    ))
}

fn run(args: &Args, config: RekhaConfig) -> Result<()> {
    let session = SessionConfig::from(&config);
    let mut tracer = RoomTracer::from_config(config)?;

    log::info!("rekha starting");
    log::info!("  Device: {}", tracer.config().device.device_type);
    log::info!("  Step length: {:.2} m", session.step_length_m);
    log::info!("  Update interval: {} ms", session.sensor_update_interval_ms);

    if args.calibrate {
        log::info!("Calibrating, stand still facing North");
        tracer.start_calibration()?;
        let offset = tracer.wait_calibration()?;
        println!("Calibration offset: {}", offset);
    }

    let events = tracer.start_mapping_session(session)?;
    let deadline = Instant::now() + Duration::from_secs(args.timeout);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(SessionEvent::Step(update)) => {
                let position = update.points.last().copied().unwrap_or_default();
                log::info!(
                    "Step {:>3}: ({:6.2}, {:6.2}) heading {:5.1}° distance {:.2} m",
                    update.steps,
                    position.x,
                    position.y,
                    update.heading_deg,
                    update.distance_m
                );
            }
            Ok(SessionEvent::LoopClosed) => {
                log::info!("Back at the start");
                break;
            }
            Ok(SessionEvent::Fault(message)) => {
                log::warn!("Session fault: {}", message);
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Loop not closed after {} s, stopping", args.timeout);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let wall = tracer.stop_mapping_session()?;
    print_wall(&wall);

    if let Some(path) = &args.output {
        fs::write(path, toml::to_string_pretty(&wall)?)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn print_wall(wall: &Wall) {
    println!("Wall ({} points):", wall.len());
    for (i, point) in wall.points().iter().enumerate() {
        println!("  {:>3}: ({:7.2}, {:7.2})", i, point.x, point.y);
    }
    println!("Perimeter: {:.2} m", wall.perimeter());
    println!("Area:      {:.2} m²", wall.area());
}
