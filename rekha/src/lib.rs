//! Rekha - room perimeter tracing by pedestrian dead reckoning
//!
//! Walk along the walls of a room holding a phone; every detected step moves
//! the current position one step length along the compass heading. When the
//! walk returns to its start the track is closed, simplified and handed back
//! as a [`Wall`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      bin/                           │  ← Executable
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │       (mapping session, calibration, tracer)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   mapping/                          │  ← Track building
//! │          (position integration, simplify)           │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Sensor processing
//! │        (step detection, heading, calibration)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                (types, math)                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Samples come from `pada-io`, which owns the device drivers.
//!
//! # Frame
//!
//! Headings are compass degrees in [0, 360): 0° is North (+y), 90° is East
//! (+x). A step of length `L` at heading `θ` moves by `(L sin θ, L cos θ)`.
//!
//! # Example
//!
//! ```no_run
//! use rekha::{RekhaConfig, RoomTracer, SessionConfig, SessionEvent};
//!
//! # fn main() -> rekha::Result<()> {
//! let config = RekhaConfig::default();
//! let mut tracer = RoomTracer::from_config(config.clone())?;
//!
//! let events = tracer.start_mapping_session(SessionConfig::from(&config))?;
//! for event in events.iter() {
//!     match event {
//!         SessionEvent::Step(update) => println!("{} steps", update.steps),
//!         SessionEvent::LoopClosed | SessionEvent::Fault(_) => break,
//!     }
//! }
//! let wall = tracer.stop_mapping_session()?;
//! println!("perimeter {:.2} m", wall.perimeter());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod sensors;

pub use config::RekhaConfig;
pub use core::types::{CalibrationOffset, HeadingEstimate, Point, StepEvent, StepUpdate, Wall};
pub use engine::{
    CalibrationHandle, MappingSession, RoomTracer, SessionConfig, SessionEvent, SessionState,
};
pub use error::{Error, Result};
pub use mapping::{MappingProcessor, TrackState, simplify};
pub use sensors::{CalibrationSession, HeadingEstimator, StepDetector};
