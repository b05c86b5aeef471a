//! Orchestration layer.
//!
//! Threads that own the sensor stream while an operation runs, and the
//! [`RoomTracer`] façade that hands the sensors between them.
//!
//! - [`session`]: Live mapping session (`rekha-mapping` thread)
//! - [`calibration`]: Timed compass calibration (`rekha-calibration` thread)
//! - [`tracer`]: Exclusive sensor ownership and the calibration offset

pub mod calibration;
pub mod session;
pub mod tracer;

pub use calibration::CalibrationHandle;
pub use session::{MappingSession, SessionConfig, SessionEvent, SessionState, StartError};
pub use tracer::RoomTracer;
