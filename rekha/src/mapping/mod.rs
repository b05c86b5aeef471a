//! Mapping layer.
//!
//! # Contents
//!
//! - [`processor`]: Step-by-step position integration and loop closure
//! - [`simplify`]: Douglas-Peucker outline simplification

pub mod processor;
pub mod simplify;

pub use processor::{MappingProcessor, TrackState};
pub use simplify::simplify;
