//! Core foundation layer.
//!
//! Bottom layer with no internal dependencies.
//!
//! # Contents
//!
//! - [`types`]: Points, walls, headings, step events
//! - [`math`]: Compass angle arithmetic

pub mod math;
pub mod types;
