//! Spatial filtering of point buffers
//!
//! This crate answers which points of a buffer lie inside an annotation
//! box, either synchronously or on a background worker, and computes the
//! per-point visibility flags used for z-axis cutoffs.

pub mod region;
pub mod visibility;
pub mod worker;

pub use region::*;
pub use visibility::*;
pub use worker::*;
