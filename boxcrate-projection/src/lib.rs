//! Box projection and calibration
//!
//! This crate turns oriented annotation boxes into 2D polygons for the
//! canonical editing views, places perspective cameras around a box, maps 2D
//! face edits back onto box geometry, and projects points through external
//! (P, R, T) sensor calibrations.

pub mod box_projection;
pub mod calibration;

pub use box_projection::*;
pub use calibration::*;
