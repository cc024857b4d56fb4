//! Point cloud I/O for boxcrate
//!
//! This crate provides the sources point clouds are decoded from, a reader
//! for XYZ/CSV text clouds, a reader for KITTI-style calibration files and
//! the deduplicating [`PointCache`] shared by everything that loads clouds.

pub mod source;
pub mod xyz;
pub mod calibration;
pub mod cache;

pub use source::*;
pub use xyz::{read_xyz, parse_xyz, ColumnType, Delimiter, XyzSchema};
pub use calibration::{read_calibration, parse_calibration, CalibrationKeys};
pub use cache::*;
