//! Core data structures for boxcrate
//! 
//! This crate provides the fundamental types shared by the projection,
//! filtering and caching crates: colored points, dense point buffers,
//! oriented annotation boxes and homogeneous transforms.

pub mod point;
pub mod point_buffer;
pub mod oriented_box;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_buffer::*;
pub use oriented_box::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector2, Vector3, Matrix3, Matrix4};
