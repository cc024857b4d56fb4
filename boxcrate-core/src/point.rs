//! Point types and related functionality

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 2D point in canvas or image-plane coordinates
pub type Point2f = Point2<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A point with an RGB color, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint {
    pub position: Point3f,
    pub color: [f32; 3],
}

impl ColoredPoint {
    /// Create a point with an rgb color in [0, 1]
    pub fn new(position: Point3f, color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

impl Default for ColoredPoint {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [1.0, 1.0, 1.0],
        }
    }
}

impl From<Point3f> for ColoredPoint {
    fn from(position: Point3f) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}
