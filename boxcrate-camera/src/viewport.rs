//! Canvas dimensions and the NDC → pixel viewport transform

use boxcrate_core::Point2f;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// The 2D drawing surface boxes are projected onto, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    /// Create a canvas of `width` × `height` pixels
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Pixel position of the canvas center
    pub fn center(&self) -> Point2f {
        Point2f::new(self.width / 2.0, self.height / 2.0)
    }

    /// Map normalized device coordinates onto canvas pixels.
    ///
    /// x grows to the right and y grows downward; the NDC origin lands on the
    /// canvas center. Depth passes through unchanged.
    pub fn viewport_matrix(&self) -> Matrix4<f32> {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        Matrix4::new(
            hw, 0.0, 0.0, hw,
            0.0, -hh, 0.0, hh,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxcrate_core::Point3f;

    #[test]
    fn test_viewport_corners() {
        let canvas = Canvas::new(200.0, 100.0);
        let m = canvas.viewport_matrix();
        assert_eq!(m.transform_point(&Point3f::origin()), Point3f::new(100.0, 50.0, 0.0));
        assert_eq!(m.transform_point(&Point3f::new(-1.0, 1.0, 0.5)), Point3f::new(0.0, 0.0, 0.5));
        assert_eq!(m.transform_point(&Point3f::new(1.0, -1.0, 0.0)), Point3f::new(200.0, 100.0, 0.0));
    }
}
