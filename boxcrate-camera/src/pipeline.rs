//! Composed world → canvas transform

use boxcrate_core::{Point2f, Point3f, PointBuffer};
use nalgebra::{Matrix4, Vector4};

use crate::camera::Camera;
use crate::viewport::Canvas;

/// View, projection and viewport matrices of one camera/canvas pair,
/// together with their composition and its inverse.
///
/// Points are transformed by the view matrix first, then projection, then
/// viewport; the perspective divide happens last, which is valid because the
/// viewport transform is affine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPipeline {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub viewport: Matrix4<f32>,
    composed: Matrix4<f32>,
    inverse: Option<Matrix4<f32>>,
}

impl TransformPipeline {
    /// Build the pipeline for a camera rendering onto a canvas
    pub fn new(camera: &Camera, canvas: &Canvas) -> Self {
        Self::from_matrices(
            camera.view_matrix(),
            camera.projection_matrix(),
            canvas.viewport_matrix(),
        )
    }

    /// Build the pipeline from explicit matrices
    pub fn from_matrices(view: Matrix4<f32>, projection: Matrix4<f32>, viewport: Matrix4<f32>) -> Self {
        let composed = viewport * projection * view;
        Self {
            view,
            projection,
            viewport,
            composed,
            inverse: composed.try_inverse(),
        }
    }

    /// `viewport · projection · view`
    pub fn composed(&self) -> &Matrix4<f32> {
        &self.composed
    }

    /// Inverse of the composed matrix, if it is invertible
    pub fn inverse(&self) -> Option<&Matrix4<f32>> {
        self.inverse.as_ref()
    }

    /// Transform a world point into normalized device coordinates
    pub fn world_to_ndc(&self, point: &Point3f) -> Point3f {
        divide(self.projection * self.view * point.to_homogeneous())
    }

    /// Transform a world point into canvas pixels, keeping NDC depth as z
    pub fn world_to_canvas_with_depth(&self, point: &Point3f) -> Point3f {
        divide(self.composed * point.to_homogeneous())
    }

    /// Transform a world point into canvas pixels
    pub fn world_to_canvas(&self, point: &Point3f) -> Point2f {
        let p = self.world_to_canvas_with_depth(point);
        Point2f::new(p.x, p.y)
    }

    /// Map a canvas pixel at the given NDC depth back into world space.
    ///
    /// Returns `None` when the pipeline is not invertible.
    pub fn canvas_to_world(&self, pixel: &Point2f, ndc_depth: f32) -> Option<Point3f> {
        let inverse = self.inverse.as_ref()?;
        Some(divide(inverse * Vector4::new(pixel.x, pixel.y, ndc_depth, 1.0)))
    }

    /// Project every point of a buffer into canvas pixels, returned as a flat
    /// array of 2N coordinates.
    pub fn project_buffer(&self, buffer: &PointBuffer) -> Vec<f32> {
        let mut out = Vec::with_capacity(buffer.len() * 2);
        for &[x, y, z] in buffer.position_triples() {
            let p = divide(self.composed * Vector4::new(x, y, z, 1.0));
            out.push(p.x);
            out.push(p.y);
        }
        out
    }
}

/// Perspective divide. A zero `w` yields non-finite coordinates rather than
/// an error.
fn divide(h: Vector4<f32>) -> Point3f {
    Point3f::new(h.x / h.w, h.y / h.w, h.z / h.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boxcrate_core::Vector3f;

    fn top_down(zoom: f32) -> (Camera, Canvas) {
        let canvas = Canvas::new(200.0, 100.0);
        let camera = Camera::orthographic_for_canvas(&canvas, zoom);
        (camera, canvas)
    }

    #[test]
    fn test_top_down_orthographic_mapping() {
        let (camera, canvas) = top_down(2.0);
        let pipeline = TransformPipeline::new(&camera, &canvas);
        let p = pipeline.world_to_canvas(&Point3f::new(10.0, 5.0, 0.0));
        assert_relative_eq!(p.x, 100.0 + 20.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 50.0 - 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_canvas_to_world_inverts() {
        let (mut camera, canvas) = top_down(1.5);
        camera.update_camera(Point3f::new(3.0, 4.0, 20.0), Point3f::new(3.0, 4.0, 0.0));
        let pipeline = TransformPipeline::new(&camera, &canvas);

        let world = Point3f::new(7.0, -2.0, 1.0);
        let canvas_point = pipeline.world_to_canvas_with_depth(&world);
        let back = pipeline
            .canvas_to_world(&Point2f::new(canvas_point.x, canvas_point.y), canvas_point.z)
            .unwrap();
        assert_relative_eq!(back, world, epsilon = 1e-3);
    }

    #[test]
    fn test_perspective_pipeline_roundtrip() {
        let canvas = Canvas::new(640.0, 480.0);
        let mut camera = Camera::perspective_for_canvas(&canvas, 1.0);
        camera.update_camera(Point3f::new(-8.0, -8.0, 6.0), Point3f::origin());
        camera.up = Vector3f::z();
        camera.set_clip_planes(1.0, 50.0);
        let pipeline = TransformPipeline::new(&camera, &canvas);

        // the look-at target projects onto the canvas center
        let center = pipeline.world_to_canvas(&Point3f::origin());
        assert_relative_eq!(center.x, 320.0, epsilon = 1e-3);
        assert_relative_eq!(center.y, 240.0, epsilon = 1e-3);

        let world = Point3f::new(1.0, 2.0, 0.5);
        let c = pipeline.world_to_canvas_with_depth(&world);
        let back = pipeline.canvas_to_world(&Point2f::new(c.x, c.y), c.z).unwrap();
        assert_relative_eq!(back, world, epsilon = 1e-2);
    }

    #[test]
    fn test_project_buffer_matches_single_points() {
        let (camera, canvas) = top_down(1.0);
        let pipeline = TransformPipeline::new(&camera, &canvas);
        let buffer = PointBuffer::new(vec![1.0, 1.0, 0.0, -3.0, 2.0, 1.0], vec![0.0; 6]).unwrap();

        let flat = pipeline.project_buffer(&buffer);
        assert_eq!(flat.len(), 4);
        for i in 0..buffer.len() {
            let p = pipeline.world_to_canvas(&buffer.position(i));
            assert_relative_eq!(flat[2 * i], p.x);
            assert_relative_eq!(flat[2 * i + 1], p.y);
        }
    }
}
