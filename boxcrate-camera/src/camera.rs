//! Camera parameters and the matrices derived from them

use boxcrate_core::{CameraKind, Error, Point3f, Result, Vector3f};
use nalgebra::{Isometry3, Matrix4, Orthographic3, Perspective3};
use serde::{Deserialize, Serialize};

use crate::viewport::Canvas;

/// Distance of the canonical top-down camera above the origin
pub const DEFAULT_DISTANCE: f32 = 10.0;

/// Default near clip plane
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clip plane
pub const DEFAULT_FAR: f32 = 1000.0;

/// Projection parameters of a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
        zoom: f32,
    },
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Which kind of camera these parameters describe
    pub fn kind(&self) -> CameraKind {
        match self {
            Projection::Orthographic { .. } => CameraKind::Orthographic,
            Projection::Perspective { .. } => CameraKind::Perspective,
        }
    }

    /// Clip-space matrix (OpenGL convention: near maps to -1, far to +1).
    ///
    /// Panics in nalgebra on a degenerate frustum, such as `near == far` or
    /// a zero aspect ratio.
    pub fn matrix(&self) -> Matrix4<f32> {
        match *self {
            Projection::Orthographic { left, right, top, bottom, near, far, zoom } => {
                Orthographic3::new(left / zoom, right / zoom, bottom / zoom, top / zoom, near, far).into_inner()
            }
            Projection::Perspective { fov, aspect, near, far } => Perspective3::new(aspect, fov, near, far).into_inner(),
        }
    }
}

/// Where a camera sits and what it looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
}

/// A camera for viewing point clouds and annotation boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub projection: Projection,
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
}

impl Camera {
    /// Create a new camera
    pub fn new(projection: Projection, position: Point3f, target: Point3f, up: Vector3f) -> Self {
        Self {
            projection,
            position,
            target,
            up,
        }
    }

    /// Orthographic camera whose frustum spans the canvas in pixels, so
    /// that one world unit covers `zoom` pixels.
    pub fn orthographic_for_canvas(canvas: &Canvas, zoom: f32) -> Self {
        let projection = Projection::Orthographic {
            left: -canvas.width / 2.0,
            right: canvas.width / 2.0,
            top: canvas.height / 2.0,
            bottom: -canvas.height / 2.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            zoom,
        };
        let mut camera = Self::new(projection, Point3f::origin(), Point3f::origin(), Vector3f::y());
        camera.reset_camera();
        camera
    }

    /// Perspective camera matching the canvas aspect ratio
    pub fn perspective_for_canvas(canvas: &Canvas, fov: f32) -> Self {
        let projection = Projection::Perspective {
            fov,
            aspect: canvas.aspect(),
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        };
        let mut camera = Self::new(projection, Point3f::origin(), Point3f::origin(), Vector3f::y());
        camera.reset_camera();
        camera
    }

    /// Whether the camera is orthographic or perspective
    pub fn kind(&self) -> CameraKind {
        self.projection.kind()
    }

    /// The camera's world pose; maps camera space into world space
    pub fn world_pose(&self) -> Matrix4<f32> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up)
            .inverse()
            .to_homogeneous()
    }

    /// Get the view matrix, the inverse of the world pose
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Isometry3::look_at_rh(&self.position, &self.target, &self.up).to_homogeneous()
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix()
    }

    /// Move the camera and re-aim it at `target`.
    ///
    /// If the new view direction is parallel to `up`, a perpendicular up
    /// vector is picked so the view matrix stays finite.
    pub fn update_camera(&mut self, position: Point3f, target: Point3f) {
        self.position = position;
        self.target = target;

        let direction = target - position;
        if direction.cross(&self.up).norm() <= 1e-6 * direction.norm() * self.up.norm() {
            let replacement = if direction.z.abs() >= direction.x.abs().max(direction.y.abs()) {
                Vector3f::y()
            } else {
                Vector3f::z()
            };
            log::debug!("camera up {:?} is parallel to the view direction, using {:?}", self.up, replacement);
            self.up = replacement;
        }
    }

    /// Apply a full pose, including the up vector
    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
        self.up = pose.up;
    }

    /// Restore the canonical top-down pose above the origin
    pub fn reset_camera(&mut self) {
        self.position = Point3f::new(0.0, 0.0, DEFAULT_DISTANCE);
        self.target = Point3f::origin();
        self.up = Vector3f::y();
    }

    /// Set the zoom factor of an orthographic camera
    pub fn set_zoom(&mut self, new_zoom: f32) -> Result<()> {
        match &mut self.projection {
            Projection::Orthographic { zoom, .. } => {
                *zoom = new_zoom;
                Ok(())
            }
            other => Err(mismatch(CameraKind::Orthographic, other.kind())),
        }
    }

    /// Set the frustum bounds of an orthographic camera
    pub fn set_frustum(&mut self, new_left: f32, new_right: f32, new_top: f32, new_bottom: f32) -> Result<()> {
        match &mut self.projection {
            Projection::Orthographic { left, right, top, bottom, .. } => {
                *left = new_left;
                *right = new_right;
                *top = new_top;
                *bottom = new_bottom;
                Ok(())
            }
            other => Err(mismatch(CameraKind::Orthographic, other.kind())),
        }
    }

    /// Set the vertical field of view (radians) of a perspective camera
    pub fn set_fov(&mut self, new_fov: f32) -> Result<()> {
        match &mut self.projection {
            Projection::Perspective { fov, .. } => {
                *fov = new_fov;
                Ok(())
            }
            other => Err(mismatch(CameraKind::Perspective, other.kind())),
        }
    }

    /// Set the aspect ratio of a perspective camera
    pub fn set_aspect(&mut self, new_aspect: f32) -> Result<()> {
        match &mut self.projection {
            Projection::Perspective { aspect, .. } => {
                *aspect = new_aspect;
                Ok(())
            }
            other => Err(mismatch(CameraKind::Perspective, other.kind())),
        }
    }

    /// Set the clip planes; valid for both camera kinds
    pub fn set_clip_planes(&mut self, new_near: f32, new_far: f32) {
        match &mut self.projection {
            Projection::Orthographic { near, far, .. } | Projection::Perspective { near, far, .. } => {
                *near = new_near;
                *far = new_far;
            }
        }
    }
}

fn mismatch(expected: CameraKind, found: CameraKind) -> Error {
    log::debug!("ignoring {} camera mutation on a {} camera", expected, found);
    Error::CameraTypeMismatch { expected, found }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective_for_canvas(&Canvas::new(16.0, 9.0), std::f32::consts::FRAC_PI_4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_is_inverse_of_pose() {
        let mut camera = Camera::default();
        camera.update_camera(Point3f::new(3.0, -4.0, 2.0), Point3f::new(1.0, 1.0, 0.0));
        camera.up = Vector3f::z();
        let product = camera.view_matrix() * camera.world_pose();
        assert_relative_eq!(product, Matrix4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_view_maps_target_onto_negative_z() {
        let mut camera = Camera::default();
        camera.update_camera(Point3f::new(0.0, 0.0, 5.0), Point3f::origin());
        let p = camera.view_matrix().transform_point(&Point3f::origin());
        assert_relative_eq!(p, Point3f::new(0.0, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_up_parallel_to_view_is_replaced() {
        let mut camera = Camera::default();
        camera.up = Vector3f::z();
        camera.update_camera(Point3f::new(2.0, 3.0, 8.0), Point3f::new(2.0, 3.0, 0.0));
        assert_eq!(camera.up, Vector3f::y());

        let view = camera.view_matrix();
        assert!(view.iter().all(|v| v.is_finite()));
        let p = view.transform_point(&Point3f::new(2.0, 3.0, 0.0));
        assert_relative_eq!(p, Point3f::new(0.0, 0.0, -8.0), epsilon = 1e-5);

        // looking along x with an x-aligned up falls back to +z
        camera.up = Vector3f::x();
        camera.update_camera(Point3f::new(-5.0, 0.0, 0.0), Point3f::origin());
        assert_eq!(camera.up, Vector3f::z());
        assert!(camera.view_matrix().iter().all(|v| v.is_finite()));

        // a usable up vector is left alone
        camera.update_camera(Point3f::new(0.0, -5.0, 1.0), Point3f::origin());
        assert_eq!(camera.up, Vector3f::z());
    }

    #[test]
    fn test_reset_camera_is_top_down() {
        let mut camera = Camera::orthographic_for_canvas(&Canvas::new(100.0, 100.0), 3.0);
        camera.update_camera(Point3f::new(1.0, 2.0, 3.0), Point3f::new(4.0, 5.0, 6.0));
        camera.reset_camera();
        assert_eq!(camera.position, Point3f::new(0.0, 0.0, DEFAULT_DISTANCE));
        assert_eq!(camera.target, Point3f::origin());
        assert_eq!(camera.up, Vector3f::y());
    }

    #[test]
    fn test_type_specific_mutators() {
        let mut ortho = Camera::orthographic_for_canvas(&Canvas::new(100.0, 100.0), 1.0);
        let before = ortho.clone();
        let err = ortho.set_fov(1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::CameraTypeMismatch { expected: CameraKind::Perspective, found: CameraKind::Orthographic }
        ));
        assert!(ortho.set_aspect(2.0).is_err());
        assert_eq!(ortho, before);

        ortho.set_zoom(4.0).unwrap();
        assert!(matches!(ortho.projection, Projection::Orthographic { zoom, .. } if zoom == 4.0));

        let mut persp = Camera::default();
        let before = persp.clone();
        assert!(persp.set_zoom(2.0).is_err());
        assert!(persp.set_frustum(-1.0, 1.0, 1.0, -1.0).is_err());
        assert_eq!(persp, before);
        persp.set_fov(0.5).unwrap();
        assert!(matches!(persp.projection, Projection::Perspective { fov, .. } if fov == 0.5));
    }

    #[test]
    fn test_orthographic_zoom_scales_ndc() {
        let canvas = Canvas::new(200.0, 100.0);
        let camera = Camera::orthographic_for_canvas(&canvas, 2.0);
        let m = camera.projection_matrix();
        // 50 world units at zoom 2 reach the right frustum edge
        let p = m.transform_point(&Point3f::new(50.0, 25.0, -1.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_maps_near_and_far() {
        let projection = Projection::Perspective { fov: 1.0, aspect: 1.5, near: 1.0, far: 10.0 };
        let m = projection.matrix();
        let near = m.transform_point(&Point3f::new(0.0, 0.0, -1.0));
        let far = m.transform_point(&Point3f::new(0.0, 0.0, -10.0));
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_maps_near_and_far() {
        let mut camera = Camera::orthographic_for_canvas(&Canvas::new(100.0, 100.0), 1.0);
        camera.set_clip_planes(2.0, 20.0);
        let m = camera.projection_matrix();
        let near = m.transform_point(&Point3f::new(0.0, 0.0, -2.0));
        let far = m.transform_point(&Point3f::new(0.0, 0.0, -20.0));
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }
}
