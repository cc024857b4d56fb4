//! Sensor calibration adapter
//!
//! External calibrations come as a (P, R, T) triple of row-major matrices:
//! a 3×4 camera projection `P`, a 3×3 rectifying rotation `R` and a 3×4
//! sensor-to-camera transform `T`. They are embedded into 4×4 homogeneous
//! matrices and composed so a single matrix maps sensor points onto the image
//! plane.

use boxcrate_core::{Error, Point2f, Point3f, PointBuffer, Result};
use nalgebra::{Matrix3, Matrix3x4, Matrix4};
use serde::{Deserialize, Serialize};

/// An external (P, R, T) calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTriple {
    pub p: Matrix3x4<f32>,
    pub r: Matrix3<f32>,
    pub t: Matrix3x4<f32>,
}

impl CalibrationTriple {
    /// Create a triple from already-shaped matrices
    pub fn new(p: Matrix3x4<f32>, r: Matrix3<f32>, t: Matrix3x4<f32>) -> Self {
        Self { p, r, t }
    }

    /// Build the triple from row-major slices of 12, 9 and 12 values
    pub fn from_row_slices(p: &[f32], r: &[f32], t: &[f32]) -> Result<Self> {
        check_len("P", p, 12)?;
        check_len("R", r, 9)?;
        check_len("T", t, 12)?;

        Ok(Self {
            p: Matrix3x4::from_row_slice(p),
            r: Matrix3::from_row_slice(r),
            t: Matrix3x4::from_row_slice(t),
        })
    }

    /// The composed sensor → image matrix, see [`compose`]
    pub fn compose(&self) -> Matrix4<f32> {
        compose(self)
    }
}

fn check_len(name: &str, values: &[f32], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(Error::InvalidData(format!(
            "calibration matrix {} needs {} values, got {}",
            name,
            expected,
            values.len()
        )));
    }
    Ok(())
}

/// Embed a 3×4 matrix by appending the row `[0 0 0 1]`
pub fn embed_3x4(m: &Matrix3x4<f32>) -> Matrix4<f32> {
    let mut out = Matrix4::identity();
    out.fixed_view_mut::<3, 4>(0, 0).copy_from(m);
    out
}

/// Embed a 3×3 matrix as the linear part of a homogeneous transform
pub fn embed_3x3(m: &Matrix3<f32>) -> Matrix4<f32> {
    m.to_homogeneous()
}

/// Compose a calibration triple into one 4×4 matrix.
///
/// Starting from `T`, each matrix is pre-multiplied in turn, giving
/// `P · R · T`: sensor points are moved into the camera frame, rectified,
/// then projected.
pub fn compose(calibration: &CalibrationTriple) -> Matrix4<f32> {
    let mut m = embed_3x4(&calibration.t);
    m = embed_3x3(&calibration.r) * m;
    m = embed_3x4(&calibration.p) * m;
    m
}

/// Project a point through a composed calibration matrix.
///
/// Points with homogeneous depth `z <= 0` lie behind the camera and yield
/// `None`; they must be dropped, not clamped.
pub fn project(point: &Point3f, composed: &Matrix4<f32>) -> Option<Point2f> {
    let h = composed * point.to_homogeneous();
    if !(h.z > 0.0) {
        return None;
    }

    let projected = Point2f::new(h.x / h.z, h.y / h.z);
    if projected.x.is_finite() && projected.y.is_finite() {
        Some(projected)
    } else {
        None
    }
}

/// Points of a buffer that landed in front of the camera
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPoints {
    /// Index of each projected point in the source buffer
    pub indices: Vec<usize>,
    pub pixels: Vec<Point2f>,
}

impl ProjectedPoints {
    /// Number of points that landed in front of the camera
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no point was projected
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Project every point of a buffer, dropping those behind the camera
pub fn project_buffer(buffer: &PointBuffer, composed: &Matrix4<f32>) -> ProjectedPoints {
    let mut out = ProjectedPoints::default();
    for (i, &[x, y, z]) in buffer.position_triples().iter().enumerate() {
        if let Some(pixel) = project(&Point3f::new(x, y, z), composed) {
            out.indices.push(i);
            out.pixels.push(pixel);
        }
    }
    log::trace!("projected {} of {} points", out.len(), buffer.len());
    out
}
