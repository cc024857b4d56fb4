//! 3D transformation utilities
//!
//! Every transform in boxcrate is a 4×4 homogeneous matrix so that model,
//! view, projection and viewport transforms compose by multiplication.
//! Matrices follow the column-vector convention: `b.matrix * a.matrix`
//! applies `a` first.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A 3D transformation that can be applied to points and point buffers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation about the world z axis
    pub fn rotation_z(angle: f32) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous(),
        }
    }

    /// Rotation about the vertical axis through `center`.
    ///
    /// Equivalent to translating `center` to the origin, rotating, and
    /// translating back.
    pub fn rotation_z_about(center: &Point3<f32>, angle: f32) -> Self {
        let to_origin = Self::translation(-center.coords);
        let back = Self::translation(center.coords);
        back * Self::rotation_z(angle) * to_origin
    }

    /// Apply the transformation to a point (affine transforms)
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the full homogeneous matrix, without the perspective divide
    pub fn transform_homogeneous(&self, point: &Point3<f32>) -> Vector4<f32> {
        self.matrix * point.to_homogeneous()
    }

    /// Apply the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Compose this transformation with another; `other` is applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Apply this transformation, then `next`
    pub fn then(self, next: Self) -> Self {
        next.compose(self)
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}
