//! Dense point buffer storage
//!
//! Points are kept as parallel flat `f32` arrays (xyz positions and rgb
//! colors) so bulk transforms and background filtering can work directly on
//! contiguous memory.

use crate::error::{Error, Result};
use crate::point::*;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};

/// A colored point cloud stored as parallel position/color arrays
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPointBuffer")]
pub struct PointBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
    visibility: Option<Vec<f32>>,
}

/// Unchecked wire form of [`PointBuffer`]
#[derive(Deserialize)]
struct RawPointBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
    #[serde(default)]
    visibility: Option<Vec<f32>>,
}

impl TryFrom<RawPointBuffer> for PointBuffer {
    type Error = Error;

    fn try_from(raw: RawPointBuffer) -> Result<Self> {
        let mut buffer = PointBuffer::new(raw.positions, raw.colors)?;
        if let Some(flags) = raw.visibility {
            buffer.set_visibility(flags)?;
        }
        Ok(buffer)
    }
}

impl PointBuffer {
    /// Create a buffer from flat position and color arrays.
    ///
    /// Both arrays must hold xyz / rgb triples for the same number of points.
    pub fn new(positions: Vec<f32>, colors: Vec<f32>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "position array length {} is not a multiple of 3",
                positions.len()
            )));
        }
        if colors.len() != positions.len() {
            return Err(Error::InvalidData(format!(
                "color array length {} does not match position array length {}",
                colors.len(),
                positions.len()
            )));
        }

        Ok(Self {
            positions,
            colors,
            visibility: None,
        })
    }

    /// Create an empty buffer with room for `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity * 3),
            colors: Vec::with_capacity(capacity * 3),
            visibility: None,
        }
    }

    /// Create a buffer from a list of colored points
    pub fn from_points(points: &[ColoredPoint]) -> Self {
        let mut buffer = Self::with_capacity(points.len());
        for point in points {
            buffer.push(*point);
        }
        buffer
    }

    /// Get the number of points
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a point
    pub fn push(&mut self, point: ColoredPoint) {
        self.positions
            .extend_from_slice(&[point.position.x, point.position.y, point.position.z]);
        self.colors.extend_from_slice(&point.color);
        if let Some(visibility) = self.visibility.as_mut() {
            visibility.push(1.0);
        }
    }

    /// Flat xyz array
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat rgb array
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Positions viewed as xyz triples without copying
    pub fn position_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors viewed as rgb triples without copying
    pub fn color_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Position of the point at `index`
    pub fn position(&self, index: usize) -> Point3f {
        let [x, y, z] = self.position_triples()[index];
        Point3f::new(x, y, z)
    }

    /// Color of the point at `index`
    pub fn color(&self, index: usize) -> [f32; 3] {
        self.color_triples()[index]
    }

    /// Per-point visibility flags, if a cutoff has been applied
    pub fn visibility(&self) -> Option<&[f32]> {
        self.visibility.as_deref()
    }

    /// Attach per-point visibility flags (1.0 visible, 0.0 hidden)
    pub fn set_visibility(&mut self, flags: Vec<f32>) -> Result<()> {
        if flags.len() != self.len() {
            return Err(Error::InvalidData(format!(
                "visibility attribute has {} entries for {} points",
                flags.len(),
                self.len()
            )));
        }
        self.visibility = Some(flags);
        Ok(())
    }

    /// Drop the visibility attribute
    pub fn clear_visibility(&mut self) {
        self.visibility = None;
    }

    /// Iterate over the points
    pub fn iter(&self) -> impl Iterator<Item = ColoredPoint> + '_ {
        self.position_triples()
            .iter()
            .zip(self.color_triples())
            .map(|(&[x, y, z], &color)| ColoredPoint::new(Point3f::new(x, y, z), color))
    }

    /// Copy the points at the given indices into a new buffer
    pub fn select(&self, indices: &[usize]) -> Self {
        let positions = self.position_triples();
        let colors = self.color_triples();
        let mut out = Self::with_capacity(indices.len());
        for &i in indices {
            out.positions.extend_from_slice(&positions[i]);
            out.colors.extend_from_slice(&colors[i]);
        }
        out
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let first = self.position(0);
        let mut min = first;
        let mut max = first;

        for &[x, y, z] in self.position_triples() {
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);

            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        }

        (min, max)
    }

    /// Return a copy with every position transformed; colors are kept
    pub fn transformed(&self, transform: &Transform3D) -> Self {
        let mut positions = Vec::with_capacity(self.positions.len());
        for &[x, y, z] in self.position_triples() {
            let p = transform.transform_point(&Point3f::new(x, y, z));
            positions.extend_from_slice(&[p.x, p.y, p.z]);
        }

        Self {
            positions,
            colors: self.colors.clone(),
            visibility: self.visibility.clone(),
        }
    }

    /// Consume the buffer, returning the flat position and color arrays
    pub fn into_arrays(self) -> (Vec<f32>, Vec<f32>) {
        (self.positions, self.colors)
    }
}

impl FromIterator<ColoredPoint> for PointBuffer {
    fn from_iter<I: IntoIterator<Item = ColoredPoint>>(iter: I) -> Self {
        let mut buffer = Self::default();
        for point in iter {
            buffer.push(point);
        }
        buffer
    }
}

impl Extend<ColoredPoint> for PointBuffer {
    fn extend<I: IntoIterator<Item = ColoredPoint>>(&mut self, iter: I) {
        for point in iter {
            self.push(point);
        }
    }
}
