//! Oriented 3D bounding boxes used as annotation units
//!
//! A box is centered at `center`, extends `width` along its local x axis,
//! `height` along local y and `depth` along local z, and is rotated by
//! `rotation` radians about the vertical (z) axis.

use crate::error::{Error, Result};
use crate::point::*;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::TAU;

/// Identifier of a box within the active set
pub type BoxId = u64;

/// An oriented annotation box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub id: BoxId,
    pub center: Point3f,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub rotation: f32,
    pub attribute: Option<String>,
    pub valid: bool,
}

/// Per-axis deltas added to a box's dimensions before filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxPadding {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxPadding {
    /// The same delta on every axis
    pub fn uniform(delta: f32) -> Self {
        Self {
            width: delta,
            height: delta,
            depth: delta,
        }
    }
}

/// Wrap an angle into `[0, 2π)`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

impl OrientedBox {
    /// Create a valid, unrotated box without an attribute
    pub fn new(id: BoxId, center: Point3f, width: f32, height: f32, depth: f32) -> Self {
        Self {
            id,
            center,
            width,
            height,
            depth,
            rotation: 0.0,
            attribute: None,
            valid: true,
        }
    }

    /// Builder-style rotation setter
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.set_rotation(rotation);
        self
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Set the rotation, wrapped into `[0, 2π)`
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = wrap_angle(rotation);
    }

    /// Dimensions as (width, height, depth)
    pub fn dimensions(&self) -> Vector3f {
        Vector3f::new(self.width, self.height, self.depth)
    }

    /// Half of each dimension
    pub fn half_extents(&self) -> Vector3f {
        self.dimensions() * 0.5
    }

    /// Check that every dimension is finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let dims = [("width", self.width), ("height", self.height), ("depth", self.depth)];
        for (name, value) in dims {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidData(format!(
                    "box {} has invalid {}: {}",
                    self.id, name, value
                )));
            }
        }
        if !self.center.coords.iter().all(|c| c.is_finite()) || !self.rotation.is_finite() {
            return Err(Error::InvalidData(format!(
                "box {} has a non-finite pose",
                self.id
            )));
        }
        Ok(())
    }

    /// Map box-local coordinates into world space: rotate about z, then
    /// translate to the center.
    pub fn model_transform(&self) -> Transform3D {
        Transform3D::translation(self.center.coords) * Transform3D::rotation_z(self.rotation)
    }

    /// Map world coordinates into the box-local frame
    pub fn inverse_model_transform(&self) -> Transform3D {
        Transform3D::rotation_z(-self.rotation) * Transform3D::translation(-self.center.coords)
    }

    /// A copy with the padding deltas added to the dimensions
    pub fn padded(&self, padding: &BoxPadding) -> Self {
        Self {
            width: self.width + padding.width,
            height: self.height + padding.height,
            depth: self.depth + padding.depth,
            ..self.clone()
        }
    }

    /// The vertical interval `[center.z - depth/2, center.z + depth/2]`
    pub fn z_range(&self) -> (f32, f32) {
        let half = self.depth * 0.5;
        (self.center.z - half, self.center.z + half)
    }

    /// The box's footprint in its local x/y plane, in top-face winding order
    pub fn local_footprint(&self) -> [[f32; 2]; 4] {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        [[hw, hh], [hw, -hh], [-hw, -hh], [-hw, hh]]
    }
}

/// The set of boxes currently being annotated, keyed by id
#[derive(Debug, Clone, Default)]
pub struct BoxSet {
    boxes: BTreeMap<BoxId, OrientedBox>,
}

impl BoxSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new box; ids must be unique within the set
    pub fn insert(&mut self, bbox: OrientedBox) -> Result<()> {
        if self.boxes.contains_key(&bbox.id) {
            return Err(Error::DuplicateId(bbox.id));
        }
        self.boxes.insert(bbox.id, bbox);
        Ok(())
    }

    /// Look up a box by id
    pub fn get(&self, id: BoxId) -> Option<&OrientedBox> {
        self.boxes.get(&id)
    }

    /// Mutable access for in-place edits during drags
    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut OrientedBox> {
        self.boxes.get_mut(&id)
    }

    /// Remove a box, returning it if it was present
    pub fn remove(&mut self, id: BoxId) -> Option<OrientedBox> {
        self.boxes.remove(&id)
    }

    /// Number of boxes in the set
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the set holds no boxes
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Iterate in id order
    pub fn iter(&self) -> impl Iterator<Item = &OrientedBox> {
        self.boxes.values()
    }

    /// Smallest id not yet used
    pub fn next_id(&self) -> BoxId {
        self.boxes.keys().next_back().map_or(0, |id| id + 1)
    }
}
