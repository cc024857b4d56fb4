//! Region filter: which points lie inside an oriented box
//!
//! The filter works on the flattened request/response records that cross the
//! background-task boundary, so the same code runs inline and on a worker.

use boxcrate_core::{BoxPadding, Error, OrientedBox, Point3f, PointBuffer, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Below this many points the filter runs sequentially
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Pose of the box being filtered against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxParams {
    pub center: Point3f,
    pub rotation: f32,
}

/// Input of one background filter task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub box_params: BoxParams,
    pub z_min: f32,
    pub z_max: f32,
    /// Box footprint in the box-local x/y plane
    pub footprint: Vec<[f32; 2]>,
    pub position: Vec<f32>,
    pub color: Vec<f32>,
}

/// Output of one background filter task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    pub position: Vec<f32>,
    pub color: Vec<f32>,
    pub count: u32,
}

impl FilterRequest {
    /// Flatten a (padded) box and a point buffer into a request
    pub fn new(bbox: &OrientedBox, padding: &BoxPadding, buffer: &PointBuffer) -> Self {
        let padded = bbox.padded(padding);
        let (z_min, z_max) = padded.z_range();
        Self {
            box_params: BoxParams {
                center: padded.center,
                rotation: padded.rotation,
            },
            z_min,
            z_max,
            footprint: padded.local_footprint().to_vec(),
            position: buffer.positions().to_vec(),
            color: buffer.colors().to_vec(),
        }
    }
}

impl FilterResponse {
    /// Convert the flattened arrays back into a point buffer
    pub fn into_buffer(self) -> Result<PointBuffer> {
        PointBuffer::new(self.position, self.color)
    }
}

/// Distance within which a point counts as lying on a polygon edge
const EDGE_TOLERANCE: f32 = 1e-5;

fn on_segment(x: f32, y: f32, [ax, ay]: [f32; 2], [bx, by]: [f32; 2]) -> bool {
    let (dx, dy) = (bx - ax, by - ay);
    let (px, py) = (x - ax, y - ay);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return px * px + py * py <= EDGE_TOLERANCE * EDGE_TOLERANCE;
    }
    let cross = dx * py - dy * px;
    let along = px * dx + py * dy;
    cross * cross <= EDGE_TOLERANCE * EDGE_TOLERANCE * length_sq && along >= 0.0 && along <= length_sq
}

/// Even-odd point-in-polygon test. Points on an edge or vertex are inside.
pub fn point_in_polygon(x: f32, y: f32, polygon: &[[f32; 2]]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, &[xi, yi]) in polygon.iter().enumerate() {
        let [xj, yj] = polygon[j];
        if on_segment(x, y, polygon[j], polygon[i]) {
            return true;
        }
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Run a filter request to completion
pub fn process_request(request: &FilterRequest) -> Result<FilterResponse> {
    if request.position.len() % 3 != 0 || request.color.len() != request.position.len() {
        return Err(Error::InvalidData(format!(
            "filter request has {} position values and {} color values",
            request.position.len(),
            request.color.len()
        )));
    }

    let BoxParams { center, rotation } = request.box_params;
    let (sin, cos) = (-rotation).sin_cos();
    let footprint = request.footprint.as_slice();

    let inside = |i: usize| -> bool {
        let x = request.position[3 * i] - center.x;
        let y = request.position[3 * i + 1] - center.y;
        let z = request.position[3 * i + 2];
        if z < request.z_min || z > request.z_max {
            return false;
        }
        let local_x = cos * x - sin * y;
        let local_y = sin * x + cos * y;
        point_in_polygon(local_x, local_y, footprint)
    };

    let n = request.position.len() / 3;
    let indices: Vec<usize> = if n < PARALLEL_THRESHOLD {
        (0..n).filter(|&i| inside(i)).collect()
    } else {
        (0..n).into_par_iter().filter(|&i| inside(i)).collect()
    };

    let mut response = FilterResponse {
        position: Vec::with_capacity(indices.len() * 3),
        color: Vec::with_capacity(indices.len() * 3),
        count: indices.len() as u32,
    };
    for i in indices {
        response.position.extend_from_slice(&request.position[3 * i..3 * i + 3]);
        response.color.extend_from_slice(&request.color[3 * i..3 * i + 3]);
    }
    Ok(response)
}

/// Filter a buffer down to the points inside a (padded) box, on the calling
/// thread. Use [`crate::FilterWorker`] to keep interactive threads free.
pub fn filter_points_in_box(bbox: &OrientedBox, padding: &BoxPadding, buffer: &PointBuffer) -> Result<FilterResponse> {
    process_request(&FilterRequest::new(bbox, padding, buffer))
}
