//! Z-axis visibility cutoff

use boxcrate_core::{PointBuffer, Result};

/// Per-point visibility against a movable z threshold: 1.0 for points at or
/// below `z_threshold`, 0.0 for points above it.
pub fn filter_z_axis_points(buffer: &PointBuffer, z_threshold: f32) -> Vec<f32> {
    buffer
        .position_triples()
        .iter()
        .map(|&[_, _, z]| if z <= z_threshold { 1.0 } else { 0.0 })
        .collect()
}

/// Write the cutoff flags into the buffer's visibility attribute
pub fn apply_z_cutoff(buffer: &mut PointBuffer, z_threshold: f32) -> Result<()> {
    let flags = filter_z_axis_points(buffer, z_threshold);
    buffer.set_visibility(flags)
}
