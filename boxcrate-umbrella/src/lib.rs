//! # boxcrate
//!
//! Geometry core for annotating point clouds with 3D bounding boxes.
//!
//! This is the umbrella crate that re-exports the individual boxcrate crates.
//! Use it to get everything in one place, or depend on the individual crates
//! for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: points, point buffers, oriented boxes and transforms
//! - **Camera**: orthographic/perspective cameras and the world → canvas pipeline
//! - **Projection**: canonical box views, face edits and sensor calibrations
//! - **Filtering**: region and z-cutoff filters, background filter worker
//! - **I/O**: point cloud sources, XYZ/CSV and calibration readers, the point cache
//!
//! ## Quick Start
//!
//! ```rust
//! use boxcrate::prelude::*;
//!
//! let bbox = OrientedBox::new(0, Point3f::origin(), 4.0, 2.0, 2.0);
//! let top = project_box(&bbox, CanonicalView::Top, &Canvas::new(200.0, 200.0));
//! assert_eq!(top.zoom, 25.0);
//!
//! let cloud: PointBuffer = [Point3f::new(0.5, 0.5, 0.0), Point3f::new(5.0, 0.0, 0.0)]
//!     .into_iter()
//!     .map(ColoredPoint::from)
//!     .collect();
//! let inside = filter_points_in_box(&bbox, &BoxPadding::default(), &cloud).unwrap();
//! assert_eq!(inside.count, 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: enables every crate
//! - `camera`: camera model and transform pipeline
//! - `projection`: box projection and calibration (implies `camera`)
//! - `filtering`: region and visibility filters
//! - `io`: sources, readers and the point cache (implies `projection`)
//! - `all`: enables all features

// Re-export core functionality
pub use boxcrate_core::*;

// Re-export sub-crates
#[cfg(feature = "camera")]
pub use boxcrate_camera as camera;

#[cfg(feature = "projection")]
pub use boxcrate_projection as projection;

#[cfg(feature = "filtering")]
pub use boxcrate_filtering as filtering;

#[cfg(feature = "io")]
pub use boxcrate_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use boxcrate_core::*;

    #[cfg(feature = "camera")]
    pub use boxcrate_camera::{Camera, CameraPose, Canvas, Projection, TransformPipeline};

    #[cfg(feature = "projection")]
    pub use boxcrate_projection::{
        box_from_edit, camera_vector_for, project_box, BoxProjection, CalibrationTriple, CanonicalView,
        FaceEdit, PerspectiveView, ViewConfig,
    };

    #[cfg(feature = "filtering")]
    pub use boxcrate_filtering::{
        apply_z_cutoff, filter_points_in_box, filter_z_axis_points, FilterResponse, FilterWorker,
        LatestResults, WorkerConfig,
    };

    #[cfg(feature = "io")]
    pub use boxcrate_io::{CacheConfig, FnSource, PointCache, PointCloudSource, XyzSource};
}
