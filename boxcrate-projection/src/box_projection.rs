//! Box projection engine
//!
//! Projects one face of an oriented box onto the canvas for the canonical
//! Top, Side and Back editing views, and maps edits of that face back onto
//! the box.
//!
//! Face corners are always listed as (+H,+V) (+H,−V) (−H,−V) (−H,+V), where
//! H and V are the face's horizontal and vertical local axes:
//!
//! | view | face      | H       | V       |
//! |------|-----------|---------|---------|
//! | Top  | z = +d/2  | local x | local y |
//! | Side | y = −h/2  | local x | local z |
//! | Back | x = −w/2  | local y | local z |

use boxcrate_camera::{Camera, CameraPose, Canvas, TransformPipeline, DEFAULT_DISTANCE};
use boxcrate_core::{OrientedBox, Point2f, Point3f, Transform3D, Vector3f};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// The orthographic views used to edit a box in 2D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalView {
    Top,
    Side,
    Back,
}

impl CanonicalView {
    pub const ALL: [CanonicalView; 3] = [CanonicalView::Top, CanonicalView::Side, CanonicalView::Back];

    /// The face's horizontal and vertical axes in the box-local frame
    pub fn face_axes(&self) -> (Vector3f, Vector3f) {
        match self {
            CanonicalView::Top => (Vector3f::x(), Vector3f::y()),
            CanonicalView::Side => (Vector3f::x(), Vector3f::z()),
            CanonicalView::Back => (Vector3f::y(), Vector3f::z()),
        }
    }

    /// Horizontal and vertical extents of the face
    pub fn face_extents(&self, bbox: &OrientedBox) -> (f32, f32) {
        match self {
            CanonicalView::Top => (bbox.width, bbox.height),
            CanonicalView::Side => (bbox.width, bbox.depth),
            CanonicalView::Back => (bbox.height, bbox.depth),
        }
    }

    /// Box-local corners of the face in fixed winding order
    pub fn corners(&self, bbox: &OrientedBox) -> [Point3f; 4] {
        match self {
            CanonicalView::Top => top_corners(bbox),
            CanonicalView::Side => side_corners(bbox),
            CanonicalView::Back => back_corners(bbox),
        }
    }

    /// Orthographic camera pose looking at the face.
    ///
    /// The Top camera keeps world +y as up so the box rotation stays visible;
    /// the Side and Back cameras turn with the box.
    pub fn camera_pose(&self, bbox: &OrientedBox) -> CameraPose {
        let distance = DEFAULT_DISTANCE + bbox.width.max(bbox.height).max(bbox.depth);
        let rotate = Transform3D::rotation_z(bbox.rotation);
        let (offset, up) = match self {
            CanonicalView::Top => (Vector3f::new(0.0, 0.0, distance), Vector3f::y()),
            CanonicalView::Side => (rotate.transform_vector(&Vector3f::new(0.0, -distance, 0.0)), Vector3f::z()),
            CanonicalView::Back => (rotate.transform_vector(&Vector3f::new(-distance, 0.0, 0.0)), Vector3f::z()),
        };

        CameraPose {
            position: bbox.center + offset,
            target: bbox.center,
            up,
        }
    }
}

/// Corners of the top face, box-local
pub fn top_corners(bbox: &OrientedBox) -> [Point3f; 4] {
    let e = bbox.half_extents();
    [
        Point3f::new(e.x, e.y, e.z),
        Point3f::new(e.x, -e.y, e.z),
        Point3f::new(-e.x, -e.y, e.z),
        Point3f::new(-e.x, e.y, e.z),
    ]
}

/// Corners of the side face, box-local
pub fn side_corners(bbox: &OrientedBox) -> [Point3f; 4] {
    let e = bbox.half_extents();
    [
        Point3f::new(e.x, -e.y, e.z),
        Point3f::new(e.x, -e.y, -e.z),
        Point3f::new(-e.x, -e.y, -e.z),
        Point3f::new(-e.x, -e.y, e.z),
    ]
}

/// Corners of the back face, box-local
pub fn back_corners(bbox: &OrientedBox) -> [Point3f; 4] {
    let e = bbox.half_extents();
    [
        Point3f::new(-e.x, e.y, e.z),
        Point3f::new(-e.x, e.y, -e.z),
        Point3f::new(-e.x, -e.y, -e.z),
        Point3f::new(-e.x, -e.y, e.z),
    ]
}

/// Suggested zoom for every canonical view: `min(cw / width, ch / height) / 2`.
///
/// The box footprint sets the scale, so switching between views of the same
/// box keeps one zoom.
pub fn fit_zoom(bbox: &OrientedBox, canvas: &Canvas) -> f32 {
    (canvas.width / bbox.width).min(canvas.height / bbox.height) / 2.0
}

/// A projected box face
#[derive(Debug, Clone, PartialEq)]
pub struct BoxProjection {
    pub view: CanonicalView,
    /// Canvas-space corners in the view's winding order
    pub polygon: [Point2f; 4],
    /// NDC depth of each corner, needed to unproject edits
    pub depths: [f32; 4],
    pub zoom: f32,
    pub pipeline: TransformPipeline,
}

/// Project one face of `bbox` onto the canvas.
///
/// Corners go through the box model transform and then the view, projection
/// and viewport transforms of an orthographic camera aimed at the face.
/// Callers should validate box dimensions first: a zero width or height
/// produces an infinite zoom.
pub fn project_box(bbox: &OrientedBox, view: CanonicalView, canvas: &Canvas) -> BoxProjection {
    let zoom = fit_zoom(bbox, canvas);

    let mut camera = Camera::orthographic_for_canvas(canvas, zoom);
    camera.apply_pose(&view.camera_pose(bbox));
    let pipeline = TransformPipeline::new(&camera, canvas);

    let model = bbox.model_transform();
    let mut polygon = [Point2f::origin(); 4];
    let mut depths = [0.0; 4];
    for (i, corner) in view.corners(bbox).iter().enumerate() {
        let p = pipeline.world_to_canvas_with_depth(&model.transform_point(corner));
        polygon[i] = Point2f::new(p.x, p.y);
        depths[i] = p.z;
    }

    BoxProjection {
        view,
        polygon,
        depths,
        zoom,
        pipeline,
    }
}

/// Direct affine projection of the top face.
///
/// Applies the model transform, then swaps into the y-down canvas frame and
/// recenters on the box. Produces the same polygon as
/// `project_box(bbox, CanonicalView::Top, canvas)` for the same zoom.
pub fn top_view_affine(bbox: &OrientedBox, canvas: &Canvas, zoom: f32) -> [Point2f; 4] {
    let model = bbox.model_transform();
    let center = canvas.center();
    top_corners(bbox).map(|corner| {
        let world = model.transform_point(&corner);
        Point2f::new(
            center.x + zoom * (world.x - bbox.center.x),
            center.y - zoom * (world.y - bbox.center.y),
        )
    })
}

/// Perspective viewpoints around a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerspectiveView {
    Front,
    Back,
    Left,
    Right,
    Top,
    FrontLeftCorner,
    BackRightCorner,
}

/// Camera placement settings for perspective views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Distance from the box center for axis-aligned views
    pub default_distance: f32,
    /// Multiplier on the cube root of the box volume for corner views
    pub corner_scale: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_distance: DEFAULT_DISTANCE,
            corner_scale: 2.0,
        }
    }
}

impl ViewConfig {
    /// Set the camera distance for axis-aligned views
    pub fn with_default_distance(mut self, distance: f32) -> Self {
        self.default_distance = distance;
        self
    }

    /// Set the corner-view multiplier on the cube root of the box volume
    pub fn with_corner_scale(mut self, scale: f32) -> Self {
        self.corner_scale = scale;
        self
    }
}

impl PerspectiveView {
    /// Camera offset from the box center in the box-local frame
    pub fn offset(&self, dims: &Vector3f, config: &ViewConfig) -> Vector3f {
        let d = config.default_distance;
        match self {
            PerspectiveView::Front => Vector3f::new(d, 0.0, 0.0),
            PerspectiveView::Back => Vector3f::new(-d, 0.0, 0.0),
            PerspectiveView::Left => Vector3f::new(0.0, d, 0.0),
            PerspectiveView::Right => Vector3f::new(0.0, -d, 0.0),
            PerspectiveView::Top => Vector3f::new(0.0, 0.0, d),
            PerspectiveView::FrontLeftCorner => {
                let s = corner_distance(dims, config);
                Vector3f::new(s, s, s)
            }
            PerspectiveView::BackRightCorner => {
                let s = corner_distance(dims, config);
                Vector3f::new(-s, -s, s)
            }
        }
    }
}

fn corner_distance(dims: &Vector3f, config: &ViewConfig) -> f32 {
    let volume = (dims.x * dims.y * dims.z).abs();
    (config.corner_scale * volume.cbrt()).max(config.default_distance / 2.0)
}

/// Camera pose for viewing a box from a perspective viewpoint.
///
/// The view's canonical offset is expressed in the box's orientation by
/// conjugating it with the box pose (translate to origin, rotate by
/// `rotation`, translate back) and applying the result to the center.
pub fn camera_vector_for(
    bbox: &OrientedBox,
    rotation: f32,
    dims: &Vector3f,
    view: PerspectiveView,
    config: &ViewConfig,
) -> CameraPose {
    let offset = Transform3D::translation(view.offset(dims, config));
    let about_center = Transform3D::rotation_z_about(&bbox.center, rotation);
    let position = offset.then(about_center).transform_point(&bbox.center);

    // looking straight down needs an up vector off the z axis
    let up = match view {
        PerspectiveView::Top => Transform3D::rotation_z(rotation).transform_vector(&Vector3f::x()),
        _ => Vector3f::z(),
    };

    CameraPose {
        position,
        target: bbox.center,
        up,
    }
}

/// A 2D edit of one projected face, in world units along the face axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceEdit {
    /// Center displacement along the face's horizontal and vertical axes
    pub offset_center: Vector2<f32>,
    /// Change of the face's horizontal extent
    pub offset_width: f32,
    /// Change of the face's vertical extent
    pub offset_depth: f32,
}

impl FaceEdit {
    /// Derive the edit that turns `projection.polygon` into `edited`.
    ///
    /// Each edited corner is unprojected at its original depth and moved into
    /// the box-local frame. Returns `None` if the projection is singular.
    pub fn from_polygons(projection: &BoxProjection, original: &OrientedBox, edited: &[Point2f; 4]) -> Option<Self> {
        let (h_axis, v_axis) = projection.view.face_axes();
        let to_local = original.inverse_model_transform();

        let mut h_range = (f32::INFINITY, f32::NEG_INFINITY);
        let mut v_range = (f32::INFINITY, f32::NEG_INFINITY);
        for (pixel, depth) in edited.iter().zip(projection.depths) {
            let world = projection.pipeline.canvas_to_world(pixel, depth)?;
            let local = to_local.transform_point(&world).coords;
            let (h, v) = (local.dot(&h_axis), local.dot(&v_axis));
            h_range = (h_range.0.min(h), h_range.1.max(h));
            v_range = (v_range.0.min(v), v_range.1.max(v));
        }

        let (width, depth) = projection.view.face_extents(original);
        Some(Self {
            offset_center: Vector2::new((h_range.0 + h_range.1) / 2.0, (v_range.0 + v_range.1) / 2.0),
            offset_width: (h_range.1 - h_range.0) - width,
            offset_depth: (v_range.1 - v_range.0) - depth,
        })
    }
}

/// Apply a face edit to a box.
///
/// The center offset is rotated by the box's current rotation before being
/// added to the center. Side edits change width and depth, Back edits change
/// height and depth, Top edits change width and height.
pub fn box_from_edit(edit: &FaceEdit, original: &OrientedBox, face: CanonicalView) -> OrientedBox {
    let (h_axis, v_axis) = face.face_axes();
    let local_offset = h_axis * edit.offset_center.x + v_axis * edit.offset_center.y;
    let world_offset = Transform3D::rotation_z(original.rotation).transform_vector(&local_offset);

    let mut updated = original.clone();
    updated.center += world_offset;
    match face {
        CanonicalView::Top => {
            updated.width += edit.offset_width;
            updated.height += edit.offset_depth;
        }
        CanonicalView::Side => {
            updated.width += edit.offset_width;
            updated.depth += edit.offset_depth;
        }
        CanonicalView::Back => {
            updated.height += edit.offset_width;
            updated.depth += edit.offset_depth;
        }
    }
    updated
}
