//! End-to-end annotation flows across the boxcrate crates

use approx::assert_relative_eq;
use boxcrate::filtering::FilterRequest;
use boxcrate::io::{parse_calibration, CalibrationKeys};
use boxcrate::prelude::*;
use boxcrate::projection::{project_buffer, top_view_affine};
use std::f32::consts::FRAC_PI_2;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// A 10×10×4 grid of points at half-integer coordinates, written as CSV
fn write_grid_file(name: &str) -> anyhow::Result<PathBuf> {
    let mut text = String::from("x,y,z,r,g,b\n");
    for ix in 0..10 {
        for iy in 0..10 {
            for iz in 0..4 {
                writeln!(
                    text,
                    "{},{},{},{},{},{}",
                    ix as f32 - 4.5,
                    iy as f32 - 4.5,
                    iz as f32 - 1.5,
                    ix * 25,
                    iy * 25,
                    255
                )?;
            }
        }
    }
    let path = std::env::temp_dir().join(name);
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn test_load_filter_and_cut() -> anyhow::Result<()> {
    let path = write_grid_file("boxcrate_integration_grid.csv")?;
    let cache = Arc::new(PointCache::new(XyzSource::with_root(std::env::temp_dir())));

    let cloud = cache.load("boxcrate_integration_grid.csv")?;
    assert_eq!(cloud.len(), 400);
    assert!(cache.contains("boxcrate_integration_grid.csv"));
    assert_relative_eq!(cloud.color(0)[2], 1.0);

    // x in [-2, 2], y in [-2, 2], z in [-1, 1]
    let bbox = OrientedBox::new(1, Point3f::origin(), 4.0, 4.0, 2.0);
    let worker = FilterWorker::with_pool(&WorkerConfig::default().with_threads(2))?;
    let pending = worker.submit(&bbox, &BoxPadding::default(), &cloud);
    let completion = pollster::block_on(pending.wait())?;
    assert_eq!(completion.box_id, 1);
    assert_eq!(completion.response.count, 4 * 4 * 2);

    // the synchronous path agrees with the worker
    let direct = filter_points_in_box(&bbox, &BoxPadding::default(), &cloud)?;
    assert_eq!(direct, completion.response);

    // cut the filtered points at z = 0
    let mut inside = completion.response.into_buffer()?;
    apply_z_cutoff(&mut inside, 0.0)?;
    let visible = inside.visibility().map(|flags| flags.iter().filter(|&&f| f == 1.0).count());
    assert_eq!(visible, Some(16));

    fs::remove_file(path)?;
    Ok(())
}

#[test]
fn test_stale_results_are_discarded() -> anyhow::Result<()> {
    let cloud: PointBuffer = (0..100)
        .map(|i| ColoredPoint::from(Point3f::new(i as f32 * 0.1, 0.0, 0.0)))
        .collect();
    let worker = FilterWorker::inline();
    let mut latest = LatestResults::new();

    let mut bbox = OrientedBox::new(7, Point3f::origin(), 2.0, 1.0, 1.0);
    let first = worker.submit(&bbox, &BoxPadding::default(), &cloud);
    latest.record(&first);
    bbox.width = 4.1;
    let second = worker.submit(&bbox, &BoxPadding::default(), &cloud);
    latest.record(&second);

    let results = [first.wait_blocking()?, second.wait_blocking()?];
    let current: Vec<_> = results.iter().filter(|c| latest.is_current(c)).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].response.count, 21);
    Ok(())
}

#[test]
fn test_top_view_edit_round_trip() {
    let canvas = Canvas::new(200.0, 200.0);
    let bbox = OrientedBox::new(0, Point3f::origin(), 4.0, 2.0, 2.0);
    let top = project_box(&bbox, CanonicalView::Top, &canvas);

    assert_relative_eq!(top.zoom, 25.0);
    let expected = [(150.0, 75.0), (150.0, 125.0), (50.0, 125.0), (50.0, 75.0)];
    for (corner, (x, y)) in top.polygon.iter().zip(expected) {
        assert_relative_eq!(corner.x, x, epsilon = 1e-3);
        assert_relative_eq!(corner.y, y, epsilon = 1e-3);
    }

    // drag the right edge one world unit further right
    let mut edited = top.polygon;
    edited[0].x += 25.0;
    edited[1].x += 25.0;
    let edit = FaceEdit::from_polygons(&top, &bbox, &edited).expect("orthographic pipeline is invertible");
    let updated = box_from_edit(&edit, &bbox, CanonicalView::Top);

    assert_relative_eq!(updated.width, 5.0, epsilon = 1e-3);
    assert_relative_eq!(updated.height, 2.0, epsilon = 1e-3);
    assert_relative_eq!(updated.depth, 2.0, epsilon = 1e-3);
    assert_relative_eq!(updated.center, Point3f::new(0.5, 0.0, 0.0), epsilon = 1e-3);
}

#[test]
fn test_untouched_faces_leave_rotated_box_unchanged() {
    let canvas = Canvas::new(640.0, 480.0);
    let bbox = OrientedBox::new(3, Point3f::new(12.0, -4.0, 1.0), 4.2, 1.8, 1.6).with_rotation(FRAC_PI_2 / 3.0);

    for view in CanonicalView::ALL {
        let projection = project_box(&bbox, view, &canvas);
        let edit = FaceEdit::from_polygons(&projection, &bbox, &projection.polygon)
            .expect("orthographic pipeline is invertible");
        let updated = box_from_edit(&edit, &bbox, view);
        assert_relative_eq!(updated.center, bbox.center, epsilon = 1e-2);
        assert_relative_eq!(updated.dimensions(), bbox.dimensions(), epsilon = 1e-2);
    }

    // the top-face shortcut agrees with the general pipeline
    let top = project_box(&bbox, CanonicalView::Top, &canvas);
    for (a, b) in top.polygon.iter().zip(top_view_affine(&bbox, &canvas, top.zoom)) {
        assert_relative_eq!(*a, b, epsilon = 1e-2);
    }
}

#[test]
fn test_perspective_camera_orbits_with_box() {
    let bbox = OrientedBox::new(0, Point3f::new(1.0, 2.0, 0.0), 4.0, 2.0, 2.0);
    let config = ViewConfig::default();
    let front = camera_vector_for(&bbox, 0.0, &bbox.dimensions(), PerspectiveView::Front, &config);
    let turned = camera_vector_for(&bbox, FRAC_PI_2, &bbox.dimensions(), PerspectiveView::Front, &config);

    // a quarter turn moves the front camera from +x to +y of the center
    let before = front.position - bbox.center;
    let after = turned.position - bbox.center;
    assert_relative_eq!(before.norm(), after.norm(), epsilon = 1e-4);
    assert_relative_eq!(after.x, -before.y, epsilon = 1e-4);
    assert_relative_eq!(after.y, before.x, epsilon = 1e-4);

    let mut camera = Camera::perspective_for_canvas(&Canvas::new(800.0, 600.0), std::f32::consts::FRAC_PI_4);
    camera.apply_pose(&turned);
    let pipeline = TransformPipeline::new(&camera, &Canvas::new(800.0, 600.0));
    let center = pipeline.world_to_canvas(&bbox.center);
    assert_relative_eq!(center.x, 400.0, epsilon = 1e-2);
    assert_relative_eq!(center.y, 300.0, epsilon = 1e-2);
}

#[test]
fn test_calibrated_projection_of_cached_cloud() -> anyhow::Result<()> {
    let text = "\
P2: 100 0 50 0 0 100 50 0 0 0 1 0
R0_rect: 1 0 0 0 1 0 0 0 1
Tr_velo_to_cam: 0 -1 0 0 0 0 -1 0 1 0 0 0
";
    let calibration = parse_calibration(text, &CalibrationKeys::default())?;
    let cache = PointCache::new(FnSource(|_id: &str| -> boxcrate::Result<PointBuffer> {
        Ok([Point3f::new(10.0, 0.0, 0.0), Point3f::new(-10.0, 0.0, 0.0), Point3f::new(5.0, 1.0, 0.0)]
            .into_iter()
            .map(ColoredPoint::from)
            .collect())
    }));

    let cloud = cache.load("frame_000042")?;
    let projected = project_buffer(&cloud, &calibration.compose());
    assert_eq!(projected.indices, vec![0, 2]);
    assert_relative_eq!(projected.pixels[0], Point2f::new(50.0, 50.0), epsilon = 1e-4);
    assert_relative_eq!(projected.pixels[1], Point2f::new(30.0, 50.0), epsilon = 1e-4);
    Ok(())
}

#[test]
fn test_filter_request_uses_padded_box() {
    let cloud: PointBuffer = std::iter::once(ColoredPoint::default()).collect();
    let bbox = OrientedBox::new(0, Point3f::new(0.0, 0.0, 1.0), 2.0, 2.0, 2.0);
    let request = FilterRequest::new(&bbox, &BoxPadding::uniform(1.0), &cloud);
    assert_eq!(request.position.len(), 3);
    assert_eq!(request.footprint.len(), 4);
    assert_relative_eq!(request.z_min, -0.5);
    assert_relative_eq!(request.z_max, 2.5);
}
