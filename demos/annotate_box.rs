//! Annotating one box in a point cloud
//!
//! This demo walks through a full edit cycle:
//! - Loading a cloud through the shared point cache
//! - Projecting the box into its three canonical views
//! - Widening the box by dragging its top face
//! - Filtering the points inside the edited box on a background worker
//!
//! Pass an XYZ/CSV file to use real data; otherwise a synthetic cloud is used.
//! Set `RUST_LOG=debug` to see cache and worker activity.

use boxcrate_camera::Canvas;
use boxcrate_core::{BoxPadding, ColoredPoint, Error, OrientedBox, Point3f, PointBuffer};
use boxcrate_filtering::{filter_z_axis_points, FilterWorker, LatestResults, WorkerConfig};
use boxcrate_io::{FnSource, PointCache, PointCloudSource, XyzSource};
use boxcrate_projection::{box_from_edit, project_box, CanonicalView, FaceEdit};
use rand::Rng;
use std::sync::Arc;

const SYNTHETIC_ID: &str = "synthetic";

/// A parked car: a dense block of points on a noisy ground plane
fn synthetic_cloud(id: &str) -> boxcrate_core::Result<PointBuffer> {
    if id != SYNTHETIC_ID {
        return Err(Error::NotFound(id.to_string()));
    }
    let mut rng = rand::thread_rng();
    let ground: Vec<ColoredPoint> = (0..20_000)
        .map(|_| {
            ColoredPoint::new(
                Point3f::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0), rng.gen_range(-0.05..0.05)),
                [0.4, 0.4, 0.4],
            )
        })
        .collect();
    let car: Vec<ColoredPoint> = (0..5_000)
        .map(|_| {
            ColoredPoint::new(
                Point3f::new(rng.gen_range(3.0..7.4), rng.gen_range(-1.0..0.9), rng.gen_range(0.1..1.6)),
                [0.9, 0.1, 0.1],
            )
        })
        .collect();
    Ok(ground.into_iter().chain(car).collect())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("boxcrate annotation demo");
    println!("========================");

    let path = std::env::args().nth(1);
    let source: Box<dyn PointCloudSource> = match &path {
        Some(_) => Box::new(XyzSource::new()),
        None => Box::new(FnSource(synthetic_cloud)),
    };
    let cache = Arc::new(PointCache::new(source));
    let id = path.as_deref().unwrap_or(SYNTHETIC_ID);

    let cloud = cache.load(id)?;
    let (min, max) = cloud.bounding_box();
    println!("Loaded {} points from {}", cloud.len(), id);
    println!("- bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})", min.x, min.y, min.z, max.x, max.y, max.z);

    // a first guess, a little too narrow and slightly turned
    let bbox = OrientedBox::new(1, Point3f::new(5.0, 0.0, 0.85), 3.5, 1.9, 1.6)
        .with_rotation(0.05)
        .with_attribute("car");
    bbox.validate()?;

    let canvas = Canvas::new(400.0, 300.0);
    println!("\nCanonical views on a {}x{} canvas:", canvas.width, canvas.height);
    for view in CanonicalView::ALL {
        let projection = project_box(&bbox, view, &canvas);
        let corners: Vec<String> = projection
            .polygon
            .iter()
            .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
            .collect();
        println!("- {:?}: zoom {:.2}, corners {}", view, projection.zoom, corners.join(" "));
    }

    // drag the front edge of the top face 20 pixels to the right
    let top = project_box(&bbox, CanonicalView::Top, &canvas);
    let mut dragged = top.polygon;
    dragged[0].x += 20.0;
    dragged[1].x += 20.0;
    let edit = FaceEdit::from_polygons(&top, &bbox, &dragged)
        .ok_or_else(|| anyhow::anyhow!("top view pipeline is not invertible"))?;
    let edited = box_from_edit(&edit, &bbox, CanonicalView::Top);
    println!("\nTop face edit: {:?}", edit);
    println!("- width {:.2} -> {:.2}", bbox.width, edited.width);
    println!(
        "- center ({:.2}, {:.2}) -> ({:.2}, {:.2})",
        bbox.center.x, bbox.center.y, edited.center.x, edited.center.y
    );

    // both boxes are filtered in the background; only the newest result counts
    let worker = FilterWorker::with_pool(&WorkerConfig::default())?;
    let mut latest = LatestResults::new();
    let padding = BoxPadding::uniform(0.2);
    let pending = [
        worker.submit(&bbox, &padding, &cloud),
        worker.submit(&edited, &padding, &cloud),
    ];
    for p in &pending {
        latest.record(p);
    }

    println!("\nRegion filter:");
    for p in pending {
        let completion = pollster::block_on(p.wait())?;
        let status = if latest.is_current(&completion) { "current" } else { "stale" };
        println!("- request {:?}: {} points ({})", completion.token, completion.response.count, status);
    }

    let flags = filter_z_axis_points(&cloud, 0.5);
    let visible = flags.iter().filter(|&&f| f > 0.0).count();
    println!("\nZ cutoff at 0.5: {} of {} points visible", visible, cloud.len());

    Ok(())
}
