//! Projecting a lidar sweep into a camera image
//!
//! Usage: `calibrated_projection [calib.txt] [cloud.xyz]`
//!
//! Without arguments a KITTI-like calibration and a random sweep are used.

use boxcrate_core::{ColoredPoint, Point3f, PointBuffer};
use boxcrate_io::{parse_calibration, read_calibration, read_xyz, CalibrationKeys};
use boxcrate_projection::project_buffer;
use rand::Rng;

const SAMPLE_CALIBRATION: &str = "\
P2: 7.215377e+02 0.000000e+00 6.095593e+02 4.485728e+01 0.000000e+00 7.215377e+02 1.728540e+02 2.163791e-01 0.000000e+00 0.000000e+00 1.000000e+00 2.745884e-03
R0_rect: 9.999239e-01 9.837760e-03 -7.445048e-03 -9.869795e-03 9.999421e-01 -4.278459e-03 7.402527e-03 4.351614e-03 9.999631e-01
Tr_velo_to_cam: 7.533745e-03 -9.999714e-01 -6.166020e-04 -4.069766e-03 1.480249e-02 7.280733e-04 -9.998902e-01 -7.631618e-02 9.998621e-01 7.523790e-03 1.480755e-02 -2.717806e-01
";

const IMAGE_WIDTH: f32 = 1242.0;
const IMAGE_HEIGHT: f32 = 375.0;

fn random_sweep(n: usize) -> PointBuffer {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| {
            let azimuth: f32 = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            let range: f32 = rng.gen_range(2.0..60.0);
            let z: f32 = rng.gen_range(-1.7..2.0);
            ColoredPoint::from(Point3f::new(range * azimuth.cos(), range * azimuth.sin(), z))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let keys = CalibrationKeys::default();
    let calibration = match args.next() {
        Some(path) => read_calibration(path, &keys)?,
        None => parse_calibration(SAMPLE_CALIBRATION, &keys)?,
    };
    let cloud = match args.next() {
        Some(path) => read_xyz(path)?,
        None => random_sweep(50_000),
    };

    let composed = calibration.compose();
    println!("Composed sensor -> image matrix:{}", composed);

    let projected = project_buffer(&cloud, &composed);
    let in_image = projected
        .pixels
        .iter()
        .filter(|p| (0.0..IMAGE_WIDTH).contains(&p.x) && (0.0..IMAGE_HEIGHT).contains(&p.y))
        .count();

    println!("{} points in the sweep", cloud.len());
    println!("- {} in front of the camera", projected.len());
    println!("- {} inside the {}x{} image", in_image, IMAGE_WIDTH, IMAGE_HEIGHT);
    log::info!("dropped {} points behind the camera", cloud.len() - projected.len());

    Ok(())
}
