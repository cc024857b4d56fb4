//! KITTI-style calibration files
//!
//! Each line holds a key, a colon and space-separated row-major values:
//!
//! ```text
//! P2: 7.215377e+02 0.000000e+00 6.095593e+02 4.485728e+01 ...
//! R0_rect: 9.999239e-01 9.837760e-03 -7.445048e-03 ...
//! Tr_velo_to_cam: 7.533745e-03 -9.999714e-01 -6.166020e-04 ...
//! ```
//!
//! Lines with other keys are ignored.

use boxcrate_core::{Error, Result};
use boxcrate_projection::CalibrationTriple;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Names of the three matrices in a calibration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationKeys {
    /// 3×4 camera projection
    pub projection: String,
    /// 3×3 rectifying rotation
    pub rectification: String,
    /// 3×4 sensor-to-camera transform
    pub transform: String,
}

impl Default for CalibrationKeys {
    fn default() -> Self {
        Self {
            projection: "P2".to_string(),
            rectification: "R0_rect".to_string(),
            transform: "Tr_velo_to_cam".to_string(),
        }
    }
}

impl CalibrationKeys {
    /// Set the key of the projection matrix
    pub fn with_projection(mut self, key: impl Into<String>) -> Self {
        self.projection = key.into();
        self
    }

    /// Set the key of the rectifying rotation
    pub fn with_rectification(mut self, key: impl Into<String>) -> Self {
        self.rectification = key.into();
        self
    }

    /// Set the key of the sensor-to-camera transform
    pub fn with_transform(mut self, key: impl Into<String>) -> Self {
        self.transform = key.into();
        self
    }
}

fn parse_entries(text: &str) -> Result<HashMap<&str, Vec<f32>>> {
    let mut entries = HashMap::new();
    for (index, line) in text.lines().enumerate() {
        let Some((key, values)) = line.split_once(':') else {
            continue;
        };
        let values = values
            .split_whitespace()
            .map(|value| {
                value.parse::<f32>().map_err(|_| {
                    Error::Decode(format!("line {}: invalid number {:?} in {}", index + 1, value, key.trim()))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        entries.insert(key.trim(), values);
    }
    Ok(entries)
}

/// Parse calibration text into a (P, R, T) triple
pub fn parse_calibration(text: &str, keys: &CalibrationKeys) -> Result<CalibrationTriple> {
    let entries = parse_entries(text)?;
    let lookup = |key: &str| {
        entries
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InvalidData(format!("calibration has no {:?} entry", key)))
    };

    CalibrationTriple::from_row_slices(
        lookup(&keys.projection)?,
        lookup(&keys.rectification)?,
        lookup(&keys.transform)?,
    )
}

/// Read a calibration file from disk
pub fn read_calibration<P: AsRef<Path>>(path: P, keys: &CalibrationKeys) -> Result<CalibrationTriple> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })?;
    log::debug!("read calibration from {}", path.display());
    parse_calibration(&text, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boxcrate_core::{Point2f, Point3f};
    use boxcrate_projection::project;

    const SAMPLE: &str = "\
P0: 1 0 0 0 0 1 0 0 0 0 1 0
P2: 700 0 600 0 0 700 180 0 0 0 1 0
R0_rect: 1 0 0 0 1 0 0 0 1
Tr_velo_to_cam: 0 -1 0 0 0 0 -1 0 1 0 0 0
Tr_imu_to_velo: 1 0 0 0 0 1 0 0 0 0 1 0
";

    #[test]
    fn test_parse_sample() {
        let calib = parse_calibration(SAMPLE, &CalibrationKeys::default()).unwrap();
        assert_relative_eq!(calib.p[(0, 2)], 600.0);
        assert_relative_eq!(calib.t[(2, 0)], 1.0);

        // a point 10 m ahead of the sensor lands on the principal point
        let pixel = project(&Point3f::new(10.0, 0.0, 0.0), &calib.compose()).unwrap();
        assert_relative_eq!(pixel, Point2f::new(600.0, 180.0), epsilon = 1e-3);
    }

    #[test]
    fn test_custom_keys() {
        let keys = CalibrationKeys::default().with_projection("P0");
        let calib = parse_calibration(SAMPLE, &keys).unwrap();
        assert_relative_eq!(calib.p[(0, 0)], 1.0);
    }

    #[test]
    fn test_missing_and_malformed_entries() {
        let keys = CalibrationKeys::default().with_transform("Tr_cam_to_road");
        assert!(matches!(parse_calibration(SAMPLE, &keys), Err(Error::InvalidData(_))));
        assert!(matches!(
            parse_calibration("P2: 1 2 x\n", &CalibrationKeys::default()),
            Err(Error::Decode(_))
        ));
        // R0_rect with too few values
        let short = "P2: 1 0 0 0 0 1 0 0 0 0 1 0\nR0_rect: 1 0 0\nTr_velo_to_cam: 1 0 0 0 0 1 0 0 0 0 1 0\n";
        assert!(matches!(parse_calibration(short, &CalibrationKeys::default()), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_read_from_disk() {
        let path = std::env::temp_dir().join("boxcrate_calib_test.txt");
        fs::write(&path, SAMPLE).unwrap();
        assert!(read_calibration(&path, &CalibrationKeys::default()).is_ok());
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            read_calibration(&path, &CalibrationKeys::default()),
            Err(Error::NotFound(_))
        ));
    }
}
