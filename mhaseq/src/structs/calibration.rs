//! Device calibration transforms keyed by image geometry.
//!
//! A calibration maps tracker space to image pixel space for a given probe
//! setup. Scanners emit a fixed frame size per setup, so the calibration is
//! chosen by `(width, height)`; unknown sizes get the identity.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::structs::matrix::{Rows4, from_rows};
use crate::utils::errors::ComposeError;

/// Determinant magnitude under which a calibration counts as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub width: usize,
    pub height: usize,
    /// Row-major 4x4 matrix.
    pub matrix: Rows4,
}

/// Lookup table from image geometry to calibration matrix.
///
/// Serialized as YAML:
///
/// ```yaml
/// entries:
///   - width: 640
///     height: 480
///     matrix:
///       - [0.107, 0.0, 0.0, -34.24]
///       - [0.0, 0.107, 0.0, 0.0]
///       - [0.0, 0.0, 1.0, 0.0]
///       - [0.0, 0.0, 0.0, 1.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    #[serde(default)]
    pub entries: Vec<CalibrationEntry>,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CalibrationTable {
    /// Calibrations for the probe setups we ship with: isotropic pixel
    /// spacing in millimetres, image origin moved to the transducer centre.
    pub fn builtin() -> Self {
        let entry = |width: usize, height: usize, spacing: f64| CalibrationEntry {
            width,
            height,
            matrix: [
                [spacing, 0.0, 0.0, -spacing * width as f64 / 2.0],
                [0.0, spacing, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };

        Self {
            entries: vec![
                entry(640, 480, 0.107),
                entry(820, 616, 0.083),
                entry(1024, 768, 0.067),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml_ng::from_str(yaml)?;
        debug!("Parsed {} calibration entries", table.entries.len());
        Ok(table)
    }

    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading calibration table {}", path.display()))?;
        let table = Self::from_yaml_str(&yaml)
            .with_context(|| format!("parsing calibration table {}", path.display()))?;
        info!(
            "Loaded {} calibration entries from {}",
            table.entries.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// First entry matching the geometry, or the identity.
    pub fn select(&self, width: usize, height: usize) -> DeviceCalibration {
        match self
            .entries
            .iter()
            .find(|e| e.width == width && e.height == height)
        {
            Some(entry) => DeviceCalibration {
                width,
                height,
                matrix: from_rows(&entry.matrix),
                from_table: true,
            },
            None => DeviceCalibration::identity(width, height),
        }
    }
}

/// Calibration selected for one loaded sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCalibration {
    pub width: usize,
    pub height: usize,
    pub matrix: Matrix4<f64>,
    /// False when no table entry matched and the identity was used.
    pub from_table: bool,
}

impl DeviceCalibration {
    pub fn identity(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            matrix: Matrix4::identity(),
            from_table: false,
        }
    }

    pub fn inverse(&self) -> Result<Matrix4<f64>, ComposeError> {
        let singular = ComposeError::SingularCalibration {
            width: self.width,
            height: self.height,
        };

        if self.matrix.determinant().abs() < SINGULAR_EPSILON {
            return Err(singular);
        }

        self.matrix.try_inverse().ok_or(singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_by_geometry() {
        let table = CalibrationTable::builtin();

        let calibration = table.select(640, 480);
        assert!(calibration.from_table);
        assert_eq!(calibration.matrix[(0, 0)], 0.107);
        assert!((calibration.matrix[(0, 3)] + 34.24).abs() < 1e-9);

        let calibration = table.select(480, 640);
        assert!(!calibration.from_table);
        assert_eq!(calibration.matrix, Matrix4::identity());
    }

    #[test]
    fn inverse_undoes_calibration() {
        let calibration = CalibrationTable::builtin().select(820, 616);
        let product = calibration.matrix * calibration.inverse().unwrap();
        assert!((product - Matrix4::identity()).abs().max() < 1e-9);
    }

    #[test]
    fn singular_calibration() {
        let table = CalibrationTable::from_yaml_str(
            "entries:
  - width: 4
    height: 4
    matrix:
      - [1.0, 0.0, 0.0, 0.0]
      - [0.0, 0.0, 0.0, 0.0]
      - [0.0, 0.0, 1.0, 0.0]
      - [0.0, 0.0, 0.0, 1.0]
",
        )
        .unwrap();

        let calibration = table.select(4, 4);
        assert!(calibration.from_table);
        assert_eq!(
            calibration.inverse(),
            Err(ComposeError::SingularCalibration {
                width: 4,
                height: 4
            })
        );
    }

    #[test]
    fn yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.yaml");
        std::fs::write(&path, CalibrationTable::builtin().to_yaml_string().unwrap()).unwrap();

        let table = CalibrationTable::from_yaml_path(&path).unwrap();
        assert_eq!(table, CalibrationTable::builtin());

        assert!(CalibrationTable::from_yaml_path(dir.path().join("none.yaml")).is_err());
        assert!(CalibrationTable::from_yaml_str("entries: [1, 2]").is_err());
    }
}
