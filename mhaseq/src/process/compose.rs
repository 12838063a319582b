use log::warn;
use nalgebra::Matrix4;

use crate::structs::calibration::DeviceCalibration;
use crate::structs::transform::TransformRecord;
use crate::utils::errors::ComposeError;

/// Combines tracked per-frame transforms with the device calibration.
///
/// The display transform of a frame is `tracked * inverse(calibration)`.
/// The inverse is computed once, when the composer is built.
#[derive(Debug, Clone)]
pub struct TransformComposer {
    calibration: DeviceCalibration,
    inverse: Result<Matrix4<f64>, ComposeError>,
}

impl TransformComposer {
    pub fn new(calibration: DeviceCalibration) -> Self {
        let inverse = calibration.inverse();
        if let Err(e) = &inverse {
            warn!("{e}; display transforms fall back to identity");
        }

        Self {
            calibration,
            inverse,
        }
    }

    pub fn calibration(&self) -> &DeviceCalibration {
        &self.calibration
    }

    /// Display transform for `frame`.
    ///
    /// Returns the identity when `apply` is false. Fails with
    /// [`ComposeError::NoTransformForFrame`] when `records` has no entry for
    /// the frame and with [`ComposeError::SingularCalibration`] when the
    /// calibration cannot be inverted.
    pub fn compose(
        &self,
        records: &[TransformRecord],
        frame: usize,
        apply: bool,
    ) -> Result<Matrix4<f64>, ComposeError> {
        if !apply {
            return Ok(Matrix4::identity());
        }

        let record = records
            .get(frame)
            .ok_or(ComposeError::NoTransformForFrame {
                index: frame,
                count: records.len(),
            })?;

        let inverse = self.inverse.clone()?;
        Ok(record.matrix() * inverse)
    }
}
