//! Data structures describing a sequence file.
//!
//! Contains the frame geometry read from `DimSize`, the per-frame transform
//! table with its validity flags, the device calibration lookup and the
//! matrix helpers shared by them.

pub mod calibration;
pub mod header;
pub mod matrix;
pub mod transform;
