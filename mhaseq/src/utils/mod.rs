//! Supporting infrastructure.
//!
//! Error types shared by the scanning, reading, navigation and composition
//! stages.

pub mod errors;
