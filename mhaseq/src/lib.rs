#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Reader for MetaImage (`.mha`) sequence files as written by tracked
//! ultrasound acquisition: a text header followed by a raw stack of 8-bit
//! grayscale frames in the same file.
//!
//! ### File Organization
//!
//! **Header**: `Key = Value` lines. `DimSize = <columns> <rows> <frames>`
//! gives the geometry; frame-scoped keys (`Seq_Frame0000_...`) carry one
//! tracked transform and one status per frame. The line
//! `ElementDataFile = LOCAL` ends the header.
//! **Payload**: `frames` consecutive planes of `columns * rows` bytes,
//! starting right after the sentinel line.
//!
//! ### Frame Association
//!
//! Transforms and statuses belong to frames by line order, not by the number
//! embedded in their keys.
//!
//! ### Display Transforms
//!
//! The display transform of a frame is its tracked transform multiplied by
//! the inverse of a device calibration chosen by image size.
//!
//! ## Quick Start
//!
//! 1. Open a sequence with [`process::session::Session::load`]
//! 2. Move through it with the navigation calls (`next`, `next_valid`, `go_to`, ...)
//! 3. Each call returns a [`process::session::FrameView`] with pixels,
//!    display transform and transform status
//!
//! ```rust,no_run
//! use mhaseq::process::session::{Session, SessionOptions};
//!
//! let mut session = Session::new(SessionOptions::default());
//! session.load("recording.mha")?;
//! session.set_apply_transforms(true);
//!
//! let first = session.render()?;
//! println!("{} {} {} bytes", first.label(), first.status, first.pixels.len());
//!
//! for _ in 0..session.frame_count() {
//!     let view = session.next_valid()?;
//!     println!("{} {}", view.label(), view.transform);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing of sequence files.
///
/// 1. **Header Scanning** ([`process::scan`]): Line-wise header access and
///    payload location.
///
/// 2. **Frame Reading** ([`process::reader`]): Byte-exact random access to
///    frames.
///
/// 3. **Navigation** ([`process::navigate`]): Current-frame state machine.
///
/// 4. **Composition** ([`process::compose`]): Display transforms.
///
/// 5. **Session** ([`process::session`]): Everything above behind one API.
pub mod process;

/// Data structures representing sequence file components.
///
/// - **Header** ([`structs::header`]): Frame geometry
/// - **Transforms** ([`structs::transform`]): Per-frame transforms, statuses, family names
/// - **Calibration** ([`structs::calibration`]): Device calibration lookup
/// - **Matrices** ([`structs::matrix`]): 4x4 helpers
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
