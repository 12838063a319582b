use std::path::Path;

use anyhow::{Context, Result};
use log::Level;
use mhaseq::process::session::{FrameView, Session, SessionOptions};
use mhaseq::structs::calibration::CalibrationTable;
use mhaseq::structs::matrix::format_rows;

use command::Cli;

pub mod command;
pub mod frame;
pub mod info;
pub mod navigate;
pub mod play;

/// Builds a session from the global options and loads `input` into it.
pub fn open_session(input: &Path, cli: &Cli) -> Result<Session> {
    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };

    let calibration = match &cli.calibration {
        Some(path) => CalibrationTable::from_yaml_path(path)?,
        None => CalibrationTable::builtin(),
    };

    let mut session = Session::new(SessionOptions {
        fail_level,
        calibration,
    });
    session
        .load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    Ok(session)
}

pub fn print_view(view: &FrameView, show_transform: bool) {
    println!("{} {}", view.label(), view.status);
    if show_transform {
        for row in format_rows(&view.transform) {
            println!("  {row}");
        }
    }
}
