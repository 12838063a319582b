use anyhow::{Result, bail};
use mhaseq::structs::matrix::format_rows;

use super::command::{Cli, InfoArgs};
use super::open_session;

pub fn cmd_info(args: &InfoArgs, cli: &Cli) -> Result<()> {
    log::info!("Analyzing sequence: {}", args.input.display());

    let session = open_session(&args.input, cli)?;
    let (Some(header), Some(table), Some(calibration)) = (
        session.header(),
        session.transform_table(),
        session.calibration(),
    ) else {
        bail!("{} did not load", args.input.display());
    };

    let (valid, invalid) = table.validity_counts();
    let unknown = header.frame_count.saturating_sub(table.validity().len());

    println!("File: {}", args.input.display());
    println!("Dimensions: {}x{}", header.columns, header.rows);
    println!("Frames: {}", header.frame_count);
    println!("Frame size: {} bytes", header.frame_len());
    if let Some(offset) = session.payload_start() {
        println!("Payload offset: {offset} bytes");
    }
    println!("Transforms: {}", table.records().len());
    println!("Status: {valid} OK, {invalid} INVALID, {unknown} unknown");

    let names = session.available_transform_names();
    if names.is_empty() {
        println!("Transform names: none");
    } else {
        println!(
            "Transform names: {}",
            names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    if calibration.from_table {
        println!(
            "Calibration: {}x{} from table",
            calibration.width, calibration.height
        );
    } else {
        println!("Calibration: identity (no entry for {}x{})", header.columns, header.rows);
    }
    for row in format_rows(&calibration.matrix) {
        println!("  {row}");
    }

    Ok(())
}
