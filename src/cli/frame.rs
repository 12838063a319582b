use std::fs;

use anyhow::{Context, Result};

use super::command::{Cli, FrameArgs};
use super::{open_session, print_view};

pub fn cmd_frame(args: &FrameArgs, cli: &Cli) -> Result<()> {
    let mut session = open_session(&args.input, cli)?;
    session.set_apply_transforms(args.apply_transforms);

    let view = session
        .go_to(args.index)
        .with_context(|| format!("Cannot show frame {}", args.index))?;
    print_view(&view, args.apply_transforms);

    if let Some(output) = &args.output {
        fs::write(output, &view.pixels)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!(
            "Wrote {} bytes of frame {} to {}",
            view.pixels.len(),
            view.index,
            output.display()
        );
    }

    Ok(())
}
