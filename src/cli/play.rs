use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mhaseq::structs::transform::TransformStatus;

use super::command::{Cli, PlayArgs};
use super::{open_session, print_view};

pub fn cmd_play(args: &PlayArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let mut session = open_session(&args.input, cli)?;
    session.set_apply_transforms(args.apply_transforms);
    session.set_play_mode(args.mode.into());

    log::info!(
        "Playing {} steps {} from frame {}",
        args.steps,
        session.play_mode(),
        session.frame_label()
    );

    let pb = multi.map(|multi| create_progress_bar(multi, args.steps)).transpose()?;

    let start = Instant::now();
    let mut valid = 0u64;
    for step in 0..args.steps {
        let view = session
            .play_next()
            .with_context(|| format!("Playback stopped at step {step}"))?;

        if view.status == TransformStatus::Ok {
            valid += 1;
        }

        match &pb {
            Some(pb) => {
                pb.set_message(format!("frame {} {}", view.label(), view.status));
                pb.inc(1);
            }
            None => print_view(&view, args.apply_transforms),
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message(format!("stopped at {}", session.frame_label()));
    }

    log::info!(
        "Played {} frames in {:.3}s, {valid} with a valid transform",
        args.steps,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn create_progress_bar(multi: &MultiProgress, steps: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(steps));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} steps ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("starting playback");
    Ok(pb)
}
