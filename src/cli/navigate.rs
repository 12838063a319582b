use anyhow::{Result, bail};
use mhaseq::process::session::{FrameView, Session};
use mhaseq::utils::errors::NavigateError;

use super::command::{Cli, NavStep, NavigateArgs};
use super::{open_session, print_view};

pub fn cmd_navigate(args: &NavigateArgs, cli: &Cli) -> Result<()> {
    let mut session = open_session(&args.input, cli)?;
    session.set_apply_transforms(args.apply_transforms);
    session.set_play_mode(args.mode.into());

    let mut failures = 0;
    for &step in &args.steps {
        match apply_step(&mut session, step) {
            Ok(view) => print_view(&view, args.apply_transforms),
            Err(e) => {
                log::error!("{step}: {e}");
                failures += 1;
                if cli.strict {
                    return Err(e.into());
                }
                println!("{} unchanged", session.frame_label());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} steps failed", args.steps.len());
    }

    Ok(())
}

fn apply_step(session: &mut Session, step: NavStep) -> Result<FrameView, NavigateError> {
    match step {
        NavStep::Next => session.next(),
        NavStep::Previous => session.previous(),
        NavStep::NextValid => session.next_valid(),
        NavStep::PreviousValid => session.previous_valid(),
        NavStep::NextInvalid => session.next_invalid(),
        NavStep::PreviousInvalid => session.previous_invalid(),
        NavStep::Random => session.random(),
        NavStep::Play => session.play_next(),
        NavStep::GoTo(frame) => session.go_to(frame),
    }
}
