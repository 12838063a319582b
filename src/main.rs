use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::frame::cmd_frame;
use cli::info::cmd_info;
use cli::navigate::cmd_navigate;
use cli::play::cmd_play;

mod cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                let ts = buf.timestamp().to_string();
                writeln!(buf, "{}", json_record(&ts, record))
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    log::debug!(
        "{} {} (mhaseq {}, {}, built {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("MHASEQ_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("no git"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Commands::Info(ref args) => cmd_info(args, &cli)?,
        Commands::Frame(ref args) => cmd_frame(args, &cli)?,
        Commands::Navigate(ref args) => cmd_navigate(args, &cli)?,
        Commands::Play(ref args) => cmd_play(args, &cli, pb)?,
    }

    Ok(())
}

fn json_record(ts: &str, record: &log::Record) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": record.level().as_str(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}

#[test]
fn json_record_escapes_message() {
    let line = json_record(
        "2026-01-01T00:00:00Z",
        &log::Record::builder()
            .level(log::Level::Warn)
            .target("mhaseq::structs::transform")
            .args(format_args!("Status line 3 has unrecognized value \"OK?\"\nC:\\scan"))
            .build(),
    )
    .to_string();

    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["lvl"], "WARN");
    assert_eq!(parsed["target"], "mhaseq::structs::transform");
    assert_eq!(
        parsed["msg"],
        "Status line 3 has unrecognized value \"OK?\"\nC:\\scan"
    );
    assert!(!line.contains('\n'));
}
