use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use mhaseq::process::navigate::PlayMode;

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\nmhaseq ", env!("MHASEQ_VERSION"),
        "\nbuilt ", env!("BUILD_TIMESTAMP"),
    ),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting and stepping through tracked ultrasound MHA sequences",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat header warnings as fatal errors.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// YAML calibration table replacing the built-in one.
    #[arg(long, global = true, value_name = "PATH")]
    pub calibration: Option<PathBuf>,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print sequence information
    Info(InfoArgs),

    /// Show a single frame and optionally dump its pixels.
    Frame(FrameArgs),

    /// Replay a list of navigation steps.
    Navigate(NavigateArgs),

    /// Play the sequence for a number of steps.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MHA sequence.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct FrameArgs {
    /// Input MHA sequence.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Frame to show. Negative goes to the last frame, past the end to the first.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub index: i64,

    /// Compose the tracked transform with the inverse calibration.
    #[arg(long)]
    pub apply_transforms: bool,

    /// Write the raw 8-bit pixels of the frame to this file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Input MHA sequence.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Steps: next, prev, next-valid, prev-valid, next-invalid, prev-invalid,
    /// random, play or goto:N.
    #[arg(value_name = "STEP", required = true)]
    pub steps: Vec<NavStep>,

    /// Play mode used by `play` steps.
    #[arg(long, value_enum, default_value_t = PlayModeArg::Forward)]
    pub mode: PlayModeArg,

    /// Compose the tracked transform with the inverse calibration.
    #[arg(long)]
    pub apply_transforms: bool,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Input MHA sequence.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Playback direction.
    #[arg(long, value_enum, default_value_t = PlayModeArg::Forward)]
    pub mode: PlayModeArg,

    /// Number of frames to play.
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub steps: u64,

    /// Compose the tracked transform with the inverse calibration.
    #[arg(long)]
    pub apply_transforms: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PlayModeArg {
    Forward,
    Backward,
    Random,
}

impl From<PlayModeArg> for PlayMode {
    fn from(mode: PlayModeArg) -> Self {
        match mode {
            PlayModeArg::Forward => PlayMode::Forward,
            PlayModeArg::Backward => PlayMode::Backward,
            PlayModeArg::Random => PlayMode::Random,
        }
    }
}

/// One navigation request of the `navigate` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    Next,
    Previous,
    NextValid,
    PreviousValid,
    NextInvalid,
    PreviousInvalid,
    Random,
    Play,
    GoTo(i64),
}

impl FromStr for NavStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(frame) = s.strip_prefix("goto:") {
            return frame
                .trim()
                .parse()
                .map(NavStep::GoTo)
                .map_err(|_| format!("invalid frame index in {s:?}"));
        }

        match s {
            "next" => Ok(NavStep::Next),
            "prev" => Ok(NavStep::Previous),
            "next-valid" => Ok(NavStep::NextValid),
            "prev-valid" => Ok(NavStep::PreviousValid),
            "next-invalid" => Ok(NavStep::NextInvalid),
            "prev-invalid" => Ok(NavStep::PreviousInvalid),
            "random" => Ok(NavStep::Random),
            "play" => Ok(NavStep::Play),
            _ => Err(format!("unknown step {s:?}")),
        }
    }
}

impl Display for NavStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NavStep::Next => f.write_str("next"),
            NavStep::Previous => f.write_str("prev"),
            NavStep::NextValid => f.write_str("next-valid"),
            NavStep::PreviousValid => f.write_str("prev-valid"),
            NavStep::NextInvalid => f.write_str("next-invalid"),
            NavStep::PreviousInvalid => f.write_str("prev-invalid"),
            NavStep::Random => f.write_str("random"),
            NavStep::Play => f.write_str("play"),
            NavStep::GoTo(frame) => write!(f, "goto:{frame}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_steps() {
        assert_eq!("next-valid".parse::<NavStep>().unwrap(), NavStep::NextValid);
        assert_eq!("goto:-1".parse::<NavStep>().unwrap(), NavStep::GoTo(-1));
        assert_eq!("goto: 12".parse::<NavStep>().unwrap(), NavStep::GoTo(12));
        assert!("goto:x".parse::<NavStep>().is_err());
        assert!("forward".parse::<NavStep>().is_err());

        for step in ["prev", "prev-invalid", "random", "play", "goto:3"] {
            assert_eq!(step.parse::<NavStep>().unwrap().to_string(), step);
        }
    }

    #[test]
    fn parses_navigate_command() {
        let cli = Cli::try_parse_from([
            "mhaseqd",
            "--strict",
            "navigate",
            "scan.mha",
            "next",
            "goto:-1",
            "--mode",
            "backward",
        ])
        .unwrap();

        assert!(cli.strict);
        let Commands::Navigate(args) = cli.command else {
            panic!("expected navigate");
        };
        assert_eq!(args.steps, [NavStep::Next, NavStep::GoTo(-1)]);
        assert_eq!(PlayMode::from(args.mode), PlayMode::Backward);
    }

    #[test]
    fn negative_frame_index() {
        let cli = Cli::try_parse_from(["mhaseqd", "frame", "scan.mha", "--index", "-1"]).unwrap();
        let Commands::Frame(args) = cli.command else {
            panic!("expected frame");
        };
        assert_eq!(args.index, -1);
        assert!(!args.apply_transforms);
    }
}
