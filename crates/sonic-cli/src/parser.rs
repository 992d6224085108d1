//! Root CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Button controller for the Sonic Sight depth-to-sound device.
///
/// Without a subcommand the controller runs on the GPIO header.
#[derive(Parser)]
#[command(name = "sonic-buttons")]
#[command(about = "Handle the Sonic Sight hardware buttons")]
#[command(version)]
pub struct Cli {
    /// JSON settings file; built-in defaults when omitted
    #[arg(long, global = true, env = "SONIC_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Override the launch script holding the persisted modes
    #[arg(long, global = true, env = "SONIC_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Override the directory of cached voice clips
    #[arg(long = "sounds-dir", global = true, env = "SONIC_SOUNDS_DIR")]
    pub sounds_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run, `run` when none was given.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { simulate: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        <Cli as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn no_subcommand_runs_controller() {
        let cli = Cli::parse_from(["sonic-buttons"]);
        assert!(matches!(cli.command(), Commands::Run { simulate: false }));
    }

    #[test]
    fn global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "sonic-buttons",
            "run",
            "--simulate",
            "-v",
            "--script",
            "/tmp/run-with-parameters.sh",
            "--sounds-dir",
            "/tmp/sounds",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.script, Some(PathBuf::from("/tmp/run-with-parameters.sh")));
        assert_eq!(cli.sounds_dir, Some(PathBuf::from("/tmp/sounds")));
        assert!(matches!(cli.command(), Commands::Run { simulate: true }));
    }

    #[test]
    fn speak_takes_whole_message() {
        let cli = Cli::parse_from(["sonic-buttons", "speak", "Volume up"]);
        assert!(matches!(cli.command(), Commands::Speak { message } if message == "Volume up"));
    }

    #[test]
    fn toggle_requires_variable() {
        assert!(Cli::try_parse_from(["sonic-buttons", "toggle"]).is_err());
        let cli = Cli::parse_from(["sonic-buttons", "toggle", "RANGE"]);
        assert!(matches!(cli.command(), Commands::Toggle { variable } if variable == "RANGE"));
    }
}
