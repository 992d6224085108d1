//! Subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the button controller until SIGINT/SIGTERM
    Run {
        /// Read button presses from stdin instead of GPIO
        /// (`press|release|tap <pin|name>`, `hold <pin|name> <ms>`)
        #[arg(long)]
        simulate: bool,
    },

    /// Speak a message through the feedback pipeline and wait for it
    Speak {
        /// Text to speak
        message: String,
    },

    /// Show the persisted modes and the rendering service state
    Status,

    /// Advance one mode to its next value, persist it and restart the service
    /// (refused while the controller runs)
    Toggle {
        /// Variable name in the launch script (e.g. RANGE)
        variable: String,
    },

    /// Validate settings and persisted modes, then list the button bindings
    Check,
}
