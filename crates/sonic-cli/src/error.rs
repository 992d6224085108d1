//! CLI error types and exit codes.
//!
//! Maps [`CoreError`] to exit codes and user-facing messages.

use sonic_core::{CoreError, SettingsError};
use sonic_runtime::PidFileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Another controller owns the persisted modes.
    #[error("{0}")]
    Busy(String),

    /// Argument error (unknown variable, bad message).
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Settings or persisted values are unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// GPIO or service manager unavailable.
    #[error("Device error: {0}")]
    Device(String),
}

impl CliError {
    /// Exit code following sysexits.h where one fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Busy(_) => 75,      // EX_TEMPFAIL
            Self::Arguments(_) => 64, // EX_USAGE
            Self::Io(_) => 74,        // EX_IOERR
            Self::Config(_) => 78,    // EX_CONFIG
            Self::Device(_) => 69,    // EX_UNAVAILABLE
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => Self::Config(msg),
            CoreError::Settings(e) => Self::from(e),
            e @ CoreError::Persist { .. } => Self::Io(e.to_string()),
            CoreError::Service(e) => Self::Device(e.to_string()),
            CoreError::Input(e) => Self::Device(e.to_string()),
            CoreError::Validation(msg) => Self::Arguments(msg),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PidFileError> for CliError {
    fn from(err: PidFileError) -> Self {
        match err {
            e @ PidFileError::Running { .. } => Self::Busy(e.to_string()),
            e @ PidFileError::Io { .. } => Self::Io(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error returned by a handler.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
        .map_or(1, CliError::exit_code)
}
