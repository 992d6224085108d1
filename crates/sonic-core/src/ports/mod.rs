//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core services expect from the
//! device: the service manager, speech synthesis, the audio player, the
//! mixer, power control, the persisted parameter script and GPIO input.
//!
//! # Design Rules
//!
//! - No process, shell or GPIO library types in any signature
//! - Intent-based methods (`restart`, `power_off`), not command lines
//! - Each port has its own error enum; services map them into [`CoreError`]

pub mod config_store;
pub mod input;
pub mod mixer;
pub mod player;
pub mod power;
pub mod service_manager;
pub mod speech;

use std::path::PathBuf;
use thiserror::Error;

pub use config_store::ConfigStorePort;
pub use input::{EdgeSender, PinInputPort};
pub use mixer::MixerPort;
pub use player::{AudioPlayerPort, PlaybackProcess};
pub use power::PowerPort;
pub use service_manager::ServiceManagerPort;
#[cfg(test)]
pub use service_manager::MockServiceManagerPort;
pub use speech::SpeechSynthesizerPort;

/// Errors from the OS service manager.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service manager could not be invoked at all.
    #[error("Failed to run service manager: {0}")]
    Unavailable(String),

    /// The service manager ran but reported failure.
    #[error("Failed to {action} {service}: {reason}")]
    CommandFailed {
        service: String,
        action: String,
        reason: String,
    },
}

/// Errors from the speech synthesizer.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The synthesis backend is missing or could not be started.
    #[error("Speech backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend ran but did not produce audio.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),
}

/// Errors from the audio player.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player process could not be spawned.
    #[error("Failed to start player for {path}: {reason}")]
    SpawnFailed { path: PathBuf, reason: String },

    /// The player process could not be terminated.
    #[error("Failed to terminate player: {0}")]
    TerminateFailed(String),

    /// Waiting on the player process failed.
    #[error("Failed to wait for player: {0}")]
    WaitFailed(String),
}

/// Errors from the mixer.
#[derive(Debug, Error)]
pub enum MixerError {
    #[error("Mixer command failed: {0}")]
    CommandFailed(String),
}

/// Errors from power control.
#[derive(Debug, Error)]
pub enum PowerError {
    #[error("Power-off command failed: {0}")]
    CommandFailed(String),
}

/// Errors from the persisted parameter store.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// Failed to read or write the backing file.
    #[error("Failed to access parameter file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The variable has no assignment in the store.
    #[error("Variable {0} is not assigned in the parameter file")]
    UnknownVariable(String),

    /// The variable is assigned but its line cannot be parsed.
    #[error("Malformed assignment for {variable}: {reason}")]
    Malformed { variable: String, reason: String },
}

/// Errors from GPIO input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The pin was never registered with `watch`.
    #[error("Pin {0} is not configured")]
    UnknownPin(u8),

    /// The pin is already registered.
    #[error("Pin {0} is already watched")]
    AlreadyWatched(u8),

    /// The GPIO backend reported an error.
    #[error("GPIO error: {0}")]
    Gpio(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted value is missing or outside its allowed set. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Writing a toggled value back to the store failed; the in-memory value was kept.
    #[error("Failed to persist {variable}: {source}")]
    Persist {
        variable: String,
        #[source]
        source: ConfigStoreError,
    },

    /// Service manager operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// GPIO registration failed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),
}
