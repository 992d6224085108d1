//! Core of the Sonic Sight button controller.
//!
//! Holds the domain types, the port traits that the OS adapters implement,
//! and the services that turn debounced button presses into spoken feedback,
//! volume changes, persisted mode toggles and the shutdown/stop long-press.
//!
//! Nothing in this crate spawns OS processes or touches GPIO directly; see
//! `sonic-runtime` for the adapters and `sonic-cli` for the composition root.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ButtonAction, EdgePolarity, PinBinding, RawEdge, ToggleGroup, VolumeDirection, clip_id,
};
pub use ports::{
    AudioPlayerPort, ConfigStoreError, ConfigStorePort, CoreError, EdgeSender, InputError,
    MixerError, MixerPort, PinInputPort, PlaybackError, PlaybackProcess, PowerError, PowerPort,
    ServiceError, ServiceManagerPort, SpeechError, SpeechSynthesizerPort,
};
pub use services::{
    Controller, ControllerContext, Debouncer, Dispatcher, LongPressConfig, LongPressDetector,
    LongPressOutcome, LongPressState, PlaybackManager, PlaybackWait, ToggleStore, VolumeControl,
};
pub use settings::{
    ButtonSettings, CommandSettings, Settings, SettingsError, load_settings, validate_settings,
};

// Silence unused dev-dependency warnings
#[cfg(test)]
use mockall as _;
