//! Settings domain types and validation.
//!
//! Settings describe the device: where the parameter script and the cached
//! voice clips live, which service to control, the button wiring, and the
//! timing constants of the controller. Defaults reproduce the shipped
//! Sonic Sight board, so an absent settings file is a valid configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ButtonAction, EdgePolarity, PinBinding, ToggleGroup};

/// Service that renders depth to sound and reads the parameter script.
pub const DEFAULT_SERVICE_NAME: &str = "sonic-sight.service";

/// Minimum time between two accepted presses of the same button.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// How long the shutdown button must be held to power off.
pub const DEFAULT_HOLD_THRESHOLD_MS: u64 = 3000;

/// How often the shutdown button level is sampled while held.
pub const DEFAULT_HOLD_POLL_MS: u64 = 200;

/// How long to let the shutdown warning play before powering off.
pub const DEFAULT_SHUTDOWN_ANNOUNCE_TIMEOUT_MS: u64 = 10_000;

/// Slack on top of hold and announcement when draining at shutdown, for
/// synthesis and the power-off command itself.
pub const SHUTDOWN_DRAIN_MARGIN_MS: u64 = 5_000;

/// Application settings.
///
/// Every field falls back to the device default when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shell script holding the `NAME="VALUE"` mode variables.
    pub script_path: PathBuf,

    /// Directory of cached `<clip>.wav` voice messages.
    pub sounds_dir: PathBuf,

    /// Written by the running controller; one-shot commands that change the
    /// persisted modes refuse to run while it names a live process.
    pub pid_file: PathBuf,

    /// Rendering service restarted after a toggle and started/stopped by a short press.
    pub service_name: String,

    /// Control the service in the user's session manager (`systemctl --user`).
    pub user_services: bool,

    /// Default debounce window for every button.
    pub debounce_ms: u64,

    /// Long-press threshold of the shutdown button.
    pub hold_threshold_ms: u64,

    /// Sampling interval while the shutdown button is held.
    pub hold_poll_ms: u64,

    /// Upper bound on waiting for the shutdown warning to play.
    pub shutdown_announce_timeout_ms: u64,

    /// Volume change per button press, in percent.
    pub volume_step_percent: u8,

    /// Maximum number of button handlers running at once.
    pub max_concurrent_handlers: usize,

    /// Button wiring.
    pub buttons: Vec<ButtonSettings>,

    /// Persisted mode groups that toggle buttons cycle through.
    pub toggle_groups: Vec<ToggleGroup>,

    /// External commands used by the OS adapters.
    pub commands: CommandSettings,
}

/// One button in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSettings {
    /// Button name, used in logs and by the simulator.
    pub name: String,
    /// GPIO line (BCM numbering).
    pub pin: u8,
    /// Trigger edge.
    #[serde(default)]
    pub edge: EdgePolarity,
    /// Per-button debounce override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    /// Handler bound to the button.
    #[serde(flatten)]
    pub action: ButtonAction,
}

impl ButtonSettings {
    pub fn new(name: impl Into<String>, pin: u8, action: ButtonAction) -> Self {
        Self {
            name: name.into(),
            pin,
            edge: EdgePolarity::Rising,
            debounce_ms: None,
            action,
        }
    }
}

/// Command lines of the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Media player binary (VLC console interface).
    pub player: String,
    /// Player gain passed as `--gain`.
    pub player_gain: f32,
    /// Text-to-speech binary.
    pub synthesizer: String,
    /// Service manager binary.
    pub systemctl: String,
    /// ALSA mixer binary.
    pub mixer: String,
    /// ALSA card index of the speaker.
    pub mixer_card: u32,
    /// Mixer control adjusted by the volume buttons.
    pub mixer_control: String,
    /// Full argv of the power-off command.
    pub power_off: Vec<String>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            player: "cvlc".to_string(),
            player_gain: 0.5,
            synthesizer: "pico2wave".to_string(),
            systemctl: "systemctl".to_string(),
            mixer: "amixer".to_string(),
            mixer_card: 1,
            mixer_control: "Speaker".to_string(),
            power_off: ["sudo", "shutdown", "-P", "now"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Settings of the shipped device.
    ///
    /// Pins use BCM numbering; the board header pins 21, 19, 7, 13 and 11
    /// are BCM 9, 10, 4, 27 and 17.
    pub fn with_defaults() -> Self {
        Self {
            script_path: PathBuf::from("/home/sonic/sonic-sight/run-with-parameters.sh"),
            sounds_dir: PathBuf::from("/home/sonic/sonic-sight/scripts/sounds"),
            pid_file: PathBuf::from("/tmp/sonic-buttons.pid"),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            user_services: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            hold_threshold_ms: DEFAULT_HOLD_THRESHOLD_MS,
            hold_poll_ms: DEFAULT_HOLD_POLL_MS,
            shutdown_announce_timeout_ms: DEFAULT_SHUTDOWN_ANNOUNCE_TIMEOUT_MS,
            volume_step_percent: 5,
            max_concurrent_handlers: 8,
            buttons: vec![
                ButtonSettings::new("volume_up", 9, ButtonAction::VolumeUp),
                ButtonSettings::new("volume_down", 10, ButtonAction::VolumeDown),
                ButtonSettings::new("shutdown_or_stop", 4, ButtonAction::ShutdownOrStop),
                ButtonSettings::new(
                    "switch_distance",
                    27,
                    ButtonAction::Toggle {
                        variable: "RANGE".to_string(),
                    },
                ),
                ButtonSettings::new(
                    "switch_frequency_doubling",
                    17,
                    ButtonAction::Toggle {
                        variable: "FREQUENCY".to_string(),
                    },
                ),
            ],
            toggle_groups: vec![
                ToggleGroup::new("RANGE", "distance", ["INSIDE", "STREET"]),
                ToggleGroup::new("FREQUENCY", "frequency doubling", ["CONSTANT", "DOUBLING"]),
            ],
            commands: CommandSettings::default(),
        }
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.hold_threshold_ms)
    }

    pub const fn hold_poll(&self) -> Duration {
        Duration::from_millis(self.hold_poll_ms)
    }

    pub const fn shutdown_announce_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_announce_timeout_ms)
    }

    /// How long a stopping controller waits for in-flight presses: enough
    /// for a press that just started to hold, announce and power off.
    pub const fn shutdown_drain_grace(&self) -> Duration {
        Duration::from_millis(
            self.hold_threshold_ms
                .saturating_add(self.shutdown_announce_timeout_ms)
                .saturating_add(SHUTDOWN_DRAIN_MARGIN_MS),
        )
    }

    /// Resolve the configured buttons into pin bindings.
    pub fn bindings(&self) -> Vec<PinBinding> {
        self.buttons
            .iter()
            .map(|button| {
                let window = Duration::from_millis(button.debounce_ms.unwrap_or(self.debounce_ms));
                PinBinding::new(&button.name, button.pin, window, button.action.clone())
                    .with_edge(button.edge)
            })
            .collect()
    }

    /// Look up a toggle group by variable name.
    pub fn group(&self, variable: &str) -> Option<&ToggleGroup> {
        self.toggle_groups.iter().find(|g| g.variable == variable)
    }
}

/// Settings loading and validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse settings file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Debounce window must be greater than zero")]
    ZeroDebounce,

    #[error("Hold poll interval ({poll_ms} ms) must be non-zero and shorter than the hold threshold ({threshold_ms} ms)")]
    InvalidHoldTiming { poll_ms: u64, threshold_ms: u64 },

    #[error("Volume step must be between 1 and 100 percent, got {0}")]
    InvalidVolumeStep(u8),

    #[error("At least one concurrent handler is required")]
    ZeroConcurrency,

    #[error("Pin {0} is bound to more than one button")]
    DuplicatePin(u8),

    #[error("Button name {0:?} is used more than once")]
    DuplicateButtonName(String),

    #[error("Only one button may be bound to shutdown_or_stop")]
    MultipleShutdownButtons,

    #[error("Button {button:?} toggles unknown variable {variable}")]
    UnknownToggleGroup { button: String, variable: String },

    #[error("Toggle group {0} is defined more than once")]
    DuplicateGroup(String),

    #[error("Toggle group {0} has no values")]
    EmptyGroup(String),

    #[error("Toggle group {variable} lists {value:?} more than once")]
    DuplicateGroupValue { variable: String, value: String },

    #[error("Invalid variable name {0:?}: use letters, digits and underscores")]
    InvalidVariableName(String),

    #[error("Power-off command cannot be empty")]
    EmptyPowerOffCommand,

    #[error("Service name cannot be empty")]
    EmptyServiceName,
}

fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.debounce_ms == 0 || settings.buttons.iter().any(|b| b.debounce_ms == Some(0)) {
        return Err(SettingsError::ZeroDebounce);
    }

    if settings.hold_poll_ms == 0 || settings.hold_poll_ms >= settings.hold_threshold_ms {
        return Err(SettingsError::InvalidHoldTiming {
            poll_ms: settings.hold_poll_ms,
            threshold_ms: settings.hold_threshold_ms,
        });
    }

    if !(1..=100).contains(&settings.volume_step_percent) {
        return Err(SettingsError::InvalidVolumeStep(
            settings.volume_step_percent,
        ));
    }

    if settings.max_concurrent_handlers == 0 {
        return Err(SettingsError::ZeroConcurrency);
    }

    if settings.service_name.trim().is_empty() {
        return Err(SettingsError::EmptyServiceName);
    }

    if settings.commands.power_off.is_empty() {
        return Err(SettingsError::EmptyPowerOffCommand);
    }

    let mut variables = HashSet::new();
    for group in &settings.toggle_groups {
        if !is_valid_variable_name(&group.variable) {
            return Err(SettingsError::InvalidVariableName(group.variable.clone()));
        }
        if !variables.insert(group.variable.as_str()) {
            return Err(SettingsError::DuplicateGroup(group.variable.clone()));
        }
        if group.values.is_empty() {
            return Err(SettingsError::EmptyGroup(group.variable.clone()));
        }
        let mut seen = HashSet::new();
        for value in &group.values {
            if !seen.insert(value.as_str()) {
                return Err(SettingsError::DuplicateGroupValue {
                    variable: group.variable.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    let mut pins = HashSet::new();
    let mut names = HashSet::new();
    let mut shutdown_buttons = 0;
    for button in &settings.buttons {
        if !pins.insert(button.pin) {
            return Err(SettingsError::DuplicatePin(button.pin));
        }
        if !names.insert(button.name.as_str()) {
            return Err(SettingsError::DuplicateButtonName(button.name.clone()));
        }
        match &button.action {
            ButtonAction::ShutdownOrStop => shutdown_buttons += 1,
            ButtonAction::Toggle { variable } if !variables.contains(variable.as_str()) => {
                return Err(SettingsError::UnknownToggleGroup {
                    button: button.name.clone(),
                    variable: variable.clone(),
                });
            }
            _ => {}
        }
    }
    if shutdown_buttons > 1 {
        return Err(SettingsError::MultipleShutdownButtons);
    }

    Ok(())
}

/// Load settings from a JSON file and validate them.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let settings: Settings = serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_settings(&settings)?;
    Ok(settings)
}
