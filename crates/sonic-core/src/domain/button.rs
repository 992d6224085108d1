//! Button, pin and edge types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// What a button does when its debounced press is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ButtonAction {
    /// Raise the speaker volume one step.
    VolumeUp,
    /// Lower the speaker volume one step.
    VolumeDown,
    /// Long press powers the device off, short press toggles the rendering service.
    ShutdownOrStop,
    /// Advance a persisted toggle group to its next value.
    Toggle {
        /// Name of the persisted variable (e.g. `RANGE`).
        variable: String,
    },
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VolumeUp => write!(f, "volume_up"),
            Self::VolumeDown => write!(f, "volume_down"),
            Self::ShutdownOrStop => write!(f, "shutdown_or_stop"),
            Self::Toggle { variable } => write!(f, "toggle({variable})"),
        }
    }
}

/// Which edge of the input signal counts as a press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolarity {
    /// Low to high. Buttons are wired with pull-downs, so this is a press.
    #[default]
    Rising,
    /// High to low.
    Falling,
}

/// A button wired to a physical input line.
///
/// Immutable once registered with the controller; lives as long as the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinBinding {
    /// Human-readable button name, used in logs and by the simulator.
    pub name: String,
    /// GPIO line number (BCM numbering).
    pub pin: u8,
    /// Edge that triggers the handler.
    pub edge: EdgePolarity,
    /// Minimum time between two accepted presses on this pin.
    pub debounce_window: Duration,
    /// Handler to run for each accepted press.
    pub action: ButtonAction,
}

impl PinBinding {
    /// Create a rising-edge binding.
    pub fn new(
        name: impl Into<String>,
        pin: u8,
        debounce_window: Duration,
        action: ButtonAction,
    ) -> Self {
        Self {
            name: name.into(),
            pin,
            edge: EdgePolarity::Rising,
            debounce_window,
            action,
        }
    }

    /// Use a different trigger edge.
    #[must_use]
    pub const fn with_edge(mut self, edge: EdgePolarity) -> Self {
        self.edge = edge;
        self
    }
}

/// A raw, not yet debounced, edge reported by the input adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEdge {
    /// Line that saw the edge.
    pub pin: u8,
    /// When the edge was observed.
    pub at: Instant,
}

impl RawEdge {
    /// Edge observed now on `pin`.
    pub fn now(pin: u8) -> Self {
        Self {
            pin,
            at: Instant::now(),
        }
    }
}

/// Direction of a relative volume change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeDirection {
    Up,
    Down,
}

impl VolumeDirection {
    /// Word used in spoken feedback.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Sign suffix understood by the mixer (`5%+`, `5%-`).
    pub const fn sign(self) -> char {
        match self {
            Self::Up => '+',
            Self::Down => '-',
        }
    }
}
