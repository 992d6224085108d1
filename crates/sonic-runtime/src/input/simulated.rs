//! Keyboard-driven stand-in for the GPIO header.
//!
//! Reads one command per line:
//!
//! ```text
//! press <pin|name>
//! release <pin|name>
//! tap <pin|name>
//! hold <pin|name> <ms>
//! ```
//!
//! End of input releases every line, which closes the edge channel and lets
//! the controller drain and exit.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sonic_core::{EdgePolarity, EdgeSender, InputError, PinBinding, PinInputPort, RawEdge};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// How long a `tap` keeps the button down.
const TAP_DURATION: Duration = Duration::from_millis(50);

/// A parsed simulator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    Press(String),
    Release(String),
    Tap(String),
    Hold(String, Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}, expected press, release, tap or hold")]
    UnknownCommand(String),

    #[error("{0} needs a pin number or button name")]
    MissingTarget(&'static str),

    #[error("hold needs a duration in milliseconds, got {0:?}")]
    InvalidDuration(String),
}

impl FromStr for SimCommand {
    type Err = SimCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(SimCommandError::Empty)?;
        let mut target = |verb: &'static str| {
            words
                .next()
                .map(str::to_string)
                .ok_or(SimCommandError::MissingTarget(verb))
        };

        match verb {
            "press" | "p" => Ok(Self::Press(target("press")?)),
            "release" | "r" => Ok(Self::Release(target("release")?)),
            "tap" | "t" => Ok(Self::Tap(target("tap")?)),
            "hold" | "h" => {
                let pin = target("hold")?;
                let raw = words.next().unwrap_or_default();
                let ms = raw
                    .parse::<u64>()
                    .map_err(|_| SimCommandError::InvalidDuration(raw.to_string()))?;
                Ok(Self::Hold(pin, Duration::from_millis(ms)))
            }
            other => Err(SimCommandError::UnknownCommand(other.to_string())),
        }
    }
}

struct Line {
    name: String,
    edge: EdgePolarity,
    held: bool,
    events: EdgeSender,
}

/// In-memory input lines, pressed and released by commands.
#[derive(Default)]
pub struct SimulatedInput {
    lines: Mutex<HashMap<u8, Line>>,
}

impl SimulatedInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self) -> MutexGuard<'_, HashMap<u8, Line>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve a pin number or button name to a watched pin.
    pub fn resolve(&self, target: &str) -> Option<u8> {
        let lines = self.lines();
        if let Ok(pin) = target.parse::<u8>() {
            return lines.contains_key(&pin).then_some(pin);
        }
        lines
            .iter()
            .find(|(_, line)| line.name == target)
            .map(|(pin, _)| *pin)
    }

    fn set_level(&self, target: &str, held: bool) -> Result<u8, InputError> {
        let pin = self
            .resolve(target)
            .ok_or_else(|| InputError::Gpio(format!("no watched button {target:?}")))?;
        let mut lines = self.lines();
        let line = lines.get_mut(&pin).ok_or(InputError::UnknownPin(pin))?;
        if line.held == held {
            return Ok(pin);
        }
        line.held = held;

        let fires = match line.edge {
            EdgePolarity::Rising => held,
            EdgePolarity::Falling => !held,
        };
        if fires && line.events.send(RawEdge::now(pin)).is_err() {
            debug!(pin, "Edge receiver gone");
        }
        debug!(pin, button = %line.name, held, "Simulated level change");
        Ok(pin)
    }

    /// Push the button down.
    pub fn press(&self, target: &str) -> Result<u8, InputError> {
        self.set_level(target, true)
    }

    /// Let the button go.
    pub fn release(&self, target: &str) -> Result<u8, InputError> {
        self.set_level(target, false)
    }

    /// Press and release after `duration`.
    pub async fn hold(&self, target: &str, duration: Duration) -> Result<u8, InputError> {
        let pin = self.press(target)?;
        tokio::time::sleep(duration).await;
        self.release(target)?;
        Ok(pin)
    }

    pub async fn execute(&self, command: &SimCommand) -> Result<u8, InputError> {
        match command {
            SimCommand::Press(target) => self.press(target),
            SimCommand::Release(target) => self.release(target),
            SimCommand::Tap(target) => self.hold(target, TAP_DURATION).await,
            SimCommand::Hold(target, duration) => self.hold(target, *duration).await,
        }
    }

    /// Execute commands from `reader` until end of input, then release all
    /// lines.
    pub async fn run_script<R>(&self, reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<SimCommand>() {
                Ok(command) => {
                    if let Err(e) = self.execute(&command).await {
                        warn!(command = line, error = %e, "Simulator command failed");
                    }
                }
                Err(e) => warn!(command = line, error = %e, "Invalid simulator command"),
            }
        }
        info!("Simulator input closed, releasing buttons");
        self.release_all();
        Ok(())
    }
}

impl PinInputPort for SimulatedInput {
    fn watch(&self, binding: &PinBinding, events: EdgeSender) -> Result<(), InputError> {
        let mut lines = self.lines();
        if lines.contains_key(&binding.pin) {
            return Err(InputError::AlreadyWatched(binding.pin));
        }
        lines.insert(
            binding.pin,
            Line {
                name: binding.name.clone(),
                edge: binding.edge,
                held: false,
                events,
            },
        );
        Ok(())
    }

    fn level(&self, pin: u8) -> Result<bool, InputError> {
        self.lines()
            .get(&pin)
            .map(|line| line.held)
            .ok_or(InputError::UnknownPin(pin))
    }

    fn release_all(&self) {
        self.lines().clear();
    }
}
