//! GPIO input adapters.

#[cfg(feature = "rpi")]
mod gpio;
mod simulated;

#[cfg(feature = "rpi")]
pub use gpio::RppalInput;
pub use simulated::{SimCommand, SimCommandError, SimulatedInput};
