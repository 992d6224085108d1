//! OS adapters for the Sonic Sight button controller.
//!
//! Every port declared in `sonic-core` has one implementation here, backed
//! by the command-line tools found on the device (`systemctl`, `pico2wave`,
//! `cvlc`, `amixer`, `shutdown`) or by GPIO. The simulated input and the
//! dry-run adapters let the controller run on a workstation.
#![deny(unsafe_code)]

mod command;
pub mod input;
pub mod pidfile;
pub mod ports_impl;
pub mod process;

pub use input::{SimCommand, SimCommandError, SimulatedInput};
#[cfg(feature = "rpi")]
pub use input::RppalInput;
pub use pidfile::{PidFile, PidFileError};
pub use ports_impl::{
    AmixerMixer, CommandPower, DryRunPower, DryRunServiceManager, Pico2WaveSynthesizer,
    ProcessPlayer, ShellVarFile, SystemctlServiceManager,
};
pub use process::shutdown_child;
