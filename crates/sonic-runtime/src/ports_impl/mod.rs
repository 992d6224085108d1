//! Port implementations backed by device command-line tools.

mod dry_run;
mod mixer;
mod player;
mod power;
mod script_store;
mod service_manager;
mod speech;

pub use dry_run::{DryRunPower, DryRunServiceManager};
pub use mixer::AmixerMixer;
pub use player::{ChildPlayback, ProcessPlayer};
pub use power::CommandPower;
pub use script_store::ShellVarFile;
pub use service_manager::SystemctlServiceManager;
pub use speech::Pico2WaveSynthesizer;
