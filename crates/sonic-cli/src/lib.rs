//! Command-line adapter for the Sonic Sight button controller.
//!
//! `bootstrap` is the composition root: it turns settings into concrete
//! adapters from `sonic-runtime` and hands them to the core services.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::{CliError, exit_code_for};
pub use parser::Cli;
