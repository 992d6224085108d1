//! Command handlers.
//!
//! Each handler is a thin wrapper: build what the command needs from the
//! [`CliContext`](crate::CliContext), call the core service, print the result.

pub mod check;
pub mod run;
pub mod speak;
pub mod status;
pub mod toggle;
