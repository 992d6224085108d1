//! Small helpers for running device tools.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::debug;

/// Run `program` with `args` to completion, discarding its output.
pub(crate) async fn run_status<I, S>(program: &str, args: I) -> io::Result<ExitStatus>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    debug!(program, "Running command");
    cmd.status().await
}

/// Describe a non-zero exit for error messages.
pub(crate) fn describe_exit(status: ExitStatus) -> String {
    status.code().map_or_else(
        || "terminated by signal".to_string(),
        |code| format!("exited with status {code}"),
    )
}
