//! Terminate a `tokio::process::Child` with SIGTERM, escalating to SIGKILL.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;

/// How long an audio player gets to exit after SIGTERM.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

/// Stop `child` and reap it.
///
/// On Unix the child gets SIGTERM and `grace` to exit, then SIGKILL. A child
/// that already exited is simply reaped. Elsewhere it is killed directly.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        debug!(?status, "Child already exited");
        return Ok(status);
    }

    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;
    let raw = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    warn!(pid, grace_ms = grace.as_millis(), "Child ignored SIGTERM, sending SIGKILL");
    child.kill().await?;
    child.wait().await
}
