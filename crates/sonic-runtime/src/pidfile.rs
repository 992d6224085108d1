//! PID file of the process that owns the persisted modes: the running
//! controller, or a one-shot toggle while it writes.
//!
//! Format: the decimal PID and a newline. Written through a temp file and
//! rename, removed when the guard drops. A file naming a dead process is
//! stale and gets replaced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("sonic-buttons already running as pid {pid} (see {})", path.display())]
    Running { pid: u32, path: PathBuf },

    #[error("failed to write pid file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// PID of the live owner recorded in `path`.
///
/// A missing, unparsable or stale file means nobody owns the modes.
fn live_owner(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    let pid = content.trim().parse::<u32>().ok()?;
    pid_exists(pid).then_some(pid)
}

/// Marks this process as the owner of the modes until dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Record this process in `path`, unless another live owner is already
    /// recorded there.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, PidFileError> {
        let path = path.into();
        if let Some(pid) = live_owner(&path) {
            return Err(PidFileError::Running { pid, path });
        }

        write_pid(&path, std::process::id()).map_err(|source| PidFileError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Wrote pid file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed pid file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove pid file"),
        }
    }
}

fn write_pid(path: &Path, pid: u32) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("pid.tmp");
    fs::write(&tmp, format!("{pid}\n"))?;
    fs::rename(&tmp, path)
}

/// Whether a process with `pid` exists, checked with the null signal.
#[cfg(unix)]
fn pid_exists(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists, owned by someone else.
        Err(_) => true,
    }
}

#[cfg(not(unix))]
fn pid_exists(_pid: u32) -> bool {
    false
}
