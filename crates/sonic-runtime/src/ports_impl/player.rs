//! Audio playback through an external player process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sonic_core::{AudioPlayerPort, PlaybackError, PlaybackProcess};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::process::{DEFAULT_GRACE, shutdown_child};

/// Spawns `<program> <args...> <clip>` for every clip.
#[derive(Debug, Clone)]
pub struct ProcessPlayer {
    program: String,
    args: Vec<String>,
    grace: Duration,
}

impl ProcessPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            grace: DEFAULT_GRACE,
        }
    }

    /// VLC without an interface, exiting when the clip ends.
    pub fn cvlc(program: impl Into<String>, gain: f32) -> Self {
        Self::new(
            program,
            vec!["--play-and-exit".to_string(), format!("--gain={gain}")],
        )
    }
}

#[async_trait]
impl AudioPlayerPort for ProcessPlayer {
    async fn play(&self, clip: &Path) -> Result<Box<dyn PlaybackProcess>, PlaybackError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::SpawnFailed {
                path: clip.to_path_buf(),
                reason: format!("{}: {e}", self.program),
            })?;

        debug!(pid = ?child.id(), clip = %clip.display(), "Spawned player");
        Ok(Box::new(ChildPlayback {
            child,
            clip: clip.to_path_buf(),
            grace: self.grace,
        }))
    }
}

/// A running player process.
#[derive(Debug)]
pub struct ChildPlayback {
    child: Child,
    clip: PathBuf,
    grace: Duration,
}

#[async_trait]
impl PlaybackProcess for ChildPlayback {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn terminate(&mut self) -> Result<(), PlaybackError> {
        let status = shutdown_child(&mut self.child, self.grace)
            .await
            .map_err(|e| PlaybackError::TerminateFailed(e.to_string()))?;
        debug!(clip = %self.clip.display(), ?status, "Player terminated");
        Ok(())
    }

    async fn wait(&mut self) -> Result<(), PlaybackError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| PlaybackError::WaitFailed(e.to_string()))?;
        debug!(clip = %self.clip.display(), ?status, "Player exited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shell player that ignores the clip and runs `script`.
    fn shell(script: &str) -> ProcessPlayer {
        ProcessPlayer::new("sh", vec!["-c".to_string(), script.to_string(), "sh".to_string()])
    }

    #[test]
    fn cvlc_arguments() {
        let player = ProcessPlayer::cvlc("cvlc", 0.5);
        assert_eq!(player.args, vec!["--play-and-exit", "--gain=0.5"]);
    }

    #[tokio::test]
    async fn wait_returns_when_player_exits() {
        let mut process = shell("exit 0").play(Path::new("volume_up.wav")).await.unwrap();
        process.wait().await.unwrap();
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_stops_long_running_player() {
        let mut process = shell("exec sleep 30")
            .play(Path::new("volume_up.wav"))
            .await
            .unwrap();
        assert!(process.id().is_some());

        tokio::time::timeout(Duration::from_secs(5), process.terminate())
            .await
            .unwrap()
            .unwrap();
        // A reaped player reports no pid and waits without blocking.
        assert_eq!(process.id(), None);
        process.wait().await.unwrap();
    }

    #[tokio::test]
    async fn missing_player_fails_to_spawn() {
        let player = ProcessPlayer::new("/nonexistent/cvlc", Vec::new());
        assert!(matches!(
            player.play(Path::new("volume_up.wav")).await,
            Err(PlaybackError::SpawnFailed { .. })
        ));
    }
}
