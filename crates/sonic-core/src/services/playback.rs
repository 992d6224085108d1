//! Spoken feedback with preemption.
//!
//! At most one playback process is alive at any time. A new message always
//! wins: the running process is terminated before the next one is spawned,
//! and the whole kill-and-replace sequence runs under one lock so that two
//! concurrent callers can never lose or double-kill a handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::clip_id;
use crate::ports::{AudioPlayerPort, PlaybackProcess, SpeechSynthesizerPort};

/// Result of waiting on the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackWait {
    /// The player exited on its own.
    Finished,
    /// The timeout elapsed first; playback continues in the background.
    TimedOut,
    /// Nothing was playing.
    Idle,
}

/// The single live playback.
struct PlaybackSession {
    message: String,
    clip: PathBuf,
    process: Box<dyn PlaybackProcess>,
}

/// Owns the live playback process and the clip cache.
pub struct PlaybackManager {
    sounds_dir: PathBuf,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    player: Arc<dyn AudioPlayerPort>,
    session: Mutex<Option<PlaybackSession>>,
}

impl PlaybackManager {
    pub fn new(
        sounds_dir: impl Into<PathBuf>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        player: Arc<dyn AudioPlayerPort>,
    ) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
            synthesizer,
            player,
            session: Mutex::new(None),
        }
    }

    /// Directory of the cached clips.
    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    /// Cached clip path for `message`.
    pub fn clip_path(&self, message: &str) -> PathBuf {
        self.sounds_dir.join(format!("{}.wav", clip_id(message)))
    }

    /// Speak `message`, preempting whatever is playing.
    ///
    /// Returns once playback has been started; does not wait for it to end.
    /// Synthesis on a cache miss blocks the caller. Every failure is logged
    /// and swallowed: feedback is best-effort.
    pub async fn speak(&self, message: &str) {
        let mut session = self.session.lock().await;
        self.replace(&mut session, message).await;
    }

    /// Speak `message` and wait up to `timeout` for it to finish.
    ///
    /// The session lock is held from the start of playback to the end of the
    /// wait, so no other message can preempt this one in between.
    pub async fn speak_and_wait(&self, message: &str, timeout: Duration) -> PlaybackWait {
        let mut session = self.session.lock().await;
        self.replace(&mut session, message).await;
        wait_on(&mut session, timeout).await
    }

    /// Wait up to `timeout` for the current message to finish.
    ///
    /// Holds the session lock while waiting.
    pub async fn wait(&self, timeout: Duration) -> PlaybackWait {
        let mut session = self.session.lock().await;
        wait_on(&mut session, timeout).await
    }

    async fn replace(&self, session: &mut Option<PlaybackSession>, message: &str) {
        if let Some(mut previous) = session.take() {
            debug!(message = %previous.message, pid = ?previous.process.id(), "Preempting playback");
            if let Err(e) = previous.process.terminate().await {
                warn!(error = %e, "Failed to terminate previous playback");
            }
        }

        let clip = self.clip_path(message);
        if !clip.exists() {
            info!(clip = %clip.display(), "No cached clip, synthesizing");
            if let Err(e) = self.synthesizer.synthesize(message, &clip).await {
                error!(clip = %clip.display(), error = %e, "Speech synthesis failed");
                // A partial clip would be served from the cache forever.
                if std::fs::remove_file(&clip).is_ok() {
                    debug!(clip = %clip.display(), "Removed partial clip");
                }
            }
        }

        debug!(message, clip = %clip.display(), "Starting playback");
        match self.player.play(&clip).await {
            Ok(process) => {
                *session = Some(PlaybackSession {
                    message: message.to_string(),
                    clip,
                    process,
                });
            }
            Err(e) => warn!(message, error = %e, "Playback failed"),
        }
    }

    /// Terminate the live playback, if any.
    pub async fn stop(&self) {
        if let Some(mut current) = self.session.lock().await.take() {
            debug!(clip = %current.clip.display(), "Stopping playback");
            if let Err(e) = current.process.terminate().await {
                warn!(error = %e, "Failed to terminate playback");
            }
        }
    }

    /// Message of the live session, if any.
    pub async fn current_message(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.message.clone())
    }
}

async fn wait_on(session: &mut Option<PlaybackSession>, timeout: Duration) -> PlaybackWait {
    let Some(current) = session.as_mut() else {
        return PlaybackWait::Idle;
    };

    match tokio::time::timeout(timeout, current.process.wait()).await {
        Ok(Ok(())) => {
            debug!(message = %current.message, "Playback finished");
            PlaybackWait::Finished
        }
        Ok(Err(e)) => {
            warn!(message = %current.message, error = %e, "Failed to wait for playback");
            PlaybackWait::Finished
        }
        Err(_) => {
            warn!(
                message = %current.message,
                timeout_ms = timeout.as_millis(),
                "Timed out waiting for playback"
            );
            PlaybackWait::TimedOut
        }
    }
}
