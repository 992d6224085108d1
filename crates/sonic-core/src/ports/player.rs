//! Audio player port.
//!
//! Playback runs as a separate process so it can be preempted at any time.
//! The player hands back an owned [`PlaybackProcess`]; only the playback
//! manager ever holds one.

use std::path::Path;

use async_trait::async_trait;

use super::PlaybackError;

/// A running playback process.
#[async_trait]
pub trait PlaybackProcess: Send {
    /// OS process id, if the process is still known.
    fn id(&self) -> Option<u32>;

    /// Stop playback immediately. Must succeed if the process already exited.
    async fn terminate(&mut self) -> Result<(), PlaybackError>;

    /// Wait for playback to finish on its own.
    ///
    /// Must be cancel-safe: callers bound it with `tokio::time::timeout`.
    async fn wait(&mut self) -> Result<(), PlaybackError>;
}

/// Starts playback of audio clips.
#[async_trait]
pub trait AudioPlayerPort: Send + Sync {
    /// Start playing `clip` in the background and return without waiting.
    async fn play(&self, clip: &Path) -> Result<Box<dyn PlaybackProcess>, PlaybackError>;
}
