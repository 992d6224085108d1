//! Speech synthesis port.

use std::path::Path;

use async_trait::async_trait;

use super::SpeechError;

/// Renders text to a WAV file.
///
/// Called on a cache miss, so it blocks the speaking task until the file
/// exists. Failures are never fatal to the caller.
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// Synthesize `text` into `target`.
    async fn synthesize(&self, text: &str, target: &Path) -> Result<(), SpeechError>;
}
