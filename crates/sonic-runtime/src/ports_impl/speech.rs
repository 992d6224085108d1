//! `pico2wave` speech synthesis.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sonic_core::{SpeechError, SpeechSynthesizerPort};
use tracing::debug;

use crate::command::{describe_exit, run_status};

/// Renders text to a WAV file with `pico2wave -w <file> <text>`.
#[derive(Debug, Clone)]
pub struct Pico2WaveSynthesizer {
    program: String,
}

impl Pico2WaveSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn render(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        let args = [OsStr::new("-w"), output.as_os_str(), OsStr::new(text)];
        let status = run_status(&self.program, args)
            .await
            .map_err(|e| SpeechError::BackendUnavailable(format!("{}: {e}", self.program)))?;

        if !status.success() {
            return Err(SpeechError::SynthesisFailed(describe_exit(status)));
        }
        if !output.exists() {
            return Err(SpeechError::SynthesisFailed(format!(
                "{} produced no file at {}",
                self.program,
                output.display()
            )));
        }
        Ok(())
    }
}

/// Sibling of `target` that `pico2wave` writes into. Keeps the `.wav`
/// extension, which selects the output format.
fn partial_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{stem}.partial.wav"))
}

#[async_trait]
impl SpeechSynthesizerPort for Pico2WaveSynthesizer {
    /// Renders into a temporary sibling and renames it over `target` only on
    /// success, so `target` is either a complete clip or absent.
    async fn synthesize(&self, text: &str, target: &Path) -> Result<(), SpeechError> {
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| SpeechError::SynthesisFailed(format!("{}: {e}", dir.display())))?;
        }

        let partial = partial_path(target);
        let mut result = self.render(text, &partial).await;
        if result.is_ok() {
            result = tokio::fs::rename(&partial, target)
                .await
                .map_err(|e| SpeechError::SynthesisFailed(format!("{}: {e}", target.display())));
        }

        if result.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
            return result;
        }
        debug!(clip = %target.display(), "Synthesized clip");
        Ok(())
    }
}
