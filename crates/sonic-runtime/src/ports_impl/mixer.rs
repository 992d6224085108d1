//! ALSA mixer through `amixer`.

use async_trait::async_trait;
use sonic_core::{MixerError, MixerPort, VolumeDirection};
use tracing::debug;

use crate::command::{describe_exit, run_status};

/// Steps one simple mixer control: `amixer -c <card> sset <control> <n>%+`.
#[derive(Debug, Clone)]
pub struct AmixerMixer {
    program: String,
    card: u32,
    control: String,
}

impl AmixerMixer {
    pub fn new(program: impl Into<String>, card: u32, control: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            card,
            control: control.into(),
        }
    }

    fn args(&self, direction: VolumeDirection, step_percent: u8) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.card.to_string(),
            "sset".to_string(),
            self.control.clone(),
            format!("{step_percent}%{}", direction.sign()),
        ]
    }
}

#[async_trait]
impl MixerPort for AmixerMixer {
    async fn adjust(&self, direction: VolumeDirection, step_percent: u8) -> Result<(), MixerError> {
        let args = self.args(direction, step_percent);
        debug!(?args, "Adjusting mixer");
        let status = run_status(&self.program, &args)
            .await
            .map_err(|e| MixerError::CommandFailed(format!("{}: {e}", self.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(MixerError::CommandFailed(describe_exit(status)))
        }
    }
}
