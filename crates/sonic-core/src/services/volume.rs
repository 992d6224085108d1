//! Volume buttons.

use std::sync::Arc;

use tracing::{debug, warn};

use super::playback::PlaybackManager;
use crate::domain::VolumeDirection;
use crate::ports::MixerPort;

/// Announces and applies one volume step.
pub struct VolumeControl {
    playback: Arc<PlaybackManager>,
    mixer: Arc<dyn MixerPort>,
    step_percent: u8,
}

impl VolumeControl {
    pub fn new(playback: Arc<PlaybackManager>, mixer: Arc<dyn MixerPort>, step_percent: u8) -> Self {
        Self {
            playback,
            mixer,
            step_percent,
        }
    }

    /// Speak "Volume up"/"Volume down", then step the mixer.
    ///
    /// Mixer failures are logged; the press is never retried.
    pub async fn adjust(&self, direction: VolumeDirection) {
        self.playback
            .speak(&format!("Volume {}", direction.label()))
            .await;

        debug!(direction = direction.label(), step = self.step_percent, "Adjusting volume");
        if let Err(e) = self.mixer.adjust(direction, self.step_percent).await {
            warn!(direction = direction.label(), error = %e, "Failed to adjust volume");
        }
    }
}
