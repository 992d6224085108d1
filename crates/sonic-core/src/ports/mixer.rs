//! Mixer port.

use async_trait::async_trait;

use super::MixerError;
use crate::domain::VolumeDirection;

/// Applies relative volume changes to the speaker output.
#[async_trait]
pub trait MixerPort: Send + Sync {
    /// Move the volume `step_percent` percent in `direction`.
    async fn adjust(&self, direction: VolumeDirection, step_percent: u8) -> Result<(), MixerError>;
}
