//! Speak command handler.

use anyhow::Result;
use sonic_core::PlaybackWait;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Speak `message` and wait for it to finish, bounded by the shutdown
/// announcement timeout.
pub async fn execute(ctx: &CliContext, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(CliError::Arguments("message is empty".to_string()).into());
    }

    ctx.playback.speak(message).await;
    match ctx
        .playback
        .wait(ctx.settings.shutdown_announce_timeout())
        .await
    {
        PlaybackWait::Finished => {}
        PlaybackWait::TimedOut => {
            ctx.playback.stop().await;
            println!("Playback did not finish in time and was stopped.");
        }
        PlaybackWait::Idle => {
            return Err(CliError::Device(format!(
                "could not play {}",
                ctx.playback.clip_path(message).display()
            ))
            .into());
        }
    }
    Ok(())
}
