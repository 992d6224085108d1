//! Toggle command handler.

use anyhow::Result;
use sonic_core::PlaybackWait;
use sonic_runtime::PidFile;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Advance `variable` exactly as its button would.
///
/// Takes the controller's pid file for the duration: a running controller
/// keeps the modes in memory and would not see the change, so the command
/// is refused while one is alive, and a controller cannot start mid-toggle.
pub async fn execute(ctx: &CliContext, variable: &str) -> Result<()> {
    let _owner = PidFile::acquire(&ctx.settings.pid_file).map_err(CliError::from)?;

    let toggles = ctx.toggle_store().map_err(CliError::from)?;
    let value = toggles.toggle(variable).await.map_err(CliError::from)?;

    // Dropping the context kills the player, so let the announcement finish.
    if ctx
        .playback
        .wait(ctx.settings.shutdown_announce_timeout())
        .await
        == PlaybackWait::TimedOut
    {
        ctx.playback.stop().await;
    }

    println!("{variable}={value}");
    Ok(())
}
