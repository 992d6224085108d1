//! Run command handler: the long-running controller.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use sonic_core::{Controller, PinInputPort};
use sonic_runtime::{PidFile, SimulatedInput};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Run the controller until `shutdown` resolves.
///
/// The controller owns the persisted modes while it runs, which the pid file
/// announces to one-shot commands. With `simulate`, button presses are read
/// from stdin, services and power-off are only logged, and end of input
/// stops the controller once in-flight handlers are done.
pub async fn execute<F>(ctx: &CliContext, simulate: bool, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let pidfile = PidFile::acquire(&ctx.settings.pid_file).map_err(CliError::from)?;
    info!(pid_file = %pidfile.path().display(), "Controller starting");

    if simulate {
        let ctx = ctx.dry_run();
        let input = Arc::new(SimulatedInput::new());
        let controller = controller(&ctx, input.clone())?;
        info!("Simulated input: press|release|tap <pin|name>, hold <pin|name> <ms>");

        let script = async {
            if let Err(e) = input.run_script(BufReader::new(tokio::io::stdin())).await {
                warn!(error = %e, "Failed to read simulator input");
            }
            // The controller decides when to stop.
            std::future::pending::<()>().await;
        };

        // Polling the controller first registers every button before the
        // simulator reads its first command.
        tokio::select! {
            biased;
            result = controller.run(shutdown) => result.map_err(CliError::from)?,
            () = script => {}
        }
    } else {
        let input = gpio_input()?;
        let controller = controller(ctx, input)?;
        controller.run(shutdown).await.map_err(CliError::from)?;
    }
    Ok(())
}

fn controller(ctx: &CliContext, input: Arc<dyn PinInputPort>) -> Result<Controller, CliError> {
    let context = ctx.controller_context(Arc::clone(&input))?;
    Ok(Controller::new(
        context,
        ctx.settings.bindings(),
        input,
        ctx.settings.max_concurrent_handlers,
    )
    .with_drain_grace(ctx.settings.shutdown_drain_grace()))
}

#[cfg(feature = "rpi")]
fn gpio_input() -> Result<Arc<dyn PinInputPort>, CliError> {
    let input = sonic_runtime::RppalInput::new().map_err(|e| CliError::Device(e.to_string()))?;
    Ok(Arc::new(input))
}

#[cfg(not(feature = "rpi"))]
fn gpio_input() -> Result<Arc<dyn PinInputPort>, CliError> {
    Err(CliError::Device(
        "built without GPIO support; rebuild with --features rpi or use --simulate".to_string(),
    ))
}
