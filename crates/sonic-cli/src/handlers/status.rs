//! Status command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let toggles = ctx.toggle_store().map_err(CliError::from)?;
    let service = &ctx.settings.service_name;

    println!("Modes ({}):", ctx.settings.script_path.display());
    for (variable, value) in toggles.snapshot().await {
        let label = ctx
            .settings
            .group(&variable)
            .map_or(variable.as_str(), |g| g.label.as_str());
        println!("  {variable:<12} {value:<12} ({label})");
    }

    let state = match ctx.services.is_active(service).await {
        Ok(true) => "active".to_string(),
        Ok(false) => "inactive".to_string(),
        Err(e) => format!("unknown ({e})"),
    };
    println!("Service {service}: {state}");
    Ok(())
}
