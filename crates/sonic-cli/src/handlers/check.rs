//! Check command handler.
//!
//! Loads everything `run` would load, without touching GPIO or audio.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let toggles = ctx.toggle_store().map_err(CliError::from)?;
    let settings = &ctx.settings;

    println!("Buttons:");
    for binding in settings.bindings() {
        println!(
            "  {:<26} pin {:>2}  {:?}  {:>4} ms  {}",
            binding.name,
            binding.pin,
            binding.edge,
            binding.debounce_window.as_millis(),
            binding.action
        );
    }

    println!("Modes:");
    for (variable, value) in toggles.snapshot().await {
        println!("  {variable}={value}");
    }

    println!(
        "Long press: {} ms (polled every {} ms)",
        settings.hold_threshold_ms, settings.hold_poll_ms
    );
    println!("Settings OK");
    Ok(())
}
