//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use sonic_cli::{Cli, CliConfig, Commands, bootstrap, exit_code_for, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads SONIC_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let ctx = bootstrap(&CliConfig::from_cli(cli))?;

    match cli.command() {
        Commands::Run { simulate } => {
            handlers::run::execute(&ctx, simulate, shutdown_signal()).await?;
        }
        Commands::Speak { message } => {
            handlers::speak::execute(&ctx, &message).await?;
        }
        Commands::Status => {
            handlers::status::execute(&ctx).await?;
        }
        Commands::Toggle { variable } => {
            handlers::toggle::execute(&ctx, &variable).await?;
        }
        Commands::Check => {
            handlers::check::execute(&ctx).await?;
        }
    }
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
