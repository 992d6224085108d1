//! Power-off through a configured command line.

use async_trait::async_trait;
use sonic_core::{PowerError, PowerPort};
use tracing::warn;

use crate::command::{describe_exit, run_status};

/// Runs a fixed argv, `sudo shutdown -P now` by default.
#[derive(Debug, Clone)]
pub struct CommandPower {
    argv: Vec<String>,
}

impl CommandPower {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl PowerPort for CommandPower {
    async fn power_off(&self) -> Result<(), PowerError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(PowerError::CommandFailed("empty power-off command".to_string()));
        };
        warn!(command = %self.argv.join(" "), "Powering off");
        let status = run_status(program, args)
            .await
            .map_err(|e| PowerError::CommandFailed(format!("{program}: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(PowerError::CommandFailed(describe_exit(status)))
        }
    }
}
