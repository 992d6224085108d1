//! `systemctl` service manager.

use async_trait::async_trait;
use sonic_core::{ServiceError, ServiceManagerPort};
use tracing::{debug, info};

use crate::command::{describe_exit, run_status};

/// Controls services through `systemctl`, optionally in the user instance.
#[derive(Debug, Clone)]
pub struct SystemctlServiceManager {
    program: String,
    user: bool,
}

impl SystemctlServiceManager {
    pub fn new(program: impl Into<String>, user: bool) -> Self {
        Self {
            program: program.into(),
            user,
        }
    }

    fn args<'a>(&self, action: &'a str, service: &'a str) -> Vec<&'a str> {
        let mut args = Vec::with_capacity(4);
        if self.user {
            args.push("--user");
        }
        args.push(action);
        if action == "is-active" {
            args.push("--quiet");
        }
        args.push(service);
        args
    }

    async fn control(&self, action: &str, service: &str) -> Result<(), ServiceError> {
        let status = run_status(&self.program, self.args(action, service))
            .await
            .map_err(|e| ServiceError::Unavailable(format!("{}: {e}", self.program)))?;
        if status.success() {
            info!(service, action, "Service command succeeded");
            Ok(())
        } else {
            Err(ServiceError::CommandFailed {
                service: service.to_string(),
                action: action.to_string(),
                reason: describe_exit(status),
            })
        }
    }
}

#[async_trait]
impl ServiceManagerPort for SystemctlServiceManager {
    async fn is_active(&self, service: &str) -> Result<bool, ServiceError> {
        let status = run_status(&self.program, self.args("is-active", service))
            .await
            .map_err(|e| ServiceError::Unavailable(format!("{}: {e}", self.program)))?;
        debug!(service, active = status.success(), "Queried service state");
        Ok(status.success())
    }

    async fn start(&self, service: &str) -> Result<(), ServiceError> {
        self.control("start", service).await
    }

    async fn stop(&self, service: &str) -> Result<(), ServiceError> {
        self.control("stop", service).await
    }

    async fn restart(&self, service: &str) -> Result<(), ServiceError> {
        self.control("restart", service).await
    }
}
