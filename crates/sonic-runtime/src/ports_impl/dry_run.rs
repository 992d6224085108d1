//! Adapters that log instead of acting, for running the controller on a
//! workstation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sonic_core::{PowerError, PowerPort, ServiceError, ServiceManagerPort};
use tracing::info;

/// Service manager that only remembers which services it was told to run.
///
/// Services it has not seen yet report `initially_active`.
#[derive(Debug)]
pub struct DryRunServiceManager {
    initially_active: bool,
    active: Mutex<HashMap<String, bool>>,
}

impl DryRunServiceManager {
    pub fn new(initially_active: bool) -> Self {
        Self {
            initially_active,
            active: Mutex::new(HashMap::new()),
        }
    }

    fn set(&self, service: &str, active: bool) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.to_string(), active);
    }
}

#[async_trait]
impl ServiceManagerPort for DryRunServiceManager {
    async fn is_active(&self, service: &str) -> Result<bool, ServiceError> {
        Ok(self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .copied()
            .unwrap_or(self.initially_active))
    }

    async fn start(&self, service: &str) -> Result<(), ServiceError> {
        info!(service, "Dry run: would start service");
        self.set(service, true);
        Ok(())
    }

    async fn stop(&self, service: &str) -> Result<(), ServiceError> {
        info!(service, "Dry run: would stop service");
        self.set(service, false);
        Ok(())
    }

    async fn restart(&self, service: &str) -> Result<(), ServiceError> {
        info!(service, "Dry run: would restart service");
        self.set(service, true);
        Ok(())
    }
}

/// Power port that logs the request and leaves the machine running.
#[derive(Debug, Default)]
pub struct DryRunPower;

#[async_trait]
impl PowerPort for DryRunPower {
    async fn power_off(&self) -> Result<(), PowerError> {
        info!("Dry run: would power off");
        Ok(())
    }
}
