//! Service manager port.
//!
//! Controls the depth-to-sound rendering service. Start and stop are
//! idempotent from the caller's point of view: starting a running service
//! is a successful no-op.

use async_trait::async_trait;

use super::ServiceError;

/// Query and control named system services.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceManagerPort: Send + Sync {
    /// Whether the service is currently running.
    async fn is_active(&self, service: &str) -> Result<bool, ServiceError>;

    /// Start the service.
    async fn start(&self, service: &str) -> Result<(), ServiceError>;

    /// Stop the service.
    async fn stop(&self, service: &str) -> Result<(), ServiceError>;

    /// Restart the service so it picks up new parameters.
    async fn restart(&self, service: &str) -> Result<(), ServiceError>;
}
