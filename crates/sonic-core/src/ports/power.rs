//! Power control port.

use async_trait::async_trait;

use super::PowerError;

/// Powers the device off. Irreversible.
#[async_trait]
pub trait PowerPort: Send + Sync {
    async fn power_off(&self) -> Result<(), PowerError>;
}
