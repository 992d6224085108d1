//! Persisted mode toggles.
//!
//! The in-memory map of current values is the single source of truth while
//! the controller runs. It is only updated after the new value has been
//! written to the parameter store, and the map stays locked across the write,
//! so no reader ever sees a value that is not persisted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::playback::PlaybackManager;
use crate::domain::ToggleGroup;
use crate::ports::{ConfigStorePort, CoreError, ServiceManagerPort};

/// Cycles persisted mode variables and restarts the rendering service.
pub struct ToggleStore {
    groups: Vec<ToggleGroup>,
    current: Mutex<HashMap<String, String>>,
    store: Arc<dyn ConfigStorePort>,
    playback: Arc<PlaybackManager>,
    services: Arc<dyn ServiceManagerPort>,
    service_name: String,
}

impl ToggleStore {
    /// Read the initial value of every group from the store.
    ///
    /// Fails if a variable is missing, unreadable, or set to a value
    /// outside its group.
    pub fn load(
        groups: Vec<ToggleGroup>,
        store: Arc<dyn ConfigStorePort>,
        playback: Arc<PlaybackManager>,
        services: Arc<dyn ServiceManagerPort>,
        service_name: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let mut current = HashMap::with_capacity(groups.len());
        for group in &groups {
            let value = store.read(&group.variable).map_err(|e| {
                CoreError::Config(format!("cannot read {}: {e}", group.variable))
            })?;
            if !group.contains(&value) {
                return Err(CoreError::Config(format!(
                    "variable {} is set to {value:?}, expected one of {:?}",
                    group.variable, group.values
                )));
            }
            info!(variable = %group.variable, value = %value, "Loaded mode");
            current.insert(group.variable.clone(), value);
        }

        Ok(Self {
            groups,
            current: Mutex::new(current),
            store,
            playback,
            services,
            service_name: service_name.into(),
        })
    }

    /// Configured groups, in settings order.
    pub fn groups(&self) -> &[ToggleGroup] {
        &self.groups
    }

    fn group(&self, variable: &str) -> Result<&ToggleGroup, CoreError> {
        self.groups
            .iter()
            .find(|g| g.variable == variable)
            .ok_or_else(|| CoreError::Validation(format!("unknown toggle variable {variable}")))
    }

    /// Current value of `variable`.
    pub async fn current(&self, variable: &str) -> Option<String> {
        self.current.lock().await.get(variable).cloned()
    }

    /// Current value of every group, in settings order.
    pub async fn snapshot(&self) -> Vec<(String, String)> {
        let current = self.current.lock().await;
        self.groups
            .iter()
            .filter_map(|g| {
                current
                    .get(&g.variable)
                    .map(|v| (g.variable.clone(), v.clone()))
            })
            .collect()
    }

    /// Advance `variable` to the next value of its group.
    ///
    /// Announces the new value, persists it and restarts the rendering
    /// service. If persisting fails the in-memory value is left unchanged
    /// and the service is not restarted.
    pub async fn toggle(&self, variable: &str) -> Result<String, CoreError> {
        let group = self.group(variable)?;
        let mut current = self.current.lock().await;

        let value = current
            .get(variable)
            .ok_or_else(|| CoreError::Config(format!("{variable} was never loaded")))?;
        let next = group
            .next_after(value)
            .ok_or_else(|| {
                CoreError::Config(format!("{variable} holds {value:?}, outside its group"))
            })?
            .to_string();

        self.playback.speak(&group.announcement(&next)).await;

        if let Err(source) = self.store.write(variable, &next) {
            error!(variable, value = %next, error = %source, "Failed to persist mode, keeping previous value");
            return Err(CoreError::Persist {
                variable: variable.to_string(),
                source,
            });
        }
        current.insert(variable.to_string(), next.clone());
        drop(current);

        info!(variable, value = %next, "Mode changed");
        if let Err(e) = self.services.restart(&self.service_name).await {
            warn!(service = %self.service_name, error = %e, "Failed to restart rendering service");
        }
        Ok(next)
    }
}
