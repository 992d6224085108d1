//! Persisted parameter store port.
//!
//! The rendering service reads its mode variables from a human-editable
//! file. This port hides how that file is parsed and rewritten.

use super::ConfigStoreError;

/// Key-value access to the persisted mode variables.
///
/// `write` must be atomic with respect to later reads: once it returns
/// `Ok`, `read` of the same variable observes the new value.
pub trait ConfigStorePort: Send + Sync {
    /// Current persisted value of `variable`.
    fn read(&self, variable: &str) -> Result<String, ConfigStoreError>;

    /// Replace the persisted value of an existing `variable`.
    fn write(&self, variable: &str, value: &str) -> Result<(), ConfigStoreError>;
}
