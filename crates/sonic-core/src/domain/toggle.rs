//! Cyclic groups of persisted mode values.

use serde::{Deserialize, Serialize};

/// An ordered, cyclic set of mutually exclusive values for one persisted variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleGroup {
    /// Variable name in the persisted store (e.g. `RANGE`).
    pub variable: String,
    /// Words used in spoken feedback ("Changing <label> to ...").
    pub label: String,
    /// Allowed values, in cycle order.
    pub values: Vec<String>,
}

impl ToggleGroup {
    pub fn new<I, S>(variable: impl Into<String>, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variable: variable.into(),
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `value` is one of the allowed values.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Value following `current` in cycle order, wrapping at the end.
    ///
    /// Returns `None` if `current` is not in the group.
    pub fn next_after(&self, current: &str) -> Option<&str> {
        let index = self.values.iter().position(|v| v == current)?;
        let next = (index + 1) % self.values.len();
        Some(self.values[next].as_str())
    }

    /// Spoken feedback for switching to `value`.
    pub fn announcement(&self, value: &str) -> String {
        format!("Changing {} to {}", self.label, value)
    }
}
