//! GPIO input port.
//!
//! Adapters deliver every raw edge as a [`RawEdge`] message; debouncing and
//! dispatch happen in the core. The callback context of the adapter (an
//! interrupt thread, a simulator task) never runs handler logic itself.

use tokio::sync::mpsc::UnboundedSender;

use super::InputError;
use crate::domain::{PinBinding, RawEdge};

/// Channel on which adapters post raw edges.
pub type EdgeSender = UnboundedSender<RawEdge>;

/// Physical input lines.
pub trait PinInputPort: Send + Sync {
    /// Configure `binding.pin` as an input and post its edges to `events`.
    fn watch(&self, binding: &PinBinding, events: EdgeSender) -> Result<(), InputError>;

    /// Raw level of a watched pin; `true` while the button is held.
    fn level(&self, pin: u8) -> Result<bool, InputError>;

    /// Stop all interrupts and release every watched line.
    fn release_all(&self);
}
