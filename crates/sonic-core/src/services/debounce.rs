//! Per-pin edge debouncing.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Drops edges that arrive within the debounce window of the last accepted
/// edge on the same pin.
///
/// Pins are independent: a burst on one pin never suppresses another.
/// Dropped edges are discarded, not queued.
#[derive(Debug, Default)]
pub struct Debouncer {
    last_accepted: HashMap<u8, Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether an edge on `pin` at `at` is a new logical press.
    pub fn accept(&mut self, pin: u8, at: Instant, window: Duration) -> bool {
        if let Some(last) = self.last_accepted.get(&pin) {
            // Edges can arrive slightly out of order across interrupt threads.
            if at.saturating_duration_since(*last) < window {
                return false;
            }
        }
        self.last_accepted.insert(pin, at);
        true
    }
}
