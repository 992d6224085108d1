//! Raspberry Pi GPIO through `rppal`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rppal::gpio::{Gpio, InputPin, Trigger};
use sonic_core::{EdgePolarity, EdgeSender, InputError, PinBinding, PinInputPort, RawEdge};
use tracing::{debug, trace};

struct WatchedPin {
    pin: InputPin,
    edge: EdgePolarity,
}

/// Buttons wired between a GPIO line and 3.3 V, read with the internal
/// pull-down. Interrupt callbacks run on rppal's thread and only post
/// [`RawEdge`] messages.
pub struct RppalInput {
    gpio: Gpio,
    pins: Mutex<HashMap<u8, WatchedPin>>,
}

impl RppalInput {
    pub fn new() -> Result<Self, InputError> {
        let gpio = Gpio::new().map_err(|e| InputError::Gpio(e.to_string()))?;
        Ok(Self {
            gpio,
            pins: Mutex::new(HashMap::new()),
        })
    }

    fn pins(&self) -> MutexGuard<'_, HashMap<u8, WatchedPin>> {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PinInputPort for RppalInput {
    fn watch(&self, binding: &PinBinding, events: EdgeSender) -> Result<(), InputError> {
        let mut pins = self.pins();
        if pins.contains_key(&binding.pin) {
            return Err(InputError::AlreadyWatched(binding.pin));
        }

        let mut pin = self
            .gpio
            .get(binding.pin)
            .map_err(|e| InputError::Gpio(format!("pin {}: {e}", binding.pin)))?
            .into_input_pulldown();
        let trigger = match binding.edge {
            EdgePolarity::Rising => Trigger::RisingEdge,
            EdgePolarity::Falling => Trigger::FallingEdge,
        };
        let number = binding.pin;
        pin.set_async_interrupt(trigger, None, move |_event| {
            trace!(pin = number, "GPIO interrupt");
            let _ = events.send(RawEdge::now(number));
        })
        .map_err(|e| InputError::Gpio(format!("pin {number}: {e}")))?;

        debug!(pin = number, ?trigger, "Registered GPIO interrupt");
        pins.insert(
            number,
            WatchedPin {
                pin,
                edge: binding.edge,
            },
        );
        Ok(())
    }

    fn level(&self, pin: u8) -> Result<bool, InputError> {
        let pins = self.pins();
        let watched = pins.get(&pin).ok_or(InputError::UnknownPin(pin))?;
        Ok(match watched.edge {
            EdgePolarity::Rising => watched.pin.is_high(),
            EdgePolarity::Falling => watched.pin.is_low(),
        })
    }

    fn release_all(&self) {
        let mut pins = self.pins();
        for (number, watched) in pins.iter_mut() {
            if let Err(e) = watched.pin.clear_async_interrupt() {
                debug!(pin = number, error = %e, "Failed to clear interrupt");
            }
        }
        pins.clear();
    }
}
