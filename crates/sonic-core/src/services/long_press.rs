//! Shutdown/stop button: long press powers off, short press toggles the
//! rendering service.
//!
//! ```text
//! Idle -> Holding -> Shutdown       (held through the threshold)
//!                 -> ToggleService  (released before the threshold)
//!      <- token released, completion recorded
//! ```
//!
//! Only one session may run at a time. The token is acquired without
//! waiting; a press that arrives while a session runs (a bounce, or a
//! duplicated interrupt) is dropped, not queued.
//!
//! The level is sampled every poll interval and the elapsed time is checked
//! after each sample. If the pin still reads held on the first sample taken
//! at or after the threshold, the press is long: holding for exactly the
//! threshold powers off.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use super::playback::{PlaybackManager, PlaybackWait};
use crate::ports::{PinInputPort, PowerPort, ServiceManagerPort};

pub const SHUTDOWN_MESSAGE: &str = "Shutting down the device, wait 30s before unplugging the cable";
pub const SERVICE_STOPPING_MESSAGE: &str = "Toggling sound rendering service to stopped";
pub const SERVICE_STARTING_MESSAGE: &str = "Toggling sound rendering service to started";

/// Timing and target of the detector.
#[derive(Debug, Clone)]
pub struct LongPressConfig {
    /// Hold time that turns a press into a shutdown.
    pub hold_threshold: Duration,
    /// Level sampling interval while holding.
    pub poll_interval: Duration,
    /// Upper bound on waiting for the shutdown warning.
    pub announce_timeout: Duration,
    /// Service toggled by a short press.
    pub service_name: String,
}

/// Where the detector currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressState {
    Idle,
    Holding,
    Shutdown,
    ToggleService,
}

/// What a completed session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressOutcome {
    /// Power-off was issued.
    Shutdown,
    /// The rendering service was running and has been stopped.
    ServiceStopped,
    /// The rendering service was not running and has been started.
    ServiceStarted,
}

struct Status {
    state: LongPressState,
    last_completed: Option<DateTime<Utc>>,
}

/// Single-slot long-press state machine.
pub struct LongPressDetector {
    config: LongPressConfig,
    token: Semaphore,
    status: Mutex<Status>,
    input: Arc<dyn PinInputPort>,
    playback: Arc<PlaybackManager>,
    services: Arc<dyn ServiceManagerPort>,
    power: Arc<dyn PowerPort>,
}

/// Held for the duration of one session; resets the state and records the
/// completion time before the token is released.
struct Session<'a> {
    detector: &'a LongPressDetector,
    _permit: SemaphorePermit<'a>,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let mut status = self.detector.lock_status();
        status.state = LongPressState::Idle;
        status.last_completed = Some(Utc::now());
        debug!("Releasing long-press token");
    }
}

impl LongPressDetector {
    pub fn new(
        config: LongPressConfig,
        input: Arc<dyn PinInputPort>,
        playback: Arc<PlaybackManager>,
        services: Arc<dyn ServiceManagerPort>,
        power: Arc<dyn PowerPort>,
    ) -> Self {
        Self {
            config,
            token: Semaphore::new(1),
            status: Mutex::new(Status {
                state: LongPressState::Idle,
                last_completed: None,
            }),
            input,
            playback,
            services,
            power,
        }
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, Status> {
        // The status is plain data; a panic while holding it cannot leave it inconsistent.
        self.status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: LongPressState) {
        self.lock_status().state = state;
    }

    /// Current state.
    pub fn state(&self) -> LongPressState {
        self.lock_status().state
    }

    /// When the last session ended.
    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.lock_status().last_completed
    }

    /// Handle a debounced press of `pin`.
    ///
    /// Returns `None` when another session already holds the token.
    pub async fn on_press(&self, pin: u8) -> Option<LongPressOutcome> {
        let Ok(permit) = self.token.try_acquire() else {
            debug!(pin, "Long press already in progress, ignoring press");
            return None;
        };
        let _session = Session {
            detector: self,
            _permit: permit,
        };
        debug!(pin, "Acquired long-press token");

        let outcome = if self.held_through_threshold(pin).await {
            self.shutdown().await
        } else {
            self.toggle_service().await
        };
        Some(outcome)
    }

    async fn held_through_threshold(&self, pin: u8) -> bool {
        self.set_state(LongPressState::Holding);
        let started = Instant::now();
        let mut held = true;

        while held && started.elapsed() < self.config.hold_threshold {
            sleep(self.config.poll_interval).await;
            held = match self.input.level(pin) {
                Ok(level) => level,
                Err(e) => {
                    warn!(pin, error = %e, "Failed to read pin level, treating as released");
                    false
                }
            };
        }

        debug!(pin, held, elapsed_ms = started.elapsed().as_millis(), "Hold finished");
        held
    }

    async fn shutdown(&self) -> LongPressOutcome {
        self.set_state(LongPressState::Shutdown);
        info!("Long press detected, powering off");

        let announced = self
            .playback
            .speak_and_wait(SHUTDOWN_MESSAGE, self.config.announce_timeout)
            .await;
        if announced == PlaybackWait::TimedOut {
            warn!("Shutdown warning did not finish playing, powering off anyway");
        }

        if let Err(e) = self.power.power_off().await {
            error!(error = %e, "Power-off failed");
        }
        LongPressOutcome::Shutdown
    }

    async fn toggle_service(&self) -> LongPressOutcome {
        self.set_state(LongPressState::ToggleService);
        let service = self.config.service_name.as_str();

        let active = match self.services.is_active(service).await {
            Ok(active) => active,
            Err(e) => {
                warn!(service, error = %e, "Failed to query service, assuming stopped");
                false
            }
        };

        if active {
            info!(service, "Stopping rendering service");
            self.playback.speak(SERVICE_STOPPING_MESSAGE).await;
            if let Err(e) = self.services.stop(service).await {
                error!(service, error = %e, "Failed to stop service");
            }
            LongPressOutcome::ServiceStopped
        } else {
            info!(service, "Starting rendering service");
            self.playback.speak(SERVICE_STARTING_MESSAGE).await;
            if let Err(e) = self.services.start(service).await {
                error!(service, error = %e, "Failed to start service");
            }
            LongPressOutcome::ServiceStarted
        }
    }
}
