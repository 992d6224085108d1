//! Button controller.
//!
//! Registers every binding on the input port, then runs the dispatcher until
//! asked to stop. In-flight handlers are drained before returning; input
//! lines are released and playback is stopped on every exit path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::dispatcher::{DEFAULT_DRAIN_GRACE, Dispatcher};
use super::long_press::LongPressDetector;
use super::playback::PlaybackManager;
use super::toggle::ToggleStore;
use super::volume::VolumeControl;
use crate::domain::{ButtonAction, PinBinding, VolumeDirection};
use crate::ports::{CoreError, PinInputPort};

/// Process-wide state shared by every button handler.
pub struct ControllerContext {
    pub playback: Arc<PlaybackManager>,
    pub volume: VolumeControl,
    pub toggles: ToggleStore,
    pub long_press: LongPressDetector,
}

impl ControllerContext {
    /// Run the handler bound to `binding`.
    pub async fn handle(&self, binding: &PinBinding) {
        match &binding.action {
            ButtonAction::VolumeUp => self.volume.adjust(VolumeDirection::Up).await,
            ButtonAction::VolumeDown => self.volume.adjust(VolumeDirection::Down).await,
            ButtonAction::ShutdownOrStop => {
                if let Some(outcome) = self.long_press.on_press(binding.pin).await {
                    info!(button = %binding.name, ?outcome, "Long-press session finished");
                }
            }
            ButtonAction::Toggle { variable } => {
                if let Err(e) = self.toggles.toggle(variable).await {
                    warn!(button = %binding.name, variable, error = %e, "Toggle failed");
                }
            }
        }
    }
}

/// Releases every watched line when dropped.
struct InputRegistration {
    input: Arc<dyn PinInputPort>,
}

impl Drop for InputRegistration {
    fn drop(&mut self) {
        info!("Releasing input lines");
        self.input.release_all();
    }
}

/// Owns the bindings and runs the dispatch loop.
pub struct Controller {
    context: Arc<ControllerContext>,
    bindings: Vec<PinBinding>,
    input: Arc<dyn PinInputPort>,
    max_concurrent: usize,
    drain_grace: Duration,
}

impl Controller {
    pub fn new(
        context: Arc<ControllerContext>,
        bindings: Vec<PinBinding>,
        input: Arc<dyn PinInputPort>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            context,
            bindings,
            input,
            max_concurrent,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// Bound on finishing in-flight presses once shutdown is requested.
    #[must_use]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Watch every binding and dispatch presses until `shutdown` resolves or
    /// the input adapter drops its senders.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), CoreError>
    where
        F: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let _registration = InputRegistration {
            input: Arc::clone(&self.input),
        };

        for binding in &self.bindings {
            self.input.watch(binding, tx.clone())?;
            info!(
                button = %binding.name,
                pin = binding.pin,
                edge = ?binding.edge,
                action = %binding.action,
                debounce_ms = binding.debounce_window.as_millis(),
                "Watching button"
            );
        }
        drop(tx);

        let mut dispatcher = Dispatcher::new(
            &self.bindings,
            Arc::clone(&self.context),
            self.max_concurrent,
        )
        .with_drain_grace(self.drain_grace);
        info!(buttons = self.bindings.len(), "Button controller running");
        dispatcher.run(rx, shutdown).await;

        self.context.playback.stop().await;
        info!("Button controller stopped");
        Ok(())
    }
}
