//! Debounced edge dispatch.
//!
//! A single loop receives every [`RawEdge`], debounces it per pin and spawns
//! the bound handler as its own task. Handlers run concurrently, bounded by a
//! fixed number of permits; a press that finds no free permit is dropped.
//!
//! Stopping never cuts a handler short on its own: a shutdown already
//! announcing itself still powers the device off. Only handlers outliving
//! the drain grace are aborted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use super::controller::ControllerContext;
use super::debounce::Debouncer;
use crate::domain::{PinBinding, RawEdge};

/// How long stopping waits for in-flight handlers when not told otherwise.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(20);

/// Routes debounced presses to handler tasks.
pub struct Dispatcher {
    bindings: HashMap<u8, PinBinding>,
    debouncer: Debouncer,
    context: Arc<ControllerContext>,
    permits: Arc<Semaphore>,
    handlers: JoinSet<()>,
    drain_grace: Duration,
}

impl Dispatcher {
    pub fn new(
        bindings: &[PinBinding],
        context: Arc<ControllerContext>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            bindings: bindings.iter().map(|b| (b.pin, b.clone())).collect(),
            debouncer: Debouncer::new(),
            context,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            handlers: JoinSet::new(),
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// Bound on waiting for in-flight handlers after a shutdown request.
    #[must_use]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Number of handler tasks not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.handlers.len()
    }

    /// Debounce `edge` and spawn its handler.
    ///
    /// Returns `true` if a handler was started.
    pub fn dispatch(&mut self, edge: RawEdge) -> bool {
        let Some(binding) = self.bindings.get(&edge.pin) else {
            warn!(pin = edge.pin, "Edge on unbound pin");
            return false;
        };

        if !self
            .debouncer
            .accept(edge.pin, edge.at, binding.debounce_window)
        {
            trace!(pin = edge.pin, button = %binding.name, "Debounced edge");
            return false;
        }

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            warn!(
                pin = edge.pin,
                button = %binding.name,
                "Too many presses in flight, dropping press"
            );
            return false;
        };

        debug!(pin = edge.pin, button = %binding.name, action = %binding.action, "Dispatching press");
        let binding = binding.clone();
        let context = Arc::clone(&self.context);
        self.handlers.spawn(async move {
            let _permit = permit;
            context.handle(&binding).await;
        });
        true
    }

    /// Dispatch edges from `edges` until `shutdown` resolves or the channel
    /// closes.
    ///
    /// Either way no further edge is accepted and in-flight handlers run to
    /// completion. After a shutdown request they get the drain grace, then
    /// the stragglers are aborted.
    pub async fn run<F>(&mut self, mut edges: UnboundedReceiver<RawEdge>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let requested = loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!(in_flight = self.handlers.len(), "Shutdown requested, no longer accepting presses");
                    break true;
                }
                edge = edges.recv() => {
                    let Some(edge) = edge else {
                        info!("Edge channel closed, stopping dispatch");
                        break false;
                    };
                    self.dispatch(edge);
                }
                Some(joined) = self.handlers.join_next(), if !self.handlers.is_empty() => {
                    log_join(joined);
                }
            }
        };

        if requested {
            self.drain_within(self.drain_grace).await;
        } else {
            self.drain().await;
        }
    }

    /// Wait for every spawned handler to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.handlers.join_next().await {
            log_join(joined);
        }
    }

    /// Wait up to `grace` for the handlers, then abort what is left.
    pub async fn drain_within(&mut self, grace: Duration) {
        if tokio::time::timeout(grace, self.drain()).await.is_err() {
            warn!(
                in_flight = self.handlers.len(),
                grace_ms = grace.as_millis(),
                "Handlers still running after drain grace, aborting"
            );
            self.handlers.abort_all();
            self.drain().await;
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    match joined {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => debug!("Handler cancelled"),
        Err(e) => error!(error = %e, "Handler panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ButtonAction;
    use crate::services::test_support::{Log, context, context_with};
    use tempfile::TempDir;
    use tokio::time::Instant;

    const WINDOW: Duration = Duration::from_millis(500);

    fn bindings() -> Vec<PinBinding> {
        vec![
            PinBinding::new("volume_up", 9, WINDOW, ButtonAction::VolumeUp),
            PinBinding::new("volume_down", 10, WINDOW, ButtonAction::VolumeDown),
        ]
    }

    #[tokio::test]
    async fn bounce_on_one_pin_runs_one_handler() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 8);

        let t0 = Instant::now();
        assert!(dispatcher.dispatch(RawEdge { pin: 9, at: t0 }));
        assert!(!dispatcher.dispatch(RawEdge {
            pin: 9,
            at: t0 + Duration::from_millis(50)
        }));
        dispatcher.drain().await;

        assert_eq!(log.count("mixer"), 1);
    }

    #[tokio::test]
    async fn pins_are_debounced_independently() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 8);

        let t0 = Instant::now();
        assert!(dispatcher.dispatch(RawEdge { pin: 9, at: t0 }));
        assert!(dispatcher.dispatch(RawEdge {
            pin: 10,
            at: t0 + Duration::from_millis(10)
        }));
        dispatcher.drain().await;

        assert_eq!(log.count("mixer 5%+"), 1);
        assert_eq!(log.count("mixer 5%-"), 1);
    }

    #[tokio::test]
    async fn unbound_pin_is_ignored() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 8);

        assert!(!dispatcher.dispatch(RawEdge::now(22)));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn saturated_permits_drop_the_press() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 1);

        let t0 = Instant::now();
        // The current-thread runtime does not run the first handler until we
        // yield, so its permit is still held.
        assert!(dispatcher.dispatch(RawEdge { pin: 9, at: t0 }));
        assert!(!dispatcher.dispatch(RawEdge { pin: 10, at: t0 }));
        dispatcher.drain().await;

        assert_eq!(log.count("mixer"), 1);
    }

    #[tokio::test]
    async fn run_stops_when_channel_closes() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 8);

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(RawEdge::now(9)).unwrap();
        tx.send(RawEdge::now(10)).unwrap();
        drop(tx);

        dispatcher
            .run(rx, std::future::pending::<()>())
            .await;

        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(log.count("mixer"), 2);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_with_channel_open() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, _input) = context(&dir, &log);
        let mut dispatcher = Dispatcher::new(&bindings(), ctx, 8);

        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        dispatcher.run(rx, async {}).await;
        assert_eq!(dispatcher.in_flight(), 0);
        assert!(log.entries().is_empty());
    }

    fn shutdown_button() -> Vec<PinBinding> {
        vec![PinBinding::new(
            "shutdown_or_stop",
            4,
            WINDOW,
            ButtonAction::ShutdownOrStop,
        )]
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_request_lets_power_off_in_progress_finish() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        // The warning never finishes, so power-off waits the full announce timeout.
        let (ctx, input) = context_with(&dir, &log, false);
        input.set_level(4, true);
        let mut dispatcher = Dispatcher::new(&shutdown_button(), ctx, 8);

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(RawEdge::now(4)).unwrap();
        let started = Instant::now();
        dispatcher
            .run(rx, tokio::time::sleep(Duration::from_secs(5)))
            .await;

        assert_eq!(log.count("power_off"), 1);
        assert!(started.elapsed() >= Duration::from_secs(13));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn handlers_outliving_the_drain_grace_are_aborted() {
        let dir = TempDir::new().unwrap();
        let log = Log::default();
        let (ctx, input) = context_with(&dir, &log, false);
        input.set_level(4, true);
        let mut dispatcher = Dispatcher::new(&shutdown_button(), ctx, 8)
            .with_drain_grace(Duration::from_secs(1));

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(RawEdge::now(4)).unwrap();
        let started = Instant::now();
        dispatcher
            .run(rx, tokio::time::sleep(Duration::from_millis(500)))
            .await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(log.count("power_off"), 0);
        assert_eq!(log.count("stop"), 0);
        drop(tx);
    }
}
