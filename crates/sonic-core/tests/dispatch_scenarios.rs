//! End-to-end button scenarios: raw edges in, side effects out.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sonic_core::{
    AudioPlayerPort, ButtonAction, ConfigStoreError, ConfigStorePort, ControllerContext,
    Dispatcher, EdgeSender, InputError, LongPressConfig, LongPressDetector, MixerError, MixerPort,
    PinBinding, PinInputPort, PlaybackError, PlaybackManager, PlaybackProcess, PowerError,
    PowerPort, RawEdge, ServiceError, ServiceManagerPort, Settings, SpeechError,
    SpeechSynthesizerPort, ToggleStore, VolumeControl, VolumeDirection,
};
use tempfile::TempDir;
use tokio::time::Instant;

#[derive(Clone, Default)]
struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.all().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

struct Clip {
    name: String,
    events: Events,
}

#[async_trait]
impl PlaybackProcess for Clip {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn terminate(&mut self) -> Result<(), PlaybackError> {
        self.events.push(format!("kill {}", self.name));
        Ok(())
    }

    async fn wait(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }
}

struct Device {
    events: Events,
    levels: Mutex<HashMap<u8, bool>>,
    service_active: AtomicBool,
    values: Mutex<HashMap<String, String>>,
}

impl Device {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Events::default(),
            levels: Mutex::new(HashMap::new()),
            service_active: AtomicBool::new(true),
            values: Mutex::new(HashMap::from([
                ("RANGE".to_string(), "INSIDE".to_string()),
                ("FREQUENCY".to_string(), "CONSTANT".to_string()),
            ])),
        })
    }

    fn hold(&self, pin: u8, held: bool) {
        self.levels.lock().unwrap().insert(pin, held);
    }
}

#[async_trait]
impl SpeechSynthesizerPort for Device {
    async fn synthesize(&self, _text: &str, target: &Path) -> Result<(), SpeechError> {
        std::fs::write(target, b"RIFF").map_err(|e| SpeechError::SynthesisFailed(e.to_string()))
    }
}

#[async_trait]
impl AudioPlayerPort for Device {
    async fn play(&self, clip: &Path) -> Result<Box<dyn PlaybackProcess>, PlaybackError> {
        let name = clip
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.events.push(format!("say {name}"));
        Ok(Box::new(Clip {
            name,
            events: self.events.clone(),
        }))
    }
}

#[async_trait]
impl ServiceManagerPort for Device {
    async fn is_active(&self, _service: &str) -> Result<bool, ServiceError> {
        Ok(self.service_active.load(Ordering::SeqCst))
    }

    async fn start(&self, service: &str) -> Result<(), ServiceError> {
        self.service_active.store(true, Ordering::SeqCst);
        self.events.push(format!("start {service}"));
        Ok(())
    }

    async fn stop(&self, service: &str) -> Result<(), ServiceError> {
        self.service_active.store(false, Ordering::SeqCst);
        self.events.push(format!("stop {service}"));
        Ok(())
    }

    async fn restart(&self, service: &str) -> Result<(), ServiceError> {
        self.events.push(format!("restart {service}"));
        Ok(())
    }
}

#[async_trait]
impl MixerPort for Device {
    async fn adjust(&self, direction: VolumeDirection, step_percent: u8) -> Result<(), MixerError> {
        self.events
            .push(format!("mixer {step_percent}%{}", direction.sign()));
        Ok(())
    }
}

#[async_trait]
impl PowerPort for Device {
    async fn power_off(&self) -> Result<(), PowerError> {
        self.events.push("power_off".to_string());
        Ok(())
    }
}

impl ConfigStorePort for Device {
    fn read(&self, variable: &str) -> Result<String, ConfigStoreError> {
        self.values
            .lock()
            .unwrap()
            .get(variable)
            .cloned()
            .ok_or_else(|| ConfigStoreError::UnknownVariable(variable.to_string()))
    }

    fn write(&self, variable: &str, value: &str) -> Result<(), ConfigStoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(variable.to_string(), value.to_string());
        Ok(())
    }
}

impl PinInputPort for Device {
    fn watch(&self, _binding: &PinBinding, _events: EdgeSender) -> Result<(), InputError> {
        Ok(())
    }

    fn level(&self, pin: u8) -> Result<bool, InputError> {
        self.levels
            .lock()
            .unwrap()
            .get(&pin)
            .copied()
            .ok_or(InputError::UnknownPin(pin))
    }

    fn release_all(&self) {}
}

/// Wire the default settings against one fake device.
fn wire(device: &Arc<Device>, sounds: &TempDir) -> (Arc<ControllerContext>, Vec<PinBinding>) {
    let settings = Settings::with_defaults();
    let playback = Arc::new(PlaybackManager::new(
        sounds.path(),
        device.clone(),
        device.clone(),
    ));
    let toggles = ToggleStore::load(
        settings.toggle_groups.clone(),
        device.clone(),
        Arc::clone(&playback),
        device.clone(),
        settings.service_name.clone(),
    )
    .unwrap();
    let long_press = LongPressDetector::new(
        LongPressConfig {
            hold_threshold: settings.hold_threshold(),
            poll_interval: settings.hold_poll(),
            announce_timeout: settings.shutdown_announce_timeout(),
            service_name: settings.service_name.clone(),
        },
        device.clone(),
        Arc::clone(&playback),
        device.clone(),
        device.clone(),
    );
    let volume = VolumeControl::new(
        Arc::clone(&playback),
        device.clone(),
        settings.volume_step_percent,
    );
    let context = ControllerContext {
        playback,
        volume,
        toggles,
        long_press,
    };
    (Arc::new(context), settings.bindings())
}

fn pin_of(bindings: &[PinBinding], action: &ButtonAction) -> u8 {
    bindings
        .iter()
        .find(|b| &b.action == action)
        .map(|b| b.pin)
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn bounce_on_shutdown_pin_runs_one_session() {
    let device = Device::new();
    let sounds = TempDir::new().unwrap();
    let (ctx, bindings) = wire(&device, &sounds);
    let pin = pin_of(&bindings, &ButtonAction::ShutdownOrStop);
    device.hold(pin, false);

    let mut dispatcher = Dispatcher::new(&bindings, ctx, 8);
    let t0 = Instant::now();
    assert!(dispatcher.dispatch(RawEdge { pin, at: t0 }));
    assert!(!dispatcher.dispatch(RawEdge {
        pin,
        at: t0 + Duration::from_millis(50)
    }));
    dispatcher.drain().await;

    assert_eq!(device.events.count("stop"), 1);
    assert_eq!(device.events.count("start"), 0);
}

#[tokio::test(start_paused = true)]
async fn presses_past_the_debounce_window_start_a_new_session() {
    let device = Device::new();
    let sounds = TempDir::new().unwrap();
    let (ctx, bindings) = wire(&device, &sounds);
    let pin = pin_of(&bindings, &ButtonAction::ShutdownOrStop);
    device.hold(pin, false);

    let mut dispatcher = Dispatcher::new(&bindings, ctx, 8);
    let t0 = Instant::now();
    assert!(dispatcher.dispatch(RawEdge { pin, at: t0 }));
    dispatcher.drain().await;
    assert!(dispatcher.dispatch(RawEdge {
        pin,
        at: t0 + Duration::from_millis(600)
    }));
    dispatcher.drain().await;

    assert_eq!(device.events.count("stop"), 1);
    assert_eq!(device.events.count("start"), 1);
}

#[tokio::test(start_paused = true)]
async fn long_hold_announces_then_powers_off() {
    let device = Device::new();
    let sounds = TempDir::new().unwrap();
    let (ctx, bindings) = wire(&device, &sounds);
    let pin = pin_of(&bindings, &ButtonAction::ShutdownOrStop);
    device.hold(pin, true);

    let mut dispatcher = Dispatcher::new(&bindings, ctx, 8);
    assert!(dispatcher.dispatch(RawEdge::now(pin)));
    dispatcher.drain().await;

    let events = device.events.all();
    assert_eq!(
        events,
        vec![
            "say shutting_down_the_device,_wait_30s_before_unplugging_the_cable",
            "power_off",
        ]
    );
}

#[tokio::test]
async fn volume_and_toggle_buttons_act_independently() {
    let device = Device::new();
    let sounds = TempDir::new().unwrap();
    let (ctx, bindings) = wire(&device, &sounds);
    let up = pin_of(&bindings, &ButtonAction::VolumeUp);
    let range = pin_of(
        &bindings,
        &ButtonAction::Toggle {
            variable: "RANGE".to_string(),
        },
    );

    let mut dispatcher = Dispatcher::new(&bindings, Arc::clone(&ctx), 8);
    let t0 = Instant::now();
    assert!(dispatcher.dispatch(RawEdge { pin: up, at: t0 }));
    assert!(dispatcher.dispatch(RawEdge {
        pin: range,
        at: t0 + Duration::from_millis(5)
    }));
    dispatcher.drain().await;

    assert_eq!(device.events.count("mixer 5%+"), 1);
    assert_eq!(device.events.count("restart sonic-sight.service"), 1);
    assert_eq!(device.read("RANGE").unwrap(), "STREET");
    assert_eq!(ctx.toggles.current("RANGE").await.as_deref(), Some("STREET"));
}

#[tokio::test]
async fn second_message_kills_the_first() {
    let device = Device::new();
    let sounds = TempDir::new().unwrap();
    let (ctx, _bindings) = wire(&device, &sounds);

    ctx.playback.speak("Volume up").await;
    ctx.playback.speak("Volume down").await;

    assert_eq!(
        device.events.all(),
        vec!["say volume_up", "kill volume_up", "say volume_down"]
    );
}
