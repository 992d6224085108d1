//! In-memory port implementations shared by the service tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use super::{
    ControllerContext, LongPressConfig, LongPressDetector, PlaybackManager, ToggleStore,
    VolumeControl,
};
use crate::domain::{PinBinding, ToggleGroup, VolumeDirection};
use crate::ports::{
    AudioPlayerPort, ConfigStoreError, ConfigStorePort, EdgeSender, InputError, MixerError,
    MixerPort, PinInputPort, PlaybackError, PlaybackProcess, PowerError, PowerPort, ServiceError,
    ServiceManagerPort, SpeechError, SpeechSynthesizerPort,
};

/// Ordered record of every side effect, shared by all fakes of one test.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

fn clip_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct FakeProcess {
    clip: String,
    log: Log,
    finishes: bool,
}

#[async_trait]
impl PlaybackProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    async fn terminate(&mut self) -> Result<(), PlaybackError> {
        self.log.push(format!("terminate {}", self.clip));
        Ok(())
    }

    async fn wait(&mut self) -> Result<(), PlaybackError> {
        if !self.finishes {
            std::future::pending::<()>().await;
        }
        self.log.push(format!("finished {}", self.clip));
        Ok(())
    }
}

/// Player whose processes either finish immediately or never finish.
pub struct FakePlayer {
    pub log: Log,
    pub finishes: bool,
    pub fail: bool,
}

#[async_trait]
impl AudioPlayerPort for FakePlayer {
    async fn play(&self, clip: &Path) -> Result<Box<dyn PlaybackProcess>, PlaybackError> {
        if self.fail {
            return Err(PlaybackError::SpawnFailed {
                path: clip.to_path_buf(),
                reason: "no audio device".to_string(),
            });
        }
        let name = clip_name(clip);
        self.log.push(format!("play {name}"));
        Ok(Box::new(FakeProcess {
            clip: name,
            log: self.log.clone(),
            finishes: self.finishes,
        }))
    }
}

/// Synthesizer that writes an empty clip, or fails without writing.
pub struct FakeSynth {
    pub log: Log,
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizerPort for FakeSynth {
    async fn synthesize(&self, text: &str, target: &Path) -> Result<(), SpeechError> {
        self.log.push(format!("synthesize {text}"));
        if self.fail {
            return Err(SpeechError::BackendUnavailable("pico2wave".to_string()));
        }
        std::fs::write(target, b"RIFF").map_err(|e| SpeechError::SynthesisFailed(e.to_string()))
    }
}

pub struct FakeServices {
    pub log: Log,
    pub active: AtomicBool,
}

impl FakeServices {
    pub fn new(log: Log, active: bool) -> Self {
        Self {
            log,
            active: AtomicBool::new(active),
        }
    }
}

#[async_trait]
impl ServiceManagerPort for FakeServices {
    async fn is_active(&self, _service: &str) -> Result<bool, ServiceError> {
        Ok(self.active.load(Ordering::SeqCst))
    }

    async fn start(&self, service: &str) -> Result<(), ServiceError> {
        self.log.push(format!("start {service}"));
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, service: &str) -> Result<(), ServiceError> {
        self.log.push(format!("stop {service}"));
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn restart(&self, service: &str) -> Result<(), ServiceError> {
        self.log.push(format!("restart {service}"));
        Ok(())
    }
}

pub struct FakePower {
    pub log: Log,
}

#[async_trait]
impl PowerPort for FakePower {
    async fn power_off(&self) -> Result<(), PowerError> {
        self.log.push("power_off");
        Ok(())
    }
}

pub struct FakeMixer {
    pub log: Log,
}

#[async_trait]
impl MixerPort for FakeMixer {
    async fn adjust(&self, direction: VolumeDirection, step_percent: u8) -> Result<(), MixerError> {
        self.log
            .push(format!("mixer {step_percent}%{}", direction.sign()));
        Ok(())
    }
}

/// Parameter store backed by a map, with switchable write failures.
#[derive(Default)]
pub struct FakeStore {
    pub values: Mutex<HashMap<String, String>>,
    pub fail_writes: AtomicBool,
}

impl FakeStore {
    pub fn with(values: &[(&str, &str)]) -> Self {
        Self {
            values: Mutex::new(
                values
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            ),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl ConfigStorePort for FakeStore {
    fn read(&self, variable: &str) -> Result<String, ConfigStoreError> {
        self.values
            .lock()
            .unwrap()
            .get(variable)
            .cloned()
            .ok_or_else(|| ConfigStoreError::UnknownVariable(variable.to_string()))
    }

    fn write(&self, variable: &str, value: &str) -> Result<(), ConfigStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConfigStoreError::Io {
                path: "/read-only/run-with-parameters.sh".into(),
                reason: "read-only file system".to_string(),
            });
        }
        self.values
            .lock()
            .unwrap()
            .insert(variable.to_string(), value.to_string());
        Ok(())
    }
}

/// Input whose levels are set directly by the test.
#[derive(Default)]
pub struct FakeInput {
    pub levels: Mutex<HashMap<u8, bool>>,
    pub watched: Mutex<Vec<u8>>,
    pub released: AtomicBool,
}

impl FakeInput {
    pub fn set_level(&self, pin: u8, held: bool) {
        self.levels.lock().unwrap().insert(pin, held);
    }
}

impl PinInputPort for FakeInput {
    fn watch(&self, binding: &PinBinding, _events: EdgeSender) -> Result<(), InputError> {
        self.watched.lock().unwrap().push(binding.pin);
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

    fn release_all(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Fully wired handler context over fakes, with the rendering service
/// running and both default groups at their first value.
pub fn context(dir: &TempDir, log: &Log) -> (Arc<ControllerContext>, Arc<FakeInput>) {
    context_with(dir, log, true)
}

/// Like [`context`], with players that never finish unless `player_finishes`.
pub fn context_with(
    dir: &TempDir,
    log: &Log,
    player_finishes: bool,
) -> (Arc<ControllerContext>, Arc<FakeInput>) {
    let input = Arc::new(FakeInput::default());
    let services: Arc<FakeServices> = Arc::new(FakeServices::new(log.clone(), true));
    let playback = Arc::new(PlaybackManager::new(
        dir.path(),
        Arc::new(FakeSynth {
            log: log.clone(),
            fail: false,
        }),
        Arc::new(FakePlayer {
            log: log.clone(),
            finishes: player_finishes,
            fail: false,
        }),
    ));
    let store = Arc::new(FakeStore::with(&[("RANGE", "INSIDE"), ("FREQUENCY", "CONSTANT")]));
    let toggles = ToggleStore::load(
        vec![
            ToggleGroup::new("RANGE", "distance", ["INSIDE", "STREET"]),
            ToggleGroup::new("FREQUENCY", "frequency doubling", ["CONSTANT", "DOUBLING"]),
        ],
        store,
        Arc::clone(&playback),
        services.clone(),
        "sonic-sight.service",
    )
    .unwrap();
    let long_press = LongPressDetector::new(
        LongPressConfig {
            hold_threshold: Duration::from_secs(3),
            poll_interval: Duration::from_millis(200),
            announce_timeout: Duration::from_secs(10),
            service_name: "sonic-sight.service".to_string(),
        },
        input.clone(),
        Arc::clone(&playback),
        services,
        Arc::new(FakePower { log: log.clone() }),
    );
    let volume = VolumeControl::new(
        Arc::clone(&playback),
        Arc::new(FakeMixer { log: log.clone() }),
        5,
    );

    let context = ControllerContext {
        playback,
        volume,
        toggles,
        long_press,
    };
    (Arc::new(context), input)
}
