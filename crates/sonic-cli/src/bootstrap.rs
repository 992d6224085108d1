//! CLI bootstrap, the composition root.
//!
//! The only place where concrete adapters are chosen:
//! - `systemctl` service manager, `pico2wave` synthesis and the player process
//! - `amixer` and the power-off command
//! - the launch script as parameter store
//!
//! Input is chosen per command, so `status` and `toggle` never touch GPIO.

use std::path::PathBuf;
use std::sync::Arc;

use sonic_core::{
    ConfigStorePort, ControllerContext, CoreError, LongPressConfig, LongPressDetector, MixerPort,
    PinInputPort, PlaybackManager, PowerPort, ServiceManagerPort, Settings, ToggleStore,
    VolumeControl, load_settings, validate_settings,
};
use sonic_runtime::{
    AmixerMixer, CommandPower, DryRunPower, DryRunServiceManager, Pico2WaveSynthesizer,
    ProcessPlayer, ShellVarFile, SystemctlServiceManager,
};
use tracing::{debug, info};

use crate::error::CliError;
use crate::parser::Cli;

/// Where settings come from and what the command line overrides.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// JSON settings file; defaults when `None`.
    pub settings_path: Option<PathBuf>,
    /// Replaces `script_path` from the settings.
    pub script_path: Option<PathBuf>,
    /// Replaces `sounds_dir` from the settings.
    pub sounds_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            settings_path: cli.settings.clone(),
            script_path: cli.script.clone(),
            sounds_dir: cli.sounds_dir.clone(),
        }
    }

    /// Load, override and validate the settings.
    pub fn settings(&self) -> Result<Settings, CliError> {
        let mut settings = match &self.settings_path {
            Some(path) => {
                info!(path = %path.display(), "Loading settings");
                load_settings(path)?
            }
            None => {
                debug!("No settings file, using defaults");
                Settings::with_defaults()
            }
        };
        if let Some(script) = &self.script_path {
            settings.script_path.clone_from(script);
        }
        if let Some(sounds) = &self.sounds_dir {
            settings.sounds_dir.clone_from(sounds);
        }
        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Fully composed adapters for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub playback: Arc<PlaybackManager>,
    pub services: Arc<dyn ServiceManagerPort>,
    pub store: Arc<dyn ConfigStorePort>,
    pub mixer: Arc<dyn MixerPort>,
    pub power: Arc<dyn PowerPort>,
}

impl CliContext {
    /// The same context with the service manager and power-off replaced by
    /// adapters that only log, so a simulated run never stops services or
    /// the workstation.
    pub fn dry_run(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            playback: Arc::clone(&self.playback),
            services: Arc::new(DryRunServiceManager::new(true)),
            store: Arc::clone(&self.store),
            mixer: Arc::clone(&self.mixer),
            power: Arc::new(DryRunPower),
        }
    }

    /// Load the persisted modes.
    ///
    /// Fails with [`CoreError::Config`] when a mode is missing or invalid.
    pub fn toggle_store(&self) -> Result<ToggleStore, CoreError> {
        ToggleStore::load(
            self.settings.toggle_groups.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.playback),
            Arc::clone(&self.services),
            self.settings.service_name.clone(),
        )
    }

    /// Everything the button handlers share, reading levels from `input`.
    pub fn controller_context(
        &self,
        input: Arc<dyn PinInputPort>,
    ) -> Result<Arc<ControllerContext>, CoreError> {
        let settings = &self.settings;
        let long_press = LongPressDetector::new(
            LongPressConfig {
                hold_threshold: settings.hold_threshold(),
                poll_interval: settings.hold_poll(),
                announce_timeout: settings.shutdown_announce_timeout(),
                service_name: settings.service_name.clone(),
            },
            input,
            Arc::clone(&self.playback),
            Arc::clone(&self.services),
            Arc::clone(&self.power),
        );
        let volume = VolumeControl::new(
            Arc::clone(&self.playback),
            Arc::clone(&self.mixer),
            settings.volume_step_percent,
        );

        Ok(Arc::new(ControllerContext {
            playback: Arc::clone(&self.playback),
            volume,
            toggles: self.toggle_store()?,
            long_press,
        }))
    }
}

/// Build the adapters described by `config`.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let settings = config.settings()?;
    let commands = &settings.commands;

    let playback = Arc::new(PlaybackManager::new(
        settings.sounds_dir.clone(),
        Arc::new(Pico2WaveSynthesizer::new(commands.synthesizer.clone())),
        Arc::new(ProcessPlayer::cvlc(
            commands.player.clone(),
            commands.player_gain,
        )),
    ));
    let services: Arc<dyn ServiceManagerPort> = Arc::new(SystemctlServiceManager::new(
        commands.systemctl.clone(),
        settings.user_services,
    ));
    let store: Arc<dyn ConfigStorePort> = Arc::new(ShellVarFile::new(settings.script_path.clone()));
    let mixer: Arc<dyn MixerPort> = Arc::new(AmixerMixer::new(
        commands.mixer.clone(),
        commands.mixer_card,
        commands.mixer_control.clone(),
    ));
    let power: Arc<dyn PowerPort> = Arc::new(CommandPower::new(commands.power_off.clone()));

    debug!(
        script = %settings.script_path.display(),
        sounds = %settings.sounds_dir.display(),
        service = %settings.service_name,
        "Bootstrapped adapters"
    );

    Ok(CliContext {
        settings,
        playback,
        services,
        store,
        mixer,
        power,
    })
}
