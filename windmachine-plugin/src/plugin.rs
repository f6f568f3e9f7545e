//! The wind machine plugin
//!
//! Owns the configuration and the publisher, and wires the update subsystem
//! to the host lifecycle. Operator actions persist the configuration before
//! returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use windmachine_core::{
    settings_path, Channel, ChannelValues, Configuration, Result, WindMachineError,
    PLUGIN_VERSION,
};

use crate::confirm::{ConfirmationGate, Press};
use crate::sensors::{SensorDirectory, SensorPublisher};
use crate::settings_store::SettingsStore;
use crate::telemetry::{DataPlugin, PropertySource};
use crate::update::{
    AvailableUpdate, InstallOutcome, LogNotifier, Notifier, UpdateChecker, UpdateEvent,
    UpdateInstaller, UpdateSource, UpdateState,
};

/// Sensor publication and self-update, driven by a host.
pub struct WindMachine {
    install_root: PathBuf,
    settings: SettingsStore,
    publisher: SensorPublisher,
    update_source: Option<Arc<dyn UpdateSource>>,
    update_state: Arc<UpdateState>,
    events: UnboundedSender<UpdateEvent>,
    notifier: Arc<dyn Notifier>,
    module_path: Option<PathBuf>,
    running_version: String,
    reset_settings_gate: ConfirmationGate,
    reset_bindings_gate: ConfirmationGate,
}

impl WindMachine {
    /// Create a plugin rooted at `install_root`.
    ///
    /// Settings are not read until [`DataPlugin::init`]. The returned receiver
    /// yields update notifications for the presentation layer.
    pub fn new(install_root: impl Into<PathBuf>) -> (Self, UnboundedReceiver<UpdateEvent>) {
        let install_root = install_root.into();
        let settings = SettingsStore::new(settings_path(&install_root));
        let directory =
            SensorDirectory::resolve(&install_root, &settings.config().sensor_directory);
        let (events, receiver) = mpsc::unbounded_channel();

        let plugin = Self {
            install_root,
            settings,
            publisher: SensorPublisher::new(directory),
            update_source: None,
            update_state: Arc::new(UpdateState::new()),
            events,
            notifier: Arc::new(LogNotifier),
            module_path: None,
            running_version: PLUGIN_VERSION.to_string(),
            reset_settings_gate: ConfirmationGate::default(),
            reset_bindings_gate: ConfirmationGate::default(),
        };
        (plugin, receiver)
    }

    /// Release source used for update checks and installs.
    pub fn with_update_source(mut self, source: Arc<dyn UpdateSource>) -> Self {
        self.update_source = Some(source);
        self
    }

    /// Collaborator for transient desktop notifications.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Module replaced by installs; defaults to the running executable.
    pub fn with_module_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_path = Some(path.into());
        self
    }

    /// Override the version compared against the manifest.
    pub fn with_running_version(mut self, version: impl Into<String>) -> Self {
        self.running_version = version.into();
        self
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn config(&self) -> &Configuration {
        self.settings.config()
    }

    pub fn settings_path(&self) -> &Path {
        self.settings.path()
    }

    pub fn sensor_directory(&self) -> &Path {
        self.publisher.directory().path()
    }

    /// Cached values for the display refresh.
    pub fn last_values(&self) -> ChannelValues {
        self.publisher.last_values()
    }

    pub fn running_version(&self) -> &str {
        &self.running_version
    }

    pub fn update_state(&self) -> Arc<UpdateState> {
        self.update_state.clone()
    }

    pub fn available_update(&self) -> Option<AvailableUpdate> {
        self.update_state.available()
    }

    /// Start a background update check if enabled and a runtime is available.
    pub fn check_for_updates(&self) -> Option<JoinHandle<Option<AvailableUpdate>>> {
        if !self.config().update_checks_enabled {
            debug!("Update checks disabled");
            return None;
        }
        let checker = self.checker()?;
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No async runtime available, skipping update check");
            return None;
        }
        Some(checker.spawn())
    }

    /// Checker wired to this plugin's state and event channel.
    pub fn checker(&self) -> Option<UpdateChecker> {
        let source = self.update_source.clone()?;
        let checker = UpdateChecker::new(
            source,
            self.running_version.clone(),
            self.update_state.clone(),
            self.events.clone(),
        );
        Some(if self.config().update_notifications_enabled {
            checker.with_notifier(self.notifier.clone())
        } else {
            checker
        })
    }

    /// Installer targeting the configured module path.
    pub fn installer(&self) -> Result<UpdateInstaller> {
        let source = self
            .update_source
            .clone()
            .ok_or_else(|| WindMachineError::Config("no update source configured".to_string()))?;
        let module_path = match &self.module_path {
            Some(path) => path.clone(),
            None => std::env::current_exe()?,
        };
        Ok(UpdateInstaller::new(source, module_path))
    }

    /// Install the update seen this session. Requires prior operator confirmation.
    pub async fn install_update(&self) -> Result<InstallOutcome> {
        let update = self
            .available_update()
            .ok_or(WindMachineError::NoUpdateAvailable)?;
        self.installer()?.install(&update).await
    }

    /// Switch between single-fan and 3D mode.
    ///
    /// Entering 3D mode enables every channel; leaving it marks left/right inactive.
    pub fn set_use_3d_wind(&mut self, on: bool) {
        self.settings.update(|config| {
            config.use_3d_wind = on;
            if on {
                for channel in Channel::ALL {
                    config.channel_mut(channel).enabled = true;
                }
            }
        });
        if !on {
            self.publisher.reset_one(Channel::Left);
            self.publisher.reset_one(Channel::Right);
        }
        info!("3D wind {}", if on { "enabled" } else { "disabled" });
    }

    pub fn set_channel_enabled(&mut self, channel: Channel, enabled: bool) {
        let was_enabled = self.settings.update(|config| {
            let settings = config.channel_mut(channel);
            std::mem::replace(&mut settings.enabled, enabled)
        });
        if was_enabled && !enabled {
            self.publisher.reset_one(channel);
        }
    }

    pub fn set_override_active(&mut self, channel: Channel, active: bool) {
        self.settings
            .update(|config| config.channel_mut(channel).override_active = active);
    }

    pub fn set_override_power(&mut self, channel: Channel, power: f64) {
        self.settings
            .update(|config| config.channel_mut(channel).set_override_power(power));
    }

    pub fn set_property_name(&mut self, channel: Channel, name: impl Into<String>) {
        let name = name.into();
        self.settings
            .update(|config| config.channel_mut(channel).property_name = name);
    }

    pub fn set_sensor_directory(&mut self, directory: impl Into<String>) {
        let directory = directory.into();
        self.settings
            .update(|config| config.sensor_directory = directory);
        self.refresh_directory();
    }

    pub fn set_update_checks_enabled(&mut self, enabled: bool) {
        self.settings
            .update(|config| config.update_checks_enabled = enabled);
    }

    pub fn set_update_notifications_enabled(&mut self, enabled: bool) {
        self.settings
            .update(|config| config.update_notifications_enabled = enabled);
    }

    /// Mark every sensor file inactive.
    pub fn reset_sensors(&mut self) -> Result<usize> {
        self.publisher.reset_all()
    }

    /// Restore every setting to its default; needs two presses within the window.
    pub fn request_reset_settings(&mut self, now: Instant) -> Press {
        let press = self.reset_settings_gate.press(now);
        if press == Press::Confirmed {
            self.settings.reset();
            self.refresh_directory();
            info!("All settings have been reset");
        }
        press
    }

    /// Restore the property bindings; needs two presses within the window.
    pub fn request_reset_bindings(&mut self, now: Instant) -> Press {
        let press = self.reset_bindings_gate.press(now);
        if press == Press::Confirmed {
            self.settings.update(Configuration::reset_bindings);
            info!("Property bindings reset to defaults");
        }
        press
    }

    fn refresh_directory(&mut self) {
        let directory =
            SensorDirectory::resolve(&self.install_root, &self.config().sensor_directory);
        self.publisher.set_directory(directory);
    }
}

impl DataPlugin for WindMachine {
    fn init(&mut self) {
        info!("Internal Wind Machine v{} starting", self.running_version);
        self.settings.load();
        self.refresh_directory();
        info!("Sensor directory: {}", self.sensor_directory().display());
        self.check_for_updates();
    }

    fn data_update(&mut self, properties: &dyn PropertySource) {
        self.publisher.publish(self.settings.config(), properties);
    }

    fn end(&mut self) {
        info!("Internal Wind Machine shutting down");
        self.settings.save();
        if let Err(e) = self.publisher.reset_all() {
            warn!("Failed to reset sensors on shutdown: {}", e);
        }
    }
}
