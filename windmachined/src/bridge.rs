//! Event loop joining the property server, the console and the plugin
//!
//! The plugin is owned by this loop alone. Property updates, operator
//! commands, update notifications and the display tick are all handled
//! inline, one at a time.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, trace, warn};
use windmachine_core::ChannelValues;
use windmachine_plugin::{DataPlugin, PropertySnapshot, Press, UpdateEvent, WindMachine};

use crate::commands::OperatorCommand;
use crate::property_server::PropertyUpdate;

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Bridge {
    plugin: WindMachine,
    snapshot: PropertySnapshot,
    subscriptions: watch::Sender<Vec<String>>,
    shown: ChannelValues,
}

impl Bridge {
    pub fn new(plugin: WindMachine, subscriptions: watch::Sender<Vec<String>>) -> Self {
        Self {
            plugin,
            snapshot: PropertySnapshot::new(),
            subscriptions,
            shown: ChannelValues::INACTIVE,
        }
    }

    pub fn plugin(&self) -> &WindMachine {
        &self.plugin
    }

    /// Initialise the plugin and publish its property bindings.
    pub fn start(&mut self) {
        self.plugin.init();
        self.sync_subscriptions();
    }

    /// Record one property value and run a telemetry frame.
    pub fn apply(&mut self, update: PropertyUpdate) {
        self.snapshot.set(update.name, update.value);
        self.plugin.data_update(&self.snapshot);
    }

    pub fn handle(&mut self, command: OperatorCommand, now: Instant) -> Flow {
        match command {
            OperatorCommand::Stop => {
                info!("Stop requested");
                return Flow::Stop;
            }
            OperatorCommand::Reset => match self.plugin.reset_sensors() {
                Ok(count) => info!("Reset {} sensor file(s) to -1", count),
                Err(e) => error!("Failed to reset sensors: {}", e),
            },
            OperatorCommand::Update => self.check_for_updates(),
            OperatorCommand::Install => self.install_update(),
            OperatorCommand::ResetSettings => {
                if self.plugin.request_reset_settings(now) == Press::Armed {
                    info!("Type 'reset-settings' again within 3 seconds to confirm");
                }
            }
            OperatorCommand::Status => {
                let config = self.plugin.config();
                info!(
                    "v{} | Mode: {} | {}",
                    self.plugin.running_version(),
                    if config.use_3d_wind {
                        "3D (Multi-Fan)"
                    } else {
                        "Mono (Center Fan)"
                    },
                    self.plugin.last_values()
                );
                if let Some(update) = self.plugin.available_update() {
                    info!("Update v{} available. Type 'install' to install it.", update.version);
                }
            }
        }
        self.sync_subscriptions();
        Flow::Continue
    }

    /// Log the cached values if they changed since the last tick.
    pub fn refresh_display(&mut self) -> bool {
        let values = self.plugin.last_values();
        if values == self.shown {
            return false;
        }
        trace!("{}", values);
        self.shown = values;
        true
    }

    pub fn announce(&self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Available { version, url } => {
                info!("A new update (v{}) is available: {}", version, url);
                info!("Type 'install' to install it.");
            }
        }
    }

    /// Run the plugin's shutdown and hand it back.
    pub fn finish(mut self) -> WindMachine {
        self.plugin.end();
        self.plugin
    }

    /// Drive the bridge until `stop` is entered or `shutdown` resolves.
    pub async fn run(
        mut self,
        mut updates: mpsc::Receiver<PropertyUpdate>,
        mut commands: mpsc::Receiver<OperatorCommand>,
        mut events: UnboundedReceiver<UpdateEvent>,
        status_interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> WindMachine {
        let mut ticker = tokio::time::interval(status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(update) = updates.recv() => self.apply(update),
                Some(command) = commands.recv() => {
                    if self.handle(command, Instant::now()) == Flow::Stop {
                        break;
                    }
                }
                Some(event) = events.recv() => self.announce(&event),
                _ = ticker.tick() => {
                    self.refresh_display();
                }
            }
        }

        info!("Shutting down...");
        self.finish()
    }

    fn sync_subscriptions(&mut self) {
        let wanted: Vec<String> = self
            .plugin
            .config()
            .active_properties()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.subscriptions.send_if_modified(|current| {
            if *current == wanted {
                return false;
            }
            *current = wanted;
            true
        });
    }

    fn check_for_updates(&self) {
        let Some(checker) = self.plugin.checker() else {
            warn!("No update source configured");
            return;
        };
        tokio::spawn(async move {
            if checker.check().await.is_none() {
                info!("No update available");
            }
        });
    }

    fn install_update(&self) {
        let Some(update) = self.plugin.available_update() else {
            info!("No update available. Type 'update' to check first.");
            return;
        };
        let installer = match self.plugin.installer() {
            Ok(installer) => installer,
            Err(e) => {
                error!("Cannot install update: {}", e);
                return;
            }
        };
        tokio::spawn(async move {
            match installer.install(&update).await {
                Ok(outcome) => info!(
                    "Update v{} installed ({} bytes). Restart to load it.",
                    outcome.version, outcome.bytes
                ),
                Err(e) => error!("Update failed: {}", e),
            }
        });
    }
}
