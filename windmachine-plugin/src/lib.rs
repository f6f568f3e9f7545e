//! Internal Wind Machine plugin runtime
//!
//! Publishes per-channel wind power to sensor files on every telemetry frame
//! and keeps the plugin module itself up to date.

pub mod confirm;
pub mod plugin;
pub mod sensors;
pub mod settings_store;
pub mod telemetry;
pub mod update;

#[cfg(test)]
pub mod test_utils;

pub use confirm::{ConfirmationGate, Press, DEFAULT_CONFIRM_WINDOW};
pub use plugin::WindMachine;
pub use sensors::{resolve_output, SensorDirectory, SensorPublisher};
pub use settings_store::SettingsStore;
pub use telemetry::{parse_property_value, DataPlugin, PropertySnapshot, PropertySource};
pub use update::{
    AvailableUpdate, HttpUpdateSource, InstallOutcome, LogNotifier, Notifier, UpdateChecker,
    UpdateEvent, UpdateInstaller, UpdatePaths, UpdateSource, UpdateState,
};
