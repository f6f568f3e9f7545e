//! Configuration types for the wind machine
//!
//! # Architecture
//!
//! Configuration is split into:
//! - [`DaemonConfig`] - Standalone host settings (TOML), loaded once at startup
//! - [`Configuration`] - Plugin settings (JSON), mutated by operator actions and
//!   persisted after every change

mod daemon_config;
mod paths;
mod settings;

pub use daemon_config::{DaemonConfig, PropertyServerConfig, DEFAULT_MANIFEST_URL};
pub use paths::{default_config_path, default_install_root, settings_path};
pub use settings::{ChannelSettings, Configuration, MAX_POWER, MIN_POWER};
