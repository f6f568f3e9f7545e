//! Default path resolution for configuration files
//!
//! Uses XDG base directories when available, with fixed fallbacks.

use std::path::{Path, PathBuf};

/// Returns the default path for the daemon configuration file.
///
/// - Linux/macOS: `~/.config/windmachine/windmachined.toml`
/// - Fallback: `/etc/windmachine/windmachined.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("windmachine")
        .join("windmachined.toml")
}

/// Returns the default install root for the standalone daemon.
///
/// Relative sensor directories and the settings document live below it.
/// - Linux/macOS: `~/.local/share/windmachine`
/// - Fallback: `/var/lib/windmachine`
pub fn default_install_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("windmachine")
}

/// Location of the plugin settings document for a given install root.
pub fn settings_path(install_root: &Path) -> PathBuf {
    install_root
        .join("PluginsData")
        .join("InternalWindMachinePlugin.json")
}
