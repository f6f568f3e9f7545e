//! Static configuration for the standalone daemon
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::paths::default_install_root;

/// Fixed, versioned manifest published alongside each release.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/therealkarle/InternalWindMachine/main/version.json";

/// Telemetry property server connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyServerConfig {
    /// Property server hostname
    pub host: String,
    /// Property server port
    pub port: u16,
    /// Delay before reconnecting after a lost connection, in seconds
    pub reconnect_delay_secs: u64,
}

impl Default for PropertyServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18082,
            reconnect_delay_secs: 5,
        }
    }
}

/// Static configuration for the wind machine daemon.
///
/// Located at `~/.config/windmachine/windmachined.toml` by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Root that relative sensor directories and the settings document resolve against
    ///
    /// Defaults to `~/.local/share/windmachine` (XDG data directory).
    pub install_root: PathBuf,

    /// Update manifest location
    pub manifest_url: String,

    /// HTTP timeout for update checks and downloads, in seconds
    pub http_timeout_secs: u64,

    /// Display refresh cadence, in milliseconds
    pub status_interval_ms: u64,

    /// Property server connection
    pub property_server: PropertyServerConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            http_timeout_secs: 10,
            status_interval_ms: 50,
            property_server: PropertyServerConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Create a DaemonConfig with a custom install root.
    pub fn with_install_root(install_root: PathBuf) -> Self {
        Self {
            install_root,
            ..Default::default()
        }
    }

    /// Parse DaemonConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize DaemonConfig to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// `host:port` of the property server.
    pub fn property_server_addr(&self) -> String {
        format!("{}:{}", self.property_server.host, self.property_server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_daemon_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.property_server.port, 18082);
        assert_eq!(config.property_server.reconnect_delay_secs, 5);
        assert_eq!(config.manifest_url, DEFAULT_MANIFEST_URL);
        assert_eq!(config.property_server_addr(), "127.0.0.1:18082");
    }

    #[test]
    fn test_daemon_config_serialization() {
        let toml_str = DaemonConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[property_server]"));
        assert!(toml_str.contains("install_root"));
        assert!(toml_str.contains("manifest_url"));
    }

    #[test]
    fn test_daemon_config_deserialization() {
        let toml_str = r#"
            install_root = "/opt/simhub"
            status_interval_ms = 100

            [property_server]
            host = "192.168.1.20"
            port = 9000
        "#;

        let config = DaemonConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.install_root, PathBuf::from("/opt/simhub"));
        assert_eq!(config.status_interval_ms, 100);
        assert_eq!(config.property_server.host, "192.168.1.20");
        assert_eq!(config.property_server.port, 9000);
        // Unspecified fields fall back to defaults
        assert_eq!(config.property_server.reconnect_delay_secs, 5);
        assert_eq!(config.http_timeout_secs, 10);
    }

    #[test]
    fn test_daemon_config_roundtrip() {
        let original = DaemonConfig::with_install_root(PathBuf::from("/tmp/root"));
        let restored = DaemonConfig::from_toml(&original.to_toml().unwrap()).unwrap();
        assert_eq!(original, restored);
    }
}
