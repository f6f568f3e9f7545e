//! Daemon configuration loading

use std::path::Path;
use tokio::fs;
use tracing::info;
use windmachine_core::{DaemonConfig, Result, WindMachineError};

/// Load the daemon config from TOML, creating it with defaults if missing.
pub async fn load_or_create(path: &Path) -> Result<DaemonConfig> {
    if !path.exists() {
        info!(
            "Daemon config not found at {}. Creating with defaults.",
            path.display()
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                WindMachineError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let config = DaemonConfig::default();
        let toml_str = config.to_toml().map_err(|e| {
            WindMachineError::Config(format!("Failed to serialize default config: {}", e))
        })?;
        fs::write(path, toml_str).await.map_err(|e| {
            WindMachineError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        return Ok(config);
    }

    let content = fs::read_to_string(path).await.map_err(|e| {
        WindMachineError::Config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    DaemonConfig::from_toml(&content).map_err(|e| {
        WindMachineError::Config(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}
