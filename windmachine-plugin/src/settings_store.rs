//! Durable storage of the plugin [`Configuration`].
//!
//! Loading never fails: a missing or malformed document yields defaults.
//! Saving never fails either; errors are logged and the in-memory copy stays
//! authoritative.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use windmachine_core::{Configuration, Result, WindMachineError};

/// Owner of the process-wide configuration document.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    config: Configuration,
}

impl SettingsStore {
    /// Create a store holding defaults, without touching the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Configuration::default(),
        }
    }

    /// Create a store and load it from disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Reload from disk, substituting defaults on a missing or malformed document.
    pub fn load(&mut self) {
        debug!("Loading settings from: {}", self.path.display());

        self.config = match fs::read_to_string(&self.path) {
            Ok(content) => match Configuration::from_json(&content) {
                Ok(config) => {
                    info!("Settings loaded from {}", self.path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "Settings file {} could not be parsed ({}). Using defaults.",
                        self.path.display(),
                        e
                    );
                    Configuration::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Settings file not found. Using defaults.");
                Configuration::default()
            }
            Err(e) => {
                warn!(
                    "Failed to read settings file {}: {}. Using defaults.",
                    self.path.display(),
                    e
                );
                Configuration::default()
            }
        };
    }

    /// Persist the current document, logging instead of failing.
    ///
    /// Returns whether the write succeeded.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save settings: {}", e);
                false
            }
        }
    }

    /// Persist the current document.
    pub fn try_save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WindMachineError::Config(format!(
                    "Failed to create settings directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = self.config.to_json()?;
        fs::write(&self.path, json).map_err(|e| {
            WindMachineError::Config(format!(
                "Failed to write settings file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation and persist it before returning.
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut Configuration) -> R) -> R {
        let result = mutate(&mut self.config);
        self.config.normalize();
        self.save();
        result
    }

    /// Replace the document with defaults and persist it.
    pub fn reset(&mut self) {
        info!("Resetting all settings to defaults");
        self.config = Configuration::default();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use windmachine_core::settings_path;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::open(settings_path(temp_dir.path()));
        assert_eq!(store.config(), &Configuration::default());
        // Loading alone does not create the file
        assert!(!store.path().exists());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::open(&path);
        assert_eq!(store.config(), &Configuration::default());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = settings_path(temp_dir.path());

        let mut store = SettingsStore::open(&path);
        store.update(|config| {
            config.use_3d_wind = true;
            config.left.enabled = true;
            config.left.property_name = "X".to_string();
            config.center.override_active = true;
            config.center.set_override_power(65.25);
            config.sensor_directory = "out".to_string();
            config.update_checks_enabled = false;
        });
        // Parent directory is created on save
        assert!(path.exists());

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.config(), store.config());
    }

    #[test]
    fn test_update_normalizes_power() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = SettingsStore::open(temp_dir.path().join("s.json"));
        store.update(|config| config.right.override_power = 180.0);
        assert_eq!(store.config().right.override_power, 100.0);
    }

    #[test]
    fn test_reset_replaces_and_persists_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("s.json");

        let mut store = SettingsStore::open(&path);
        store.update(|config| config.use_3d_wind = true);
        store.reset();
        assert_eq!(store.config(), &Configuration::default());

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.config(), &Configuration::default());
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let mut store = SettingsStore::new(blocker.join("s.json"));
        assert!(!store.save());
        assert!(store.try_save().is_err());

        // Mutations still apply in memory
        store.update(|config| config.use_3d_wind = true);
        assert!(store.config().use_3d_wind);
    }
}
