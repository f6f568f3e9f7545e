//! Per-frame channel resolution and sensor file writes
//!
//! Everything here runs inline on the host's telemetry path, so no operation
//! returns an error to the frame callback: write failures degrade the channel
//! to 0 for that frame and are logged at debug level.

use std::fs;
use tracing::{debug, info, warn};
use windmachine_core::{
    format_sensor_value, is_sensor_file, Channel, ChannelValues, Configuration, Result, SENTINEL,
};

use super::SensorDirectory;
use crate::telemetry::PropertySource;

/// Compute a channel's output for one frame.
///
/// 1. Left/right outside 3D mode ⇒ 0
/// 2. Override armed ⇒ the manual power
/// 3. Enabled under the current mode ⇒ the bound property, 0 when absent
/// 4. Otherwise ⇒ 0
pub fn resolve_output(
    config: &Configuration,
    channel: Channel,
    properties: &dyn PropertySource,
) -> f64 {
    if channel != Channel::Center && !config.use_3d_wind {
        return 0.0;
    }

    let settings = config.channel(channel);
    if settings.override_active {
        return settings.override_power;
    }

    if config.is_channel_enabled(channel) {
        return properties.lookup(&settings.property_name).unwrap_or(0.0);
    }

    0.0
}

/// Writes channel outputs to their sensor files and caches what was written.
#[derive(Debug)]
pub struct SensorPublisher {
    directory: SensorDirectory,
    last: ChannelValues,
}

impl SensorPublisher {
    pub fn new(directory: SensorDirectory) -> Self {
        Self {
            directory,
            last: ChannelValues::INACTIVE,
        }
    }

    pub fn directory(&self) -> &SensorDirectory {
        &self.directory
    }

    /// Switch to a new output directory, creating it if needed.
    pub fn set_directory(&mut self, directory: SensorDirectory) {
        if directory != self.directory {
            info!("Sensor directory changed to {}", directory.path().display());
        }
        directory.ensure();
        self.directory = directory;
    }

    /// Values written by the last frame or reset.
    pub fn last_values(&self) -> ChannelValues {
        self.last
    }

    /// Resolve and write every channel for one telemetry frame.
    pub fn publish(
        &mut self,
        config: &Configuration,
        properties: &dyn PropertySource,
    ) -> ChannelValues {
        for channel in Channel::ALL {
            let value = resolve_output(config, channel, properties);
            let written = self.write(channel, value);
            self.last.set(channel, written);
        }
        self.last
    }

    /// Overwrite a channel file; returns the value written, or 0 on failure.
    fn write(&self, channel: Channel, value: f64) -> f64 {
        let path = self.directory.file_for(channel);
        match fs::write(&path, format_sensor_value(value)) {
            Ok(()) => value,
            Err(e) => {
                debug!("Failed to write {}: {}", path.display(), e);
                0.0
            }
        }
    }

    /// Write the sentinel to every existing sensor file in the directory.
    ///
    /// Files without the sensor extension are left untouched. A missing
    /// directory counts as nothing to reset. Returns how many files were reset.
    pub fn reset_all(&mut self) -> Result<usize> {
        self.last = ChannelValues::INACTIVE;

        let dir = self.directory.path();
        if !dir.is_dir() {
            debug!("Sensor directory {} does not exist, nothing to reset", dir.display());
            return Ok(0);
        }

        let sentinel = format_sensor_value(SENTINEL);
        let mut reset = 0;
        for entry in fs::read_dir(dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    debug!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() || !is_sensor_file(&path) {
                continue;
            }
            match fs::write(&path, &sentinel) {
                Ok(()) => reset += 1,
                Err(e) => warn!("Failed to reset {}: {}", path.display(), e),
            }
        }

        info!("Reset {} sensor file(s) in {}", reset, dir.display());
        Ok(reset)
    }

    /// Write the sentinel to a single channel file, if it exists.
    pub fn reset_one(&mut self, channel: Channel) {
        self.last.set(channel, SENTINEL);

        let path = self.directory.file_for(channel);
        if !path.is_file() {
            return;
        }
        match fs::write(&path, format_sensor_value(SENTINEL)) {
            Ok(()) => debug!("Reset {} sensor", channel),
            Err(e) => warn!("Failed to reset {}: {}", path.display(), e),
        }
    }
}
