//! Plugin settings document
//!
//! Stored as JSON at `{install_root}/PluginsData/InternalWindMachinePlugin.json`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::channel::Channel;

/// Lowest accepted override power (percent).
pub const MIN_POWER: f64 = 0.0;
/// Highest accepted override power (percent).
pub const MAX_POWER: f64 = 100.0;

/// Per-channel settings.
///
/// Deserialized through `StoredChannel` so that absent fields take the
/// factory value of the channel they belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettings {
    /// Channel is driven from its property (only consulted in 3D mode for center)
    pub enabled: bool,
    /// Manual power bypasses the upstream property
    pub override_active: bool,
    /// Manual power in percent, `0..=100`
    pub override_power: f64,
    /// Upstream telemetry property bound to this channel
    pub property_name: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            override_active: false,
            override_power: MAX_POWER,
            property_name: String::new(),
        }
    }
}

impl ChannelSettings {
    /// Factory settings for a channel.
    pub fn for_channel(channel: Channel) -> Self {
        Self {
            enabled: channel == Channel::Center,
            property_name: channel.default_property().to_string(),
            ..Default::default()
        }
    }
}

/// A channel object as found on disk; every field may be missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredChannel {
    enabled: Option<bool>,
    override_active: Option<bool>,
    override_power: Option<f64>,
    property_name: Option<String>,
}

impl StoredChannel {
    fn into_settings(self, channel: Channel) -> ChannelSettings {
        let factory = ChannelSettings::for_channel(channel);
        ChannelSettings {
            enabled: self.enabled.unwrap_or(factory.enabled),
            override_active: self.override_active.unwrap_or(factory.override_active),
            override_power: self.override_power.unwrap_or(factory.override_power),
            property_name: self.property_name.unwrap_or(factory.property_name),
        }
    }
}

fn center_channel<'de, D: Deserializer<'de>>(d: D) -> Result<ChannelSettings, D::Error> {
    StoredChannel::deserialize(d).map(|stored| stored.into_settings(Channel::Center))
}

fn left_channel<'de, D: Deserializer<'de>>(d: D) -> Result<ChannelSettings, D::Error> {
    StoredChannel::deserialize(d).map(|stored| stored.into_settings(Channel::Left))
}

fn right_channel<'de, D: Deserializer<'de>>(d: D) -> Result<ChannelSettings, D::Error> {
    StoredChannel::deserialize(d).map(|stored| stored.into_settings(Channel::Right))
}

/// Clamp a power value into the accepted range; non-finite input becomes full power.
pub(crate) fn clamp_power(power: f64) -> f64 {
    if power.is_finite() {
        power.clamp(MIN_POWER, MAX_POWER)
    } else {
        MAX_POWER
    }
}

/// Complete plugin configuration.
///
/// Missing fields in a persisted document take their default value, so
/// documents written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    /// Drive all three channels instead of center only
    #[serde(rename = "use3DWind")]
    pub use_3d_wind: bool,
    #[serde(deserialize_with = "center_channel")]
    pub center: ChannelSettings,
    #[serde(deserialize_with = "left_channel")]
    pub left: ChannelSettings,
    #[serde(deserialize_with = "right_channel")]
    pub right: ChannelSettings,
    /// Output directory, absolute or relative to the install root
    pub sensor_directory: String,
    pub update_checks_enabled: bool,
    pub update_notifications_enabled: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            use_3d_wind: false,
            center: ChannelSettings::for_channel(Channel::Center),
            left: ChannelSettings::for_channel(Channel::Left),
            right: ChannelSettings::for_channel(Channel::Right),
            sensor_directory: "InternalWindMachineOutput".to_string(),
            update_checks_enabled: true,
            update_notifications_enabled: true,
        }
    }
}

impl Configuration {
    pub fn channel(&self, channel: Channel) -> &ChannelSettings {
        match channel {
            Channel::Center => &self.center,
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSettings {
        match channel {
            Channel::Center => &mut self.center,
            Channel::Left => &mut self.left,
            Channel::Right => &mut self.right,
        }
    }

    /// Whether a channel reads its upstream property under the current mode.
    ///
    /// Single-fan mode always drives center and never left/right.
    pub fn is_channel_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Center => !self.use_3d_wind || self.center.enabled,
            Channel::Left | Channel::Right => self.use_3d_wind && self.channel(channel).enabled,
        }
    }

    /// Whether a channel produces a non-suppressed output (property or override).
    pub fn is_channel_active(&self, channel: Channel) -> bool {
        match channel {
            Channel::Center => self.is_channel_enabled(channel) || self.center.override_active,
            Channel::Left | Channel::Right => {
                self.use_3d_wind
                    && (self.channel(channel).enabled || self.channel(channel).override_active)
            }
        }
    }

    /// Distinct, non-empty property names bound to active channels.
    pub fn active_properties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for channel in Channel::ALL {
            if !self.is_channel_active(channel) {
                continue;
            }
            let name = self.channel(channel).property_name.as_str();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Restore the three property bindings to their conventional names.
    pub fn reset_bindings(&mut self) {
        for channel in Channel::ALL {
            self.channel_mut(channel).property_name = channel.default_property().to_string();
        }
    }

    /// Bring loaded values back into their documented ranges.
    pub fn normalize(&mut self) {
        for channel in Channel::ALL {
            let settings = self.channel_mut(channel);
            settings.override_power = clamp_power(settings.override_power);
        }
    }

    /// Parse a configuration document.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut config: Configuration = serde_json::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Serialize to a pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl ChannelSettings {
    /// Set the override power, clamped into `0..=100`.
    pub fn set_override_power(&mut self, power: f64) {
        self.override_power = clamp_power(power);
    }
}
