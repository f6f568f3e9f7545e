//! Output channels and the sensor file conventions shared with the fan controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File extension the fan controller polls for.
pub const SENSOR_EXTENSION: &str = "sensor";

/// Value written when the bridge is inactive or the channel state is unknown.
pub const SENTINEL: f64 = -1.0;

/// One of the three independent wind outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Center,
    Left,
    Right,
}

impl Channel {
    /// All channels in publication order.
    pub const ALL: [Channel; 3] = [Channel::Center, Channel::Left, Channel::Right];

    /// Fixed sensor file name for this channel.
    ///
    /// The center file carries the `(default)` marker because it is the only
    /// channel driven in single-fan mode.
    pub fn file_name(self) -> &'static str {
        match self {
            Channel::Center => "WindPercentageCenter(default).sensor",
            Channel::Left => "WindPercentageLeft.sensor",
            Channel::Right => "WindPercentageRight.sensor",
        }
    }

    /// Upstream property conventionally bound to this channel.
    pub fn default_property(self) -> &'static str {
        match self {
            Channel::Center => "ShakeItWindPlugin.OutputCenter",
            Channel::Left => "ShakeItWindPlugin.OutputLeft",
            Channel::Right => "ShakeItWindPlugin.OutputRight",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Center => write!(f, "center"),
            Channel::Left => write!(f, "left"),
            Channel::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" | "c" => Ok(Channel::Center),
            "left" | "l" => Ok(Channel::Left),
            "right" | "r" => Ok(Channel::Right),
            other => Err(format!("unknown channel '{}'", other)),
        }
    }
}

/// Format a value the way sensor files carry it: two fraction digits, no newline.
pub fn format_sensor_value(value: f64) -> String {
    // Anything that rounds to zero is written as "0.00", never "-0.00".
    let value = if (value * 100.0).round() == 0.0 { 0.0 } else { value };
    format!("{:.2}", value)
}

/// Whether a path looks like a sensor file (case-insensitive extension match).
pub fn is_sensor_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SENSOR_EXTENSION))
        .unwrap_or(false)
}

/// Last published value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelValues {
    pub center: f64,
    pub left: f64,
    pub right: f64,
}

impl ChannelValues {
    /// Every channel at the sentinel value.
    pub const INACTIVE: ChannelValues = ChannelValues {
        center: SENTINEL,
        left: SENTINEL,
        right: SENTINEL,
    };

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Center => self.center,
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }

    pub fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Center => self.center = value,
            Channel::Left => self.left = value,
            Channel::Right => self.right = value,
        }
    }
}

impl Default for ChannelValues {
    fn default() -> Self {
        Self::INACTIVE
    }
}

impl fmt::Display for ChannelValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L {:.0}% | C {:.0}% | R {:.0}%",
            self.left, self.center, self.right
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_names_are_unique_sensor_files() {
        let names: Vec<_> = Channel::ALL.iter().map(|c| c.file_name()).collect();
        assert_eq!(names[0], "WindPercentageCenter(default).sensor");
        assert_eq!(names[1], "WindPercentageLeft.sensor");
        assert_eq!(names[2], "WindPercentageRight.sensor");
        for name in names {
            assert!(is_sensor_file(Path::new(name)));
        }
    }

    #[test]
    fn test_format_sensor_value() {
        assert_eq!(format_sensor_value(42.5), "42.50");
        assert_eq!(format_sensor_value(0.0), "0.00");
        assert_eq!(format_sensor_value(-0.0), "0.00");
        assert_eq!(format_sensor_value(100.0), "100.00");
        assert_eq!(format_sensor_value(SENTINEL), "-1.00");
        assert_eq!(format_sensor_value(33.333), "33.33");
    }

    #[test]
    fn test_format_tiny_negative_is_unsigned_zero() {
        assert_eq!(format_sensor_value(-0.001), "0.00");
        assert_eq!(format_sensor_value(-0.004), "0.00");
        assert_eq!(format_sensor_value(-0.02), "-0.02");
    }

    #[test]
    fn test_is_sensor_file() {
        assert!(is_sensor_file(&PathBuf::from("/tmp/Other.SENSOR")));
        assert!(!is_sensor_file(&PathBuf::from("/tmp/notes.txt")));
        assert!(!is_sensor_file(&PathBuf::from("/tmp/sensor")));
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("Left".parse::<Channel>(), Ok(Channel::Left));
        assert_eq!("c".parse::<Channel>(), Ok(Channel::Center));
        assert!("rear".parse::<Channel>().is_err());
    }

    #[test]
    fn test_channel_values_get_set() {
        let mut values = ChannelValues::default();
        assert_eq!(values, ChannelValues::INACTIVE);

        values.set(Channel::Right, 12.0);
        assert_eq!(values.get(Channel::Right), 12.0);
        assert_eq!(values.get(Channel::Left), SENTINEL);
    }
}
