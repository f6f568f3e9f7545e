//! Host-facing interface
//!
//! The host drives the plugin through [`DataPlugin`] and exposes its telemetry
//! through [`PropertySource`]. Nothing else about the host is assumed.

use std::collections::HashMap;

/// Read-only view of the host's named telemetry properties.
pub trait PropertySource {
    /// Numeric value of a property, or `None` when it is missing or not a number.
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl PropertySource for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied().filter(|v| v.is_finite())
    }
}

/// Lifecycle the host calls into.
pub trait DataPlugin {
    /// Called once when the host loads the plugin.
    fn init(&mut self);

    /// Called once per telemetry frame. Must not block or panic.
    fn data_update(&mut self, properties: &dyn PropertySource);

    /// Called once when the host unloads the plugin.
    fn end(&mut self);
}

/// Latest known value of every property the host has reported.
#[derive(Debug, Clone, Default)]
pub struct PropertySnapshot {
    values: HashMap<String, f64>,
}

impl PropertySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a property value; `None` forgets the property.
    pub fn set(&mut self, name: impl Into<String>, value: Option<f64>) {
        let name = name.into();
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.values.insert(name, v);
            }
            None => {
                self.values.remove(&name);
            }
        }
    }
}

impl PropertySource for PropertySnapshot {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.values.lookup(name)
    }
}

/// Coerce a textual property value to a number.
///
/// Hosts report missing values as `(null)`; those and any other non-numeric
/// text yield `None`.
pub fn parse_property_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("(null)") {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_lookup_rejects_non_finite() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), 12.5);
        map.insert("B".to_string(), f64::NAN);

        assert_eq!(map.lookup("A"), Some(12.5));
        assert_eq!(map.lookup("B"), None);
        assert_eq!(map.lookup("missing"), None);
    }

    #[test]
    fn test_snapshot_set_and_forget() {
        let mut snapshot = PropertySnapshot::new();
        snapshot.set("Wind.Center", Some(40.0));
        assert_eq!(snapshot.lookup("Wind.Center"), Some(40.0));

        snapshot.set("Wind.Center", None);
        assert_eq!(snapshot.lookup("Wind.Center"), None);
    }

    #[test]
    fn test_parse_property_value() {
        assert_eq!(parse_property_value("42.5"), Some(42.5));
        assert_eq!(parse_property_value(" 7 "), Some(7.0));
        assert_eq!(parse_property_value("(null)"), None);
        assert_eq!(parse_property_value("True"), None);
        assert_eq!(parse_property_value("NaN"), None);
        assert_eq!(parse_property_value(""), None);
    }
}
