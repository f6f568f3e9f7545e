//! Remote update manifest

use serde::{Deserialize, Serialize};

/// Release manifest fetched on every update check.
///
/// Wire format: `{ "plugin": "<version>", "plugin_url": "<url>" }` with an
/// optional `"plugin_sha256"` digest of the binary. Missing fields decode as
/// empty rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// Version string of the published release
    #[serde(rename = "plugin", default)]
    pub plugin_version: String,

    /// Direct download location of the release binary
    #[serde(rename = "plugin_url", default)]
    pub download_url: String,

    /// Lowercase hex SHA-256 of the release binary
    #[serde(
        rename = "plugin_sha256",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sha256: Option<String>,
}

impl UpdateManifest {
    /// Whether this manifest advertises a release other than `running_version`.
    ///
    /// Versions are compared verbatim; an empty remote version never counts.
    pub fn differs_from(&self, running_version: &str) -> bool {
        !self.plugin_version.is_empty() && self.plugin_version != running_version
    }
}
