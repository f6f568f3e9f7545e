//! Self-update subsystem
//!
//! [`UpdateChecker`] compares the remote manifest with the running version;
//! [`UpdateInstaller`] swaps the module on disk once the operator confirms.
//! Both run on background tasks and report through [`UpdateState`] and the
//! [`UpdateEvent`] channel, never through the telemetry path.

mod checker;
mod installer;
mod source;

pub use checker::UpdateChecker;
pub use installer::{InstallOutcome, UpdateInstaller, UpdatePaths};
pub use source::{HttpUpdateSource, UpdateSource};

use std::sync::Mutex;
use tracing::info;
use windmachine_core::UpdateManifest;

/// A newer release seen during this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub version: String,
    pub url: String,
    pub sha256: Option<String>,
}

impl From<UpdateManifest> for AvailableUpdate {
    fn from(manifest: UpdateManifest) -> Self {
        Self {
            version: manifest.plugin_version,
            url: manifest.download_url,
            sha256: manifest.sha256,
        }
    }
}

/// Notifications handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// A release other than the running one is published
    Available { version: String, url: String },
}

/// Update metadata for the current session; never persisted.
#[derive(Debug, Default)]
pub struct UpdateState {
    available: Mutex<Option<AvailableUpdate>>,
}

impl UpdateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The update recorded this session, if any.
    pub fn available(&self) -> Option<AvailableUpdate> {
        self.available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Record an update; returns `false` if one was already recorded.
    pub fn record(&self, update: AvailableUpdate) -> bool {
        let mut slot = self
            .available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return false;
        }
        *slot = Some(update);
        true
    }
}

/// Transient operator notification (desktop balloon, tray, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!("{}: {}", title, message);
    }
}
