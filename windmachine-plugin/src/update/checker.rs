//! Background update check

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{AvailableUpdate, Notifier, UpdateEvent, UpdateSource, UpdateState};

/// Compares the published release with the running version.
///
/// A check issues exactly one manifest request. Failures are discarded: the
/// operator never sees a failed check, and nothing retries it.
pub struct UpdateChecker {
    source: Arc<dyn UpdateSource>,
    running_version: String,
    state: Arc<UpdateState>,
    events: UnboundedSender<UpdateEvent>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl UpdateChecker {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        running_version: impl Into<String>,
        state: Arc<UpdateState>,
        events: UnboundedSender<UpdateEvent>,
    ) -> Self {
        Self {
            source,
            running_version: running_version.into(),
            state,
            events,
            notifier: None,
        }
    }

    /// Also raise a transient notification when an update is found.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run one check.
    ///
    /// Returns the update when the published version differs from the running
    /// one. The event and notification fire only the first time an update is
    /// recorded in the shared state.
    pub async fn check(&self) -> Option<AvailableUpdate> {
        info!(
            "Checking for updates (running v{})...",
            self.running_version
        );

        let manifest = match self.source.fetch_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!("Update check failed: {}", e);
                return None;
            }
        };

        if !manifest.differs_from(&self.running_version) {
            debug!(
                "Running the published version (remote '{}')",
                manifest.plugin_version
            );
            return None;
        }

        let update = AvailableUpdate::from(manifest);
        info!("Update available: v{} at {}", update.version, update.url);

        if self.state.record(update.clone()) {
            // Receiver gone means nobody renders it; the state still holds it.
            let _ = self.events.send(UpdateEvent::Available {
                version: update.version.clone(),
                url: update.url.clone(),
            });

            if let Some(notifier) = &self.notifier {
                notifier.notify(
                    "Internal Wind Machine",
                    &format!(
                        "A new update (v{}) is available! Open the plugin settings to install.",
                        update.version
                    ),
                );
            }
        }

        Some(update)
    }

    /// Run the check on a background task.
    pub fn spawn(self) -> JoinHandle<Option<AvailableUpdate>> {
        tokio::spawn(async move { self.check().await })
    }
}
