//! Output directory resolution

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use windmachine_core::Channel;

/// Resolved directory the fan controller polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDirectory {
    path: PathBuf,
}

impl SensorDirectory {
    /// Resolve a configured directory against the install root.
    ///
    /// Empty ⇒ the install root itself; relative ⇒ joined onto it;
    /// absolute ⇒ used as-is.
    pub fn resolve(install_root: &Path, configured: &str) -> Self {
        let configured = configured.trim();
        let path = if configured.is_empty() {
            install_root.to_path_buf()
        } else {
            let configured = Path::new(configured);
            if configured.is_absolute() {
                configured.to_path_buf()
            } else {
                install_root.join(configured)
            }
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full path of a channel's sensor file.
    pub fn file_for(&self, channel: Channel) -> PathBuf {
        self.path.join(channel.file_name())
    }

    /// Create the directory if it is missing.
    ///
    /// Failure is logged and tolerated; later writes then fail quietly.
    pub fn ensure(&self) -> bool {
        if self.path.is_dir() {
            return true;
        }
        match fs::create_dir_all(&self.path) {
            Ok(()) => {
                info!("Created sensor directory: {}", self.path.display());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to create sensor directory '{}': {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}
