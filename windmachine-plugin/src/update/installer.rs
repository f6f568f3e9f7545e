//! Binary replacement via the rename dance
//!
//! Flow: download → (verify) → drop stale `.old` → current → `.old` → `.new` → current
//!
//! The running module stays mapped after the renames; the new binary takes
//! effect on the next host restart. Between the two renames the module is
//! absent at its path. That window is not rolled back automatically; a
//! failure there is reported with a hint to rerun with elevated privileges.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};
use windmachine_core::{Result, WindMachineError};

use super::{AvailableUpdate, UpdateSource};

/// The three paths involved in a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaths {
    /// Loaded module
    pub current: PathBuf,
    /// Download staging path
    pub new: PathBuf,
    /// Previous binary kept for manual rollback
    pub old: PathBuf,
}

impl UpdatePaths {
    pub fn for_module(current: impl Into<PathBuf>) -> Self {
        let current = current.into();
        Self {
            new: with_suffix(&current, ".new"),
            old: with_suffix(&current, ".old"),
            current,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Result of a completed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: String,
    pub paths: UpdatePaths,
    pub bytes: u64,
}

/// Replaces the module on disk with a downloaded release.
pub struct UpdateInstaller {
    source: Arc<dyn UpdateSource>,
    paths: UpdatePaths,
}

impl UpdateInstaller {
    pub fn new(source: Arc<dyn UpdateSource>, module_path: impl Into<PathBuf>) -> Self {
        Self::with_paths(source, UpdatePaths::for_module(module_path))
    }

    /// Installer with explicit staging and backup locations.
    pub fn with_paths(source: Arc<dyn UpdateSource>, paths: UpdatePaths) -> Self {
        Self { source, paths }
    }

    pub fn paths(&self) -> &UpdatePaths {
        &self.paths
    }

    /// Download and swap in `update`.
    ///
    /// The caller is responsible for having obtained operator confirmation.
    ///
    /// # Errors
    ///
    /// - [`WindMachineError::Download`] or [`WindMachineError::ChecksumMismatch`]
    ///   before any mutation of the current module
    /// - [`WindMachineError::UpdateSwap`] when a rename step fails
    pub async fn install(&self, update: &AvailableUpdate) -> Result<InstallOutcome> {
        let paths = &self.paths;
        info!(
            "Installing v{} over {}",
            update.version,
            paths.current.display()
        );

        // Step 1: stage the download
        let bytes = self.stage(update).await?;

        // Step 2: drop a backup left by an earlier run
        if fs::try_exists(&paths.old).await.unwrap_or(false) {
            debug!("Removing stale backup {}", paths.old.display());
            fs::remove_file(&paths.old)
                .await
                .map_err(|e| WindMachineError::swap("removing the previous backup", e))?;
        }

        // Step 3: move the loaded module aside
        fs::rename(&paths.current, &paths.old)
            .await
            .map_err(|e| WindMachineError::swap("moving the current module aside", e))?;

        // Step 4: put the new module in place
        if let Err(e) = fs::rename(&paths.new, &paths.current).await {
            error!(
                "Module missing at {} after failed rename; previous binary is at {}",
                paths.current.display(),
                paths.old.display()
            );
            return Err(WindMachineError::swap("moving the new module into place", e));
        }

        info!(
            "Update v{} prepared ({} bytes). Restart the host to activate it.",
            update.version, bytes
        );

        Ok(InstallOutcome {
            version: update.version.clone(),
            paths: paths.clone(),
            bytes,
        })
    }

    /// Download to the staging path and validate it. Leaves no staging file on failure.
    async fn stage(&self, update: &AvailableUpdate) -> Result<u64> {
        let staged = &self.paths.new;

        if update.url.is_empty() {
            return Err(WindMachineError::Download(
                "manifest carries no download URL".to_string(),
            ));
        }

        if let Err(e) = self.source.download(&update.url, staged).await {
            warn!("Update download failed: {}", e);
            discard(staged).await;
            return Err(e);
        }

        let content = match fs::read(staged).await {
            Ok(content) => content,
            Err(e) => {
                return Err(WindMachineError::Download(format!(
                    "staged file {} is missing: {}",
                    staged.display(),
                    e
                )));
            }
        };

        if content.is_empty() {
            discard(staged).await;
            return Err(WindMachineError::Download("downloaded file is empty".to_string()));
        }

        if let Some(expected) = &update.sha256 {
            let actual = sha256_hex(&content);
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                discard(staged).await;
                return Err(WindMachineError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("Staged binary matches published digest");
        }

        Ok(content.len() as u64)
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staged file {}: {}", path.display(), e);
        }
    }
}

/// Lowercase hex SHA-256 digest.
pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let digest = hmac_sha256::Hash::hash(data);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // write! to String is infallible
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}
