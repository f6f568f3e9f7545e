//! Where releases come from.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;
use windmachine_core::{Result, UpdateManifest, WindMachineError, PLUGIN_VERSION};

/// Remote release source.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch the current release manifest.
    async fn fetch_manifest(&self) -> Result<UpdateManifest>;

    /// Download a release binary to `dest`, overwriting it.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Release source backed by plain HTTP GETs.
#[derive(Debug, Clone)]
pub struct HttpUpdateSource {
    client: Client,
    manifest_url: String,
}

impl HttpUpdateSource {
    /// Create a source for a fixed manifest URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(manifest_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("InternalWindMachine-Plugin/{}", PLUGIN_VERSION))
            .build()
            .map_err(|e| WindMachineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            manifest_url: manifest_url.into(),
        })
    }

    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }
}

#[async_trait]
impl UpdateSource for HttpUpdateSource {
    async fn fetch_manifest(&self) -> Result<UpdateManifest> {
        debug!("Fetching update manifest from {}", self.manifest_url);

        let response = self
            .client
            .get(&self.manifest_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WindMachineError::Network(format!("Manifest request failed: {}", e)))?;

        let text = response
            .text()
            .await
            .map_err(|e| WindMachineError::Network(format!("Failed to read manifest: {}", e)))?;

        Ok(serde_json::from_str(&text)?)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("Downloading {} to {}", url, dest.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WindMachineError::Download(format!("Request to {} failed: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WindMachineError::Download(format!("Failed to read body: {}", e)))?;

        fs::write(dest, &bytes).await.map_err(|e| {
            WindMachineError::Download(format!("Failed to write {}: {}", dest.display(), e))
        })?;

        debug!("Downloaded {} bytes", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockReleaseServer;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_manifest_from_server() {
        let (server, _base) = MockReleaseServer::new("2.1.0", b"binary".to_vec())
            .start()
            .await
            .unwrap();
        let source = HttpUpdateSource::new(server.manifest_url(), Duration::from_secs(5))
            .unwrap();

        let manifest = source.fetch_manifest().await.unwrap();
        assert_eq!(manifest.plugin_version, "2.1.0");
        assert_eq!(manifest.download_url, server.binary_url());
    }

    #[tokio::test]
    async fn test_fetch_manifest_http_error() {
        let (_server, base) = MockReleaseServer::new("2.1.0", Vec::new())
            .start()
            .await
            .unwrap();
        let source =
            HttpUpdateSource::new(format!("{}/missing.json", base), Duration::from_secs(5))
                .unwrap();

        let err = source.fetch_manifest().await.unwrap_err();
        assert!(matches!(err, WindMachineError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_manifest_invalid_json() {
        let (server, _base) = MockReleaseServer::new("2.1.0", Vec::new())
            .start()
            .await
            .unwrap();
        let source =
            HttpUpdateSource::new(server.raw_url(), Duration::from_secs(5)).unwrap();

        let err = source.fetch_manifest().await.unwrap_err();
        assert!(matches!(err, WindMachineError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let temp_dir = TempDir::new().unwrap();
        let (server, _base) = MockReleaseServer::new("2.1.0", b"new-binary".to_vec())
            .start()
            .await
            .unwrap();
        let source = HttpUpdateSource::new(server.manifest_url(), Duration::from_secs(5))
            .unwrap();

        let dest = temp_dir.path().join("module.new");
        source.download(&server.binary_url(), &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new-binary");
    }
}
