//! Test utilities for update testing
//!
//! Provides a mock release server and a scripted update source.

use anyhow::Result;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use windmachine_core::{UpdateManifest, WindMachineError};

use crate::update::UpdateSource;

/// Mock server state
#[derive(Debug, Clone)]
struct ReleaseState {
    version: String,
    binary: Arc<Vec<u8>>,
    binary_status: StatusCode,
    base_url: String,
    manifest_hits: Arc<AtomicUsize>,
}

/// Mock release server serving `/version.json`, `/release.bin` and `/raw`
#[derive(Debug)]
pub struct MockReleaseServer {
    version: String,
    binary: Vec<u8>,
    binary_status: StatusCode,
    base_url: String,
    manifest_hits: Arc<AtomicUsize>,
}

impl MockReleaseServer {
    /// Create a mock server advertising `version` and serving `binary`
    pub fn new(version: &str, binary: Vec<u8>) -> Self {
        Self {
            version: version.to_string(),
            binary,
            binary_status: StatusCode::OK,
            base_url: String::new(),
            manifest_hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the binary endpoint answer with an error status
    pub fn with_binary_status(mut self, status: StatusCode) -> Self {
        self.binary_status = status;
        self
    }

    /// Start the mock server and return the base address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.base_url = format!("http://127.0.0.1:{}", addr.port());

        let state = ReleaseState {
            version: self.version.clone(),
            binary: Arc::new(self.binary.clone()),
            binary_status: self.binary_status,
            base_url: self.base_url.clone(),
            manifest_hits: self.manifest_hits.clone(),
        };

        let app = Router::new()
            .route("/version.json", get(manifest_handler))
            .route("/release.bin", get(binary_handler))
            .route("/raw", get(raw_handler))
            .with_state(state);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
        }

        let base = self.base_url.clone();
        Ok((self, base))
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/version.json", self.base_url)
    }

    pub fn binary_url(&self) -> String {
        format!("{}/release.bin", self.base_url)
    }

    /// Endpoint returning a body that is not JSON
    pub fn raw_url(&self) -> String {
        format!("{}/raw", self.base_url)
    }

    /// How many times the manifest was requested
    pub fn manifest_hits(&self) -> usize {
        self.manifest_hits.load(Ordering::SeqCst)
    }
}

async fn manifest_handler(State(state): State<ReleaseState>) -> Json<UpdateManifest> {
    state.manifest_hits.fetch_add(1, Ordering::SeqCst);
    Json(UpdateManifest {
        plugin_version: state.version.clone(),
        download_url: format!("{}/release.bin", state.base_url),
        sha256: None,
    })
}

async fn binary_handler(State(state): State<ReleaseState>) -> impl IntoResponse {
    if state.binary_status != StatusCode::OK {
        return (state.binary_status, Vec::new());
    }
    (StatusCode::OK, state.binary.as_ref().clone())
}

async fn raw_handler() -> &'static str {
    "<html>not a manifest</html>"
}

/// Scripted update source for exercising installer failure paths
#[derive(Default)]
pub struct ScriptedSource {
    /// Manifest returned by `fetch_manifest`; `None` simulates a network failure
    pub manifest: Option<UpdateManifest>,
    /// Bytes written by `download`; `None` simulates a failed download
    pub binary: Option<Vec<u8>>,
    /// Write the bytes but still report failure (partial download)
    pub fail_after_write: bool,
    /// Report success without writing anything
    pub skip_write: bool,
    /// Number of `fetch_manifest` calls
    pub fetches: AtomicUsize,
    /// URLs passed to `download`
    pub downloads: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn with_manifest(version: &str, url: &str) -> Self {
        Self {
            manifest: Some(UpdateManifest {
                plugin_version: version.to_string(),
                download_url: url.to_string(),
                sha256: None,
            }),
            ..Default::default()
        }
    }

    pub fn with_binary(binary: &[u8]) -> Self {
        Self {
            binary: Some(binary.to_vec()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn fetch_manifest(&self) -> windmachine_core::Result<UpdateManifest> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.manifest
            .clone()
            .ok_or_else(|| WindMachineError::Network("connection refused".to_string()))
    }

    async fn download(&self, url: &str, dest: &Path) -> windmachine_core::Result<()> {
        self.downloads.lock().unwrap().push(url.to_string());

        if self.skip_write {
            return Ok(());
        }
        let Some(binary) = &self.binary else {
            return Err(WindMachineError::Download("connection reset".to_string()));
        };
        tokio::fs::write(dest, binary).await?;
        if self.fail_after_write {
            return Err(WindMachineError::Download("truncated body".to_string()));
        }
        Ok(())
    }
}
