//! Error types for the wind machine

use thiserror::Error;

/// Core error type for wind machine operations
#[derive(Error, Debug)]
pub enum WindMachineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network errors while talking to the update host
    #[error("Network error: {0}")]
    Network(String),

    /// The update binary could not be downloaded or staged
    #[error("Download failed: {0}")]
    Download(String),

    /// Staged binary does not match the digest published in the manifest
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The rename sequence was interrupted
    #[error("Update failed while {step}: {reason}. Make sure the host is running with elevated privileges (Administrator).")]
    UpdateSwap { step: String, reason: String },

    /// An install was requested but no newer version has been seen
    #[error("No update available")]
    NoUpdateAvailable,

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for wind machine operations
pub type Result<T> = std::result::Result<T, WindMachineError>;

impl From<serde_json::Error> for WindMachineError {
    fn from(err: serde_json::Error) -> Self {
        WindMachineError::Serialization(err.to_string())
    }
}

impl WindMachineError {
    /// Build a swap error for a failed step of the rename sequence.
    pub fn swap(step: impl Into<String>, err: impl std::fmt::Display) -> Self {
        WindMachineError::UpdateSwap {
            step: step.into(),
            reason: err.to_string(),
        }
    }
}
