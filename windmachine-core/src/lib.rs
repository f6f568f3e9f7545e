//! Internal Wind Machine Core Library
//!
//! Shared types, models, and configuration for the wind machine bridge.
//! This crate is used by both the plugin runtime and the standalone daemon.

pub mod channel;
pub mod config;
pub mod error;
pub mod manifest;

// Re-export commonly used types
pub use channel::*;
pub use config::{
    default_config_path, default_install_root, settings_path, ChannelSettings, Configuration,
    DaemonConfig, PropertyServerConfig, DEFAULT_MANIFEST_URL,
};
pub use error::*;
pub use manifest::UpdateManifest;

/// Version string of this build, compared verbatim against the remote manifest.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
