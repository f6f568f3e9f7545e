//! Sensor file output
//!
//! - [`SensorDirectory`] resolves and creates the output directory
//! - [`SensorPublisher`] computes channel outputs and writes their files

mod directory;
mod publisher;

pub use directory::SensorDirectory;
pub use publisher::{resolve_output, SensorPublisher};
