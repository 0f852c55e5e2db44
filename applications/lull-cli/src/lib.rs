//! Lull CLI - configuration and simulated backends for the `lull` binary

pub mod config;
pub mod engine;
pub mod error;
pub mod transport;

pub use config::{AppConfig, DemoBackend, DemoSettings, PresetSettings};
pub use engine::SimulatedEngine;
pub use error::{CliError, Result};
