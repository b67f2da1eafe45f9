//! Error types for submit-listener.
//!
//! The interceptor itself never produces errors: vetoes are plain `None`
//! results and panics from hooks or the engine unwind through untouched.
//! These variants cover the surrounding config, scenario and CLI layers.

use std::io;
use thiserror::Error;

/// Result type alias for submit-listener operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the interceptor core.
#[derive(Debug, Error)]
pub enum Error {
    /// File or stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parse error (scenario or config file).
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario is well-formed TOML but describes an impossible run.
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}
