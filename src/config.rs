//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`SUBMIT_LISTENER_*`)
//! 2. Config file (`~/.submit-listener/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub log: LogConfig,

    /// Simulator configuration.
    pub simulation: SimulationConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Default report format.
    pub format: OutputFormat,
}

/// Report format for `simulate`.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per event.
    #[default]
    Text,
    /// Pretty-printed JSON report.
    Json,
}

/// Get the default home directory.
fn default_home() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(".submit-listener"),
        |h| h.join(".submit-listener"),
    )
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_config() -> Result<Config> {
    let mut config = load_config_file(&get_config_path())?;
    apply_overrides(&mut config, |key| env::var(key).ok());
    Ok(config)
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// Get the path to the config file.
#[must_use]
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("SUBMIT_LISTENER_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("SUBMIT_LISTENER_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_home().join("config.toml")
}

/// Apply variable overrides to config. `lookup` reads one variable.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(filter) = lookup("SUBMIT_LISTENER_LOG") {
        config.log.filter = filter;
    }

    if let Some(format) = lookup("SUBMIT_LISTENER_FORMAT") {
        config.simulation.format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        };
    }
}
