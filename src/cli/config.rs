//! `submit-listener config` command implementation.

use crate::config::{Config, get_config_path};
use crate::error::{Error, Result};

/// Run the config command.
///
/// Prints the effective configuration (after env overrides) as TOML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn run(config: &Config) -> Result<()> {
    let path = get_config_path();
    let rendered = render(config)?;

    println!("# Config file: {}", path.display());
    if !path.exists() {
        println!("# (not found, using defaults)");
    }
    print!("{rendered}");
    Ok(())
}

/// Render configuration as TOML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(config: &Config) -> Result<String> {
    toml::to_string(config).map_err(|e| Error::Config(e.to_string()))
}
