//! Config command implementation

use std::path::Path;

use admit_core::config::load_config;
use admit_core::SchedulerConfig;
use anyhow::Result;

/// Print the effective configuration as TOML.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or serialized.
pub fn show(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", render(&config)?);
    Ok(())
}

fn render(config: &SchedulerConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
