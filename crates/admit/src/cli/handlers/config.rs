use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use crate::commands::config;

pub fn handle(matches: &ArgMatches, config_path: Option<PathBuf>) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => config::show(config_path.as_deref()),
        _ => anyhow::bail!("Unknown config subcommand. Run 'admit config --help' for usage."),
    }
}
