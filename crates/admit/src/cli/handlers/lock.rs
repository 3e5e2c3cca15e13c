use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use crate::commands::lock::{self, LockAction, LockOptions};

pub async fn handle(matches: &ArgMatches, config_path: Option<PathBuf>) -> Result<()> {
    let (action, sub_m) = match matches.subcommand() {
        Some(("acquire", m)) => (LockAction::Acquire, m),
        Some(("release", m)) => (LockAction::Release, m),
        Some(("status", m)) => (LockAction::Status, m),
        _ => anyhow::bail!("Unknown lock subcommand. Run 'admit lock --help' for usage."),
    };

    let table = sub_m
        .get_one::<String>("table")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--table is required"))?;

    let options = LockOptions {
        action,
        table,
        group: sub_m.get_one::<String>("group").cloned(),
    };
    lock::run_with_config(&options, config_path.as_deref()).await
}
