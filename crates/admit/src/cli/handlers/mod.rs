mod config;
mod lock;
mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

pub async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config").cloned();

    match matches.subcommand() {
        Some(("run", sub_m)) => run::handle(sub_m, config_path).await,
        Some(("lock", sub_m)) => lock::handle(sub_m, config_path).await,
        Some(("config", sub_m)) => config::handle(sub_m, config_path),
        _ => anyhow::bail!("Unknown command. Run 'admit --help' for usage."),
    }
}
