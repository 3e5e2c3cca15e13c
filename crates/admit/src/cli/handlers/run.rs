use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use crate::commands::run::{self, RunOptions};

pub async fn handle(matches: &ArgMatches, config_path: Option<PathBuf>) -> Result<()> {
    let options = RunOptions {
        config_path,
        workload: matches.get_one::<PathBuf>("workload").cloned(),
        seed: matches.get_one::<u64>("seed").copied(),
        max_iterations: matches.get_one::<u64>("max-iterations").copied(),
        dry_run: matches.get_flag("dry-run"),
        json: matches.get_flag("json"),
    };
    run::run(&options).await
}
