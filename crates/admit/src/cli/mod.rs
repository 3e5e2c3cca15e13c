pub mod handlers;
pub mod setup;

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("admit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Two-phase locking admission scheduler for table workloads")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use instead of .admit/config.toml"),
        )
        .subcommand(cmd_run())
        .subcommand(cmd_lock())
        .subcommand(cmd_config())
}

fn cmd_run() -> Command {
    Command::new("run")
        .about("Run a workload until both queues are empty")
        .arg(
            Arg::new("workload")
                .long("workload")
                .short('w')
                .value_parser(value_parser!(PathBuf))
                .help("JSON array of requests (defaults to the canonical workload)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for hold durations"),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_parser(value_parser!(u64))
                .help("Fail if the scheduler is not idle after this many iterations"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Do not execute requests against the storage engine"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the run summary as JSON"),
        )
}

fn table_arg() -> Arg {
    Arg::new("table")
        .long("table")
        .short('t')
        .required(true)
        .help("Table name")
}

fn group_arg() -> Arg {
    Arg::new("group")
        .long("group")
        .short('g')
        .help("Lock group (defaults to the configured lock_group)")
}

fn cmd_lock() -> Command {
    Command::new("lock")
        .about("One-off Lock Service operations (command transport only)")
        .subcommand_required(true)
        .subcommand(
            Command::new("acquire")
                .about("Try to acquire a table lock")
                .arg(table_arg())
                .arg(group_arg()),
        )
        .subcommand(
            Command::new("release")
                .about("Release a table lock")
                .arg(table_arg())
                .arg(group_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Check whether a table is locked")
                .arg(table_arg())
                .arg(group_arg()),
        )
}

fn cmd_config() -> Command {
    Command::new("config")
        .about("Inspect configuration")
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Print the effective configuration"))
}
