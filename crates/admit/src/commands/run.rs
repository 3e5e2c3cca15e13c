//! Run command implementation
//!
//! Loads configuration and a workload, drives the scheduler until both
//! queues are empty and prints the run summary.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use admit_core::config::load_config;
use admit_core::{
    CompletionStatus, ExecutionService, LockService, RunSummary, Scheduler, SchedulerConfig,
    SystemClock, Workload,
};
use anyhow::{Context, Result};
use tracing::info;

use super::{build_executor, build_lock_service};

/// Run command options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Config file replacing the project config
    pub config_path: Option<PathBuf>,
    /// JSON workload file; the canonical workload when absent
    pub workload: Option<PathBuf>,
    pub seed: Option<u64>,
    pub max_iterations: Option<u64>,
    /// Skip the storage engine even with the command transport
    pub dry_run: bool,
    /// Print the summary as JSON
    pub json: bool,
}

/// Run the run command
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded or is invalid
/// - The workload file cannot be read or parsed
/// - The scheduler hits its iteration limit
pub async fn run(options: &RunOptions) -> Result<()> {
    let config = resolve_config(options)?;
    let workload = load_workload(options)?;

    info!(
        requests = workload.len(),
        lock_group = %config.lock_group,
        lock_service = %config.lock_service,
        "Starting run"
    );

    let lock_service = build_lock_service(&config);
    let executor = build_executor(&config, options.dry_run);
    let summary = run_workload(&config, workload, lock_service, executor).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Loaded config with the CLI overrides applied last.
fn resolve_config(options: &RunOptions) -> Result<SchedulerConfig> {
    let config = load_config(options.config_path.as_deref())?;
    apply_overrides(config, options)
}

fn apply_overrides(mut config: SchedulerConfig, options: &RunOptions) -> Result<SchedulerConfig> {
    if let Some(seed) = options.seed {
        config.seed = Some(seed);
    }
    if let Some(max) = options.max_iterations {
        config.max_iterations = Some(max);
    }
    config.validate()?;
    Ok(config)
}

fn load_workload(options: &RunOptions) -> Result<Workload> {
    match &options.workload {
        Some(path) => Workload::from_json_file(path)
            .with_context(|| format!("Failed to load workload from {}", path.display())),
        None => Ok(Workload::canonical()),
    }
}

/// Submit every request, run the scheduler to idle and release the locks
/// still held when it gets there.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built, a request is rejected,
/// or the iteration limit is reached.
pub async fn run_workload(
    config: &SchedulerConfig,
    workload: Workload,
    lock_service: Arc<dyn LockService>,
    executor: Arc<dyn ExecutionService>,
) -> Result<RunSummary> {
    let mut scheduler = Scheduler::new(config, lock_service, executor, Arc::new(SystemClock))?;
    scheduler.submit_all(workload.into_requests()).await?;
    scheduler.run().await?;
    let settled = scheduler.settle().await;
    if !settled.is_empty() {
        info!(released = ?settled.released, "Released remaining holds");
    }
    let summary = scheduler.summary();
    info!(
        iterations = summary.iterations,
        executed = summary.execution_order.len(),
        "Run finished"
    );
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("Finished in {} iterations", summary.iterations);
    for completion in &summary.completions {
        let status = match &completion.status {
            CompletionStatus::Executed => "executed".to_string(),
            CompletionStatus::Failed(reason) => format!("failed: {reason}"),
            CompletionStatus::Cancelled => "cancelled".to_string(),
        };
        println!(
            "  {} on '{}' (iteration {}): {status}",
            completion.transaction_id, completion.table, completion.iteration
        );
    }
    if !summary.orphaned_locks.is_empty() {
        println!(
            "⚠ Locks that could not be released: {}",
            summary.orphaned_locks.join(", ")
        );
    }
}
