//! Lock command implementation
//!
//! One-off Lock Service calls, useful for inspecting or clearing a table
//! lock left behind by an interrupted run.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]

use std::path::Path;

use admit_core::config::load_config;
use admit_core::{AcquireOutcome, LockService, LockServiceKind, SchedulerConfig};
use anyhow::Result;
use tracing::debug;

use super::build_lock_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    Acquire,
    Release,
    Status,
}

/// Lock command options
#[derive(Debug, Clone)]
pub struct LockOptions {
    pub action: LockAction,
    /// Table whose lock is targeted
    pub table: String,
    /// Lock group; the configured `lock_group` when absent
    pub group: Option<String>,
}

/// Run the lock command against the configured Lock Service
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The configured transport is `memory`, whose lock table does not outlive
///   the process
/// - The Lock Service call fails
pub async fn run_with_config(options: &LockOptions, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    require_command_transport(&config)?;
    let service = build_lock_service(&config);
    let group = options
        .group
        .clone()
        .unwrap_or_else(|| config.lock_group.clone());
    let message = run(options, &group, service.as_ref()).await?;
    println!("{message}");
    Ok(())
}

fn require_command_transport(config: &SchedulerConfig) -> Result<()> {
    if config.lock_service == LockServiceKind::Memory {
        anyhow::bail!(
            "'admit lock' needs the command Lock Service: the in-memory lock table only lives \
             for one process. Set lock_service = \"command\" or ADMIT_LOCK_SERVICE=command"
        );
    }
    Ok(())
}

/// Perform the lock action and describe the outcome.
///
/// # Errors
///
/// Returns an error if the table name is blank or the Lock Service call fails.
pub async fn run(options: &LockOptions, group: &str, service: &dyn LockService) -> Result<String> {
    let table = options.table.trim();
    if table.is_empty() {
        anyhow::bail!("Table name cannot be empty");
    }
    debug!(table, group, action = ?options.action, "Lock Service call");

    match options.action {
        LockAction::Acquire => match service.try_acquire(table, group).await? {
            AcquireOutcome::Acquired => Ok(format!("✓ Acquired lock on '{table}' in {group}")),
            AcquireOutcome::AlreadyHeld => {
                Ok(format!("✗ '{table}' is already locked in {group}"))
            }
        },
        LockAction::Release => {
            service.release(table, group).await?;
            Ok(format!("✓ Released lock on '{table}' in {group}"))
        }
        LockAction::Status => {
            if service.is_busy(table, group).await? {
                Ok(format!("'{table}' is locked in {group}"))
            } else {
                Ok(format!("'{table}' is free in {group}"))
            }
        }
    }
}
