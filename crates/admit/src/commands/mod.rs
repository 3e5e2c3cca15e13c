//! Command implementations for the admit CLI
//!
//! Handlers in `cli::handlers` turn parsed arguments into option structs;
//! the functions here do the work.

pub mod config;
pub mod lock;
pub mod run;

use std::sync::Arc;

use admit_core::engine::Engine;
use admit_core::{
    CommandExecutor, CommandLockService, DryRunExecutor, ExecutionService, InMemoryLockService,
    LockService, LockServiceKind, SchedulerConfig,
};

/// Lock Service client for the configured transport.
#[must_use]
pub fn build_lock_service(config: &SchedulerConfig) -> Arc<dyn LockService> {
    match config.lock_service {
        LockServiceKind::Memory => Arc::new(InMemoryLockService::new()),
        LockServiceKind::Command => Arc::new(CommandLockService::new(Engine::from_config(
            &config.command,
        ))),
    }
}

/// Execution Service matching the configured transport.
///
/// The in-memory transport has no storage engine behind it, so requests are
/// never sent anywhere; `dry_run` forces the same with the command transport.
#[must_use]
pub fn build_executor(config: &SchedulerConfig, dry_run: bool) -> Arc<dyn ExecutionService> {
    match config.lock_service {
        LockServiceKind::Command if !dry_run => {
            Arc::new(CommandExecutor::from_config(&config.command))
        }
        _ => Arc::new(DryRunExecutor),
    }
}
