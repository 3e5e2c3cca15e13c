//! Lock service that shells out to the storage engine's `--lock-op` mode.
//!
//! The engine prints diagnostic lines followed by `key:value` pairs. A
//! successful acquire prints the lock object's data (`print_data`); otherwise
//! the value of the last pair carries the answer.

use super::{AcquireOutcome, LockService};
use crate::engine::{Engine, EngineFailure};
use crate::{Error, Result};

/// Marker printed by the engine when the acquire call took the lock.
const ACQUIRED_MARKER: &str = "print_data";

/// Lock service reached through the storage engine binary.
#[derive(Debug, Clone)]
pub struct CommandLockService {
    engine: Engine,
}

impl CommandLockService {
    #[must_use]
    pub const fn new(engine: Engine) -> Self {
        Self { engine }
    }

    fn lock_op_args(&self, table: &str, op: &str, lock_group: &str) -> Vec<String> {
        let mut args = self.engine.table_args(table);
        args.push("--lock-op".to_string());
        args.push(format!("--{op}-lock-obj"));
        args.push(lock_group.to_string());
        args
    }

    async fn lock_op(&self, table: &str, op: &str, lock_group: &str) -> Result<String> {
        let args = self.lock_op_args(table, op, lock_group);
        self.engine.run(&args).await.map_err(unavailable)
    }
}

fn unavailable(failure: EngineFailure) -> Error {
    Error::LockServiceUnavailable(failure.to_string())
}

/// Value of the last `key:value` line in the engine output.
fn last_value(output: &str) -> Option<&str> {
    output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim())
        .last()
}

/// Interpret the last value as a boolean flag (`1` / `0`).
fn parse_flag(output: &str, op: &str) -> Result<bool> {
    match last_value(output) {
        Some("1") => Ok(true),
        Some("0") => Ok(false),
        Some(other) => Err(Error::LockServiceProtocolError(format!(
            "unexpected {op} value '{other}'"
        ))),
        None => Err(Error::LockServiceProtocolError(format!(
            "no key:value line in {op} output"
        ))),
    }
}

pub(crate) fn parse_acquire_output(output: &str) -> Result<AcquireOutcome> {
    if output.contains(ACQUIRED_MARKER) {
        return Ok(AcquireOutcome::Acquired);
    }
    parse_flag(output, "acquire").map(|acquired| {
        if acquired {
            AcquireOutcome::Acquired
        } else {
            AcquireOutcome::AlreadyHeld
        }
    })
}

pub(crate) fn parse_busy_output(output: &str) -> Result<bool> {
    parse_flag(output, "get-lock")
}

#[async_trait::async_trait]
impl LockService for CommandLockService {
    async fn try_acquire(&self, table: &str, lock_group: &str) -> Result<AcquireOutcome> {
        let output = self.lock_op(table, "acquire", lock_group).await?;
        parse_acquire_output(&output)
    }

    async fn release(&self, table: &str, lock_group: &str) -> Result<()> {
        self.lock_op(table, "free", lock_group).await.map(|_| ())
    }

    async fn is_busy(&self, table: &str, lock_group: &str) -> Result<bool> {
        let output = self.lock_op(table, "get", lock_group).await?;
        parse_busy_output(&output)
    }
}
