//! Invocation of the external storage engine binary.
//!
//! Both the command Lock Service and the command executor talk to the same
//! storage engine CLI. This module owns spawning it under a timeout and
//! classifying how an invocation failed; callers map failures onto their own
//! error kinds.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::config::CommandConfig;

/// How a storage engine invocation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineFailure {
    /// The binary could not be started.
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The binary ran but exited unsuccessfully.
    #[error("{program} exited with {code:?}: {stderr}")]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The binary did not finish within the timeout.
    #[error("{program} timed out after {elapsed:?}")]
    Timeout { program: String, elapsed: Duration },
}

/// A configured storage engine binary.
#[derive(Debug, Clone)]
pub struct Engine {
    program: String,
    pool: String,
    timeout: Duration,
}

impl Engine {
    /// Build from the `[command]` configuration section.
    #[must_use]
    pub fn from_config(config: &CommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            pool: config.pool.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Name of the binary.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments shared by every invocation against one table.
    #[must_use]
    pub fn table_args(&self, table: &str) -> Vec<String> {
        vec![
            "--num-objs".to_string(),
            "1".to_string(),
            "--pool".to_string(),
            self.pool.clone(),
            "--table-name".to_string(),
            table.to_string(),
        ]
    }

    /// Run the engine and return its stdout.
    pub async fn run(&self, args: &[String]) -> std::result::Result<String, EngineFailure> {
        tracing::debug!(program = %self.program, ?args, "invoking storage engine");

        let child = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| EngineFailure::Timeout {
                program: self.program.clone(),
                elapsed: self.timeout,
            })?
            .map_err(|e| EngineFailure::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EngineFailure::Exit {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
