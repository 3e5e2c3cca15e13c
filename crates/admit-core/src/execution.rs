//! Execution Service contract and clients.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::CommandConfig;
use crate::engine::Engine;
use crate::request::Request;
use crate::{Error, Result};

/// Output of a successful execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPayload {
    pub output: String,
}

/// Runs a request against the storage engine.
///
/// Execution may take arbitrarily long; the scheduler holds no internal lock
/// while it runs.
#[async_trait::async_trait]
pub trait ExecutionService: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<ExecutionPayload>;
}

/// Executor that runs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait::async_trait]
impl ExecutionService for DryRunExecutor {
    async fn execute(&self, request: &Request) -> Result<ExecutionPayload> {
        tracing::debug!(tx = %request.transaction_id, table = %request.table, "dry run");
        Ok(ExecutionPayload::default())
    }
}

/// Executor that runs a select against the request's table through the
/// storage engine binary.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    engine: Engine,
    oid_prefix: String,
    select: String,
}

impl CommandExecutor {
    #[must_use]
    pub fn from_config(config: &CommandConfig) -> Self {
        Self {
            engine: Engine::from_config(config),
            oid_prefix: config.oid_prefix.clone(),
            select: config.select.clone(),
        }
    }

    fn query_args(&self, request: &Request) -> Vec<String> {
        let mut args = self.engine.table_args(&request.table);
        args.extend([
            "--start-obj".to_string(),
            "0".to_string(),
            "--oid-prefix".to_string(),
            self.oid_prefix.clone(),
            "--select".to_string(),
            self.select.clone(),
        ]);
        args
    }
}

#[async_trait::async_trait]
impl ExecutionService for CommandExecutor {
    async fn execute(&self, request: &Request) -> Result<ExecutionPayload> {
        let args = self.query_args(request);
        let output = self
            .engine
            .run(&args)
            .await
            .map_err(|e| Error::ExecutionError(format!("{}: {e}", request.transaction_id)))?;
        Ok(ExecutionPayload { output })
    }
}

/// One finished execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub request: Request,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// `Err` carries the execution error message.
    pub result: std::result::Result<ExecutionPayload, String>,
    /// Hold assigned to the table's lock, if the request held one.
    pub hold: Option<Duration>,
}

impl ExecutionRecord {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}
