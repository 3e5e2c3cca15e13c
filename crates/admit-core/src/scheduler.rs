//! Scheduler loop.
//!
//! One `Scheduler` owns the Ready Queue, the Wait Queue and the expiry tracker
//! for a lock group, and is the only thing that mutates them. Each iteration,
//! in order:
//!
//! 1. pops at most one request from the Ready Queue, executes it and, if it
//!    holds a table lock, schedules the lock's release after a random hold;
//! 2. re-attempts admission for every waiting request in arrival order,
//!    moving admitted ones to the tail of the Ready Queue and returning
//!    blocked ones to the tail of the Wait Queue;
//! 3. retries releases that failed earlier, then sweeps expired locks.
//!
//! The loop is finished when both queues are empty.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use strum::Display;

use crate::admission::{AdmissionController, Decision};
use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::execution::{ExecutionRecord, ExecutionService};
use crate::expiry::{ExpiryRecord, ExpiryTracker, HoldPolicy, SweepReport};
use crate::lock_service::LockService;
use crate::queue::RequestQueue;
use crate::request::{Request, TransactionId};
use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Where the loop stands, derived from queue occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// Both queues empty.
    Idle,
    /// Only the Ready Queue has requests.
    Draining,
    /// Only the Wait Queue has requests.
    Waiting,
    /// Both queues have requests.
    Mixed,
}

/// Where a submitted request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Ready,
    Waiting,
    /// Admission failed after retries; a `Failed` completion was recorded.
    Failed,
}

/// Final status of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum CompletionStatus {
    Executed,
    Failed(String),
    Cancelled,
}

/// Report handed back to the workload source for every finished request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub transaction_id: TransactionId,
    pub table: String,
    #[serde(flatten)]
    pub status: CompletionStatus,
    pub iteration: u64,
    pub at: DateTime<Utc>,
}

/// Queue contents at a point in time, head first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub ready: Vec<TransactionId>,
    pub waiting: Vec<TransactionId>,
}

/// What one iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub iteration: u64,
    pub executed: Option<ExecutionRecord>,
    /// Waiting requests admitted during the retry pass, in order.
    pub promoted: Vec<TransactionId>,
    /// Waiting requests whose re-admission failed.
    pub failed: Vec<TransactionId>,
    pub sweep: SweepReport,
    pub state: SchedulerState,
}

/// Result of running a workload to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    /// Executed transactions in execution order.
    pub execution_order: Vec<TransactionId>,
    pub completions: Vec<Completion>,
    pub orphaned_locks: Vec<String>,
}

/// Single-writer admission scheduler for one lock group.
pub struct Scheduler {
    admission: AdmissionController,
    executor: Arc<dyn ExecutionService>,
    expiry: ExpiryTracker,
    clock: Arc<dyn Clock>,
    hold: HoldPolicy,
    rng: StdRng,
    ready: RequestQueue,
    waiting: RequestQueue,
    completions: Vec<Completion>,
    execution_order: Vec<TransactionId>,
    iteration: u64,
    tick: Duration,
    max_iterations: Option<u64>,
}

impl Scheduler {
    /// Build a scheduler from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(
        config: &SchedulerConfig,
        lock_service: Arc<dyn LockService>,
        executor: Arc<dyn ExecutionService>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let admission = AdmissionController::new(
            Arc::clone(&lock_service),
            config.lock_group.clone(),
            config.exempt_levels()?,
            RetryPolicy::for_acquire(&config.retry),
        );
        let expiry = ExpiryTracker::new(
            lock_service,
            config.lock_group.clone(),
            Arc::clone(&clock),
            RetryPolicy::for_release(&config.retry),
        );
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Ok(Self {
            admission,
            executor,
            expiry,
            clock,
            hold: HoldPolicy::from_config(&config.hold),
            rng,
            ready: RequestQueue::new(),
            waiting: RequestQueue::new(),
            completions: Vec::new(),
            execution_order: Vec::new(),
            iteration: 0,
            tick: Duration::from_millis(config.tick_ms),
            max_iterations: config.max_iterations,
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // SUBMISSION
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run admission for a new request and queue it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the request is malformed or its transaction
    /// is already queued. Lock Service failures do not error; they produce a
    /// `Failed` completion and `Placement::Failed`.
    pub async fn submit(&mut self, request: Request) -> Result<Placement> {
        request.validate()?;
        if self.is_queued(request.transaction_id) {
            return Err(Error::InvalidRequest(format!(
                "{} is already queued",
                request.transaction_id
            )));
        }

        let placement = match self.admission.admit(&request).await {
            Ok(Decision::ReadyImmediately) => {
                self.ready.push(request);
                Placement::Ready
            }
            Ok(Decision::Blocked) => {
                self.waiting.push(request);
                Placement::Waiting
            }
            Err(e) => {
                self.fail(&request, &e);
                Placement::Failed
            }
        };
        Ok(placement)
    }

    /// Submit requests in order.
    ///
    /// # Errors
    ///
    /// Stops at the first request `submit` rejects.
    pub async fn submit_all(
        &mut self,
        requests: impl IntoIterator<Item = Request>,
    ) -> Result<Vec<Placement>> {
        let mut placements = Vec::new();
        for request in requests {
            placements.push(self.submit(request).await?);
        }
        Ok(placements)
    }

    /// Withdraw a request that is still waiting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the request was already admitted and
    /// `NotFound` if it is not queued at all.
    pub fn cancel(&mut self, id: TransactionId) -> Result<Request> {
        if let Some(request) = self.waiting.remove(id) {
            tracing::info!(tx = %id, "cancelled while waiting");
            self.complete(&request, CompletionStatus::Cancelled);
            return Ok(request);
        }
        if self.ready.contains(id) {
            return Err(Error::InvalidRequest(format!(
                "{id} is already admitted and cannot be cancelled"
            )));
        }
        Err(Error::NotFound(format!("{id} is not waiting")))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // LOOP
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Perform one iteration.
    pub async fn step(&mut self) -> IterationReport {
        self.iteration += 1;
        let snapshot = self.snapshot();
        tracing::debug!(
            iteration = self.iteration,
            ready = ?snapshot.ready,
            waiting = ?snapshot.waiting,
            "iteration start"
        );

        let executed = match self.ready.pop() {
            Some(request) => Some(self.execute(request).await),
            None => None,
        };

        let (promoted, failed) = self.retry_waiting().await;

        let sweep = self.expiry.sweep(self.clock.now()).await;

        IterationReport {
            iteration: self.iteration,
            executed,
            promoted,
            failed,
            sweep,
            state: self.state(),
        }
    }

    /// Iterate until both queues are empty.
    ///
    /// When nothing is ready, waits for the shorter of the tick interval and
    /// the next lock deadline before iterating again.
    ///
    /// # Errors
    ///
    /// Returns `IterationLimit` if `max_iterations` is reached first.
    pub async fn run(&mut self) -> Result<RunSummary> {
        while self.state() != SchedulerState::Idle {
            if let Some(max) = self.max_iterations {
                if self.iteration >= max {
                    return Err(Error::IterationLimit(max));
                }
            }

            self.step().await;

            if self.state() == SchedulerState::Waiting {
                self.pause().await;
            }
        }

        tracing::info!(
            iterations = self.iteration,
            completed = self.completions.len(),
            "scheduler idle"
        );
        Ok(self.summary())
    }

    /// Wait out the remaining lock holds and release them.
    ///
    /// Called once the loop is idle so that no lock outlives the run. Each
    /// deadline is slept until on the tokio timer, so this only finishes
    /// with a clock that advances on its own; with a `ManualClock`, advance
    /// the clock and call `step` instead.
    pub async fn settle(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        while let Some(deadline) = self.expiry.next_deadline() {
            let wait = deadline.saturating_duration_since(self.clock.now());
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            let sweep = self.expiry.sweep(self.clock.now()).await;
            report.released.extend(sweep.released);
            report.orphaned.extend(sweep.orphaned);
        }
        if self.expiry.has_orphans() {
            let sweep = self.expiry.sweep(self.clock.now()).await;
            report.released.extend(sweep.released);
        }
        tracing::debug!(released = ?report.released, "all holds settled");
        report
    }

    async fn pause(&self) {
        if self.tick.is_zero() {
            return;
        }
        let now = self.clock.now();
        let delay = self
            .expiry
            .next_deadline()
            .map_or(self.tick, |deadline| {
                deadline.saturating_duration_since(now).min(self.tick)
            });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn execute(&mut self, request: Request) -> ExecutionRecord {
        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.executor.execute(&request).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(tx = %request.transaction_id, table = %request.table, ?elapsed, "executed");
                self.complete(&request, CompletionStatus::Executed);
                self.execution_order.push(request.transaction_id);
            }
            Err(e) => self.fail(&request, e),
        }

        // Execution may have consumed resources even when it failed, so the
        // hold is scheduled either way.
        let hold = if self.admission.requires_lock(&request) {
            self.schedule_release(&request.table)
        } else {
            None
        };

        ExecutionRecord {
            request,
            started_at,
            elapsed,
            result: result.map_err(|e| e.to_string()),
            hold,
        }
    }

    fn schedule_release(&mut self, table: &str) -> Option<Duration> {
        let hold = self.hold.sample(&mut self.rng);
        match self.expiry.schedule(table, hold) {
            Ok(_) => Some(hold),
            Err(e) => {
                tracing::warn!(table, "keeping existing release deadline: {e}");
                None
            }
        }
    }

    async fn retry_waiting(&mut self) -> (Vec<TransactionId>, Vec<TransactionId>) {
        let pending: Vec<Request> = self.waiting.drain().collect();
        let mut promoted = Vec::new();
        let mut failed = Vec::new();

        for request in pending {
            match self.admission.admit(&request).await {
                Ok(Decision::ReadyImmediately) => {
                    tracing::debug!(tx = %request.transaction_id, "promoted to ready");
                    promoted.push(request.transaction_id);
                    self.ready.push(request);
                }
                Ok(Decision::Blocked) => self.waiting.push(request),
                Err(e) => {
                    failed.push(request.transaction_id);
                    self.fail(&request, &e);
                }
            }
        }
        (promoted, failed)
    }

    fn fail(&mut self, request: &Request, error: &Error) {
        tracing::error!(tx = %request.transaction_id, table = %request.table, "request failed: {error}");
        self.complete(request, CompletionStatus::Failed(error.to_string()));
    }

    fn complete(&mut self, request: &Request, status: CompletionStatus) {
        self.completions.push(Completion {
            transaction_id: request.transaction_id,
            table: request.table.clone(),
            status,
            iteration: self.iteration,
            at: Utc::now(),
        });
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // INSPECTION
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Current state from queue occupancy.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        match (self.ready.is_empty(), self.waiting.is_empty()) {
            (true, true) => SchedulerState::Idle,
            (false, true) => SchedulerState::Draining,
            (true, false) => SchedulerState::Waiting,
            (false, false) => SchedulerState::Mixed,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            ready: self.ready.ids(),
            waiting: self.waiting.ids(),
        }
    }

    #[must_use]
    pub fn is_queued(&self, id: TransactionId) -> bool {
        self.ready.contains(id) || self.waiting.contains(id)
    }

    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Live expiry records, earliest first.
    #[must_use]
    pub fn expiry_records(&self) -> Vec<ExpiryRecord> {
        self.expiry.records()
    }

    #[must_use]
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Hand completions to the caller, clearing them.
    pub fn take_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completions)
    }

    /// Tables whose release has not been acknowledged; retried every
    /// iteration until it is.
    #[must_use]
    pub fn orphaned_locks(&self) -> Vec<String> {
        self.expiry.orphans()
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            iterations: self.iteration,
            execution_order: self.execution_order.clone(),
            completions: self.completions.clone(),
            orphaned_locks: self.expiry.orphans(),
        }
    }
}
