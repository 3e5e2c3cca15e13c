//! Shared harness for admit-core integration tests.
//!
//! Drives a scheduler with a manual clock so lock holds expire on demand.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admit_core::{
    AcquireOutcome, DryRunExecutor, Error, ExecutionPayload, ExecutionService, InMemoryLockService,
    IsolationLevel, IterationReport, LockService, ManualClock, OpType, Request, Result, Scheduler,
    SchedulerConfig, SchedulerState, TransactionId,
};

pub struct Harness {
    pub scheduler: Scheduler,
    pub locks: Arc<InMemoryLockService>,
    pub clock: Arc<ManualClock>,
}

pub fn config(seed: u64) -> SchedulerConfig {
    let mut config = SchedulerConfig {
        seed: Some(seed),
        tick_ms: 0,
        ..SchedulerConfig::default()
    };
    config.retry.backoff_ms = 0;
    config
}

pub fn harness(seed: u64) -> Harness {
    let locks = Arc::new(InMemoryLockService::new());
    harness_with(config(seed), locks.clone(), locks, Arc::new(DryRunExecutor))
}

pub fn harness_with(
    config: SchedulerConfig,
    locks: Arc<InMemoryLockService>,
    service: Arc<dyn LockService>,
    executor: Arc<dyn ExecutionService>,
) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let scheduler = Scheduler::new(&config, service, executor, clock.clone())
        .expect("test config is valid");
    Harness {
        scheduler,
        locks,
        clock,
    }
}

pub fn request(id: u64, table: &str, level: u8) -> Request {
    Request::new(
        OpType::Read,
        table,
        IsolationLevel::try_from(level).expect("level in range"),
        TransactionId::new(id),
        id,
    )
    .expect("valid request")
}

/// Step until idle, advancing the clock one hold unit whenever nothing is
/// ready. Returns every iteration report.
pub async fn drive(h: &mut Harness, max_iterations: usize) -> Vec<IterationReport> {
    let mut reports = Vec::new();
    while h.scheduler.state() != SchedulerState::Idle {
        assert!(
            reports.len() < max_iterations,
            "scheduler did not reach idle in {max_iterations} iterations"
        );
        let report = h.scheduler.step().await;
        if report.state == SchedulerState::Waiting {
            h.clock.advance(Duration::from_secs(1));
        }
        reports.push(report);
    }
    reports
}

/// Executed transaction IDs in execution order.
pub fn execution_order(reports: &[IterationReport]) -> Vec<u64> {
    reports
        .iter()
        .filter_map(|r| r.executed.as_ref())
        .map(|e| e.request.transaction_id.get())
        .collect()
}

/// Lock service whose `try_acquire` answers come from a script before
/// falling through to an in-memory table.
pub struct ScriptedLockService {
    pub acquire_script: Mutex<VecDeque<Result<AcquireOutcome>>>,
    pub release_failures: AtomicUsize,
    pub inner: Arc<InMemoryLockService>,
}

impl ScriptedLockService {
    pub fn new(inner: Arc<InMemoryLockService>) -> Self {
        Self {
            acquire_script: Mutex::new(VecDeque::new()),
            release_failures: AtomicUsize::new(0),
            inner,
        }
    }

    pub fn script_acquire(&self, outcomes: impl IntoIterator<Item = Result<AcquireOutcome>>) {
        self.acquire_script.lock().unwrap().extend(outcomes);
    }

    pub fn fail_releases(&self, count: usize) {
        self.release_failures.store(count, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl LockService for ScriptedLockService {
    async fn try_acquire(&self, table: &str, lock_group: &str) -> Result<AcquireOutcome> {
        let scripted = self.acquire_script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => self.inner.try_acquire(table, lock_group).await,
        }
    }

    async fn release(&self, table: &str, lock_group: &str) -> Result<()> {
        let remaining = self.release_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.release_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::LockServiceUnavailable("release timed out".into()));
        }
        self.inner.release(table, lock_group).await
    }

    async fn is_busy(&self, table: &str, lock_group: &str) -> Result<bool> {
        self.inner.is_busy(table, lock_group).await
    }
}

/// Executor that fails the listed transactions.
pub struct FailingExecutor {
    pub failing: Vec<u64>,
}

#[async_trait::async_trait]
impl ExecutionService for FailingExecutor {
    async fn execute(&self, request: &Request) -> Result<ExecutionPayload> {
        if self.failing.contains(&request.transaction_id.get()) {
            return Err(Error::ExecutionError("query aborted".into()));
        }
        Ok(ExecutionPayload {
            output: format!("rows for {}", request.table),
        })
    }
}
