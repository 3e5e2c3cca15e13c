//! Behavior when the Lock Service or the Execution Service misbehaves.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use admit_core::{
    AcquireOutcome, CompletionStatus, DryRunExecutor, Error, InMemoryLockService, Placement,
    SchedulerState, TransactionId,
};
use common::{
    config, drive, execution_order, harness_with, request, FailingExecutor, ScriptedLockService,
};

fn unavailable() -> admit_core::Result<AcquireOutcome> {
    Err(Error::LockServiceUnavailable("connect timeout".into()))
}

fn garbled() -> admit_core::Result<AcquireOutcome> {
    Err(Error::LockServiceProtocolError("unexpected value 'x'".into()))
}

#[tokio::test]
async fn transient_errors_do_not_block_or_admit_wrongly() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));
    service.script_acquire([unavailable(), garbled()]);

    let mut h = harness_with(config(1), locks.clone(), service, Arc::new(DryRunExecutor));
    let placement = h.scheduler.submit(request(1, "S", 3)).await.unwrap();

    // Two failures then the real answer on the third attempt.
    assert_eq!(placement, Placement::Ready);
    assert!(locks.is_held("S", "public.lock").await);
}

#[tokio::test]
async fn exhausted_admission_retries_fail_the_request() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));
    service.script_acquire([unavailable(), unavailable(), unavailable()]);

    let mut h = harness_with(config(1), locks.clone(), service, Arc::new(DryRunExecutor));
    let placement = h.scheduler.submit(request(1, "S", 3)).await.unwrap();

    assert_eq!(placement, Placement::Failed);
    assert_eq!(h.scheduler.state(), SchedulerState::Idle);
    let completions = h.scheduler.take_completions();
    assert_eq!(completions.len(), 1);
    assert!(matches!(
        &completions[0].status,
        CompletionStatus::Failed(reason) if reason.contains("unavailable")
    ));
    assert!(!locks.is_held("S", "public.lock").await);
}

#[tokio::test]
async fn waiting_request_failing_readmission_leaves_wait_queue() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));

    let mut h = harness_with(
        config(1),
        locks.clone(),
        service.clone(),
        Arc::new(DryRunExecutor),
    );
    h.scheduler.submit(request(1, "S", 3)).await.unwrap();
    h.scheduler.submit(request(2, "S", 2)).await.unwrap();

    service.script_acquire([garbled(), garbled(), garbled()]);
    let report = h.scheduler.step().await;

    assert_eq!(report.failed, vec![TransactionId::new(2)]);
    assert!(h.scheduler.snapshot().waiting.is_empty());
    assert_eq!(report.state, SchedulerState::Idle);
}

#[tokio::test]
async fn release_failure_retried_then_reported_orphaned() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));
    service.fail_releases(2);

    let mut h = harness_with(
        config(4),
        locks.clone(),
        service.clone(),
        Arc::new(DryRunExecutor),
    );
    h.scheduler.submit(request(1, "S", 3)).await.unwrap();
    h.scheduler.step().await;

    h.clock.advance(Duration::from_secs(5));
    let report = h.scheduler.step().await;

    assert_eq!(report.sweep.orphaned, vec!["S".to_string()]);
    assert_eq!(h.scheduler.orphaned_locks(), ["S".to_string()]);
    assert!(h.scheduler.expiry_records().is_empty());
    // The scheduler dropped its record but the lock table still holds S.
    assert!(locks.is_held("S", "public.lock").await);
}

#[tokio::test]
async fn orphaned_lock_is_released_once_service_recovers() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));
    service.fail_releases(2);

    let mut h = harness_with(
        config(4),
        locks.clone(),
        service.clone(),
        Arc::new(DryRunExecutor),
    );
    h.scheduler.submit(request(1, "S", 3)).await.unwrap();
    assert_eq!(
        h.scheduler.submit(request(2, "S", 3)).await.unwrap(),
        Placement::Waiting
    );
    h.scheduler.step().await;

    h.clock.advance(Duration::from_secs(5));
    let report = h.scheduler.step().await;
    assert_eq!(report.sweep.orphaned, vec!["S".to_string()]);

    // The next sweep retries the release; the waiter then gets the lock.
    let reports = drive(&mut h, 20).await;
    assert!(reports
        .iter()
        .any(|r| r.sweep.released.iter().any(|t| t == "S")));
    assert_eq!(execution_order(&reports), vec![2]);
    assert!(h.scheduler.orphaned_locks().is_empty());
    assert_eq!(h.scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn single_release_failure_recovers_on_retry() {
    let locks = Arc::new(InMemoryLockService::new());
    let service = Arc::new(ScriptedLockService::new(locks.clone()));
    service.fail_releases(1);

    let mut h = harness_with(
        config(4),
        locks.clone(),
        service.clone(),
        Arc::new(DryRunExecutor),
    );
    h.scheduler.submit(request(1, "S", 3)).await.unwrap();
    h.scheduler.step().await;

    h.clock.advance(Duration::from_secs(5));
    let report = h.scheduler.step().await;

    assert_eq!(report.sweep.released, vec!["S".to_string()]);
    assert!(report.sweep.orphaned.is_empty());
    assert!(!locks.is_held("S", "public.lock").await);
}

#[tokio::test]
async fn execution_error_fails_request_but_still_holds_table() {
    let locks = Arc::new(InMemoryLockService::new());
    let mut h = harness_with(
        config(8),
        locks.clone(),
        locks.clone(),
        Arc::new(FailingExecutor { failing: vec![1] }),
    );
    h.scheduler.submit(request(1, "S", 2)).await.unwrap();
    h.scheduler.submit(request(2, "S", 3)).await.unwrap();

    let report = h.scheduler.step().await;
    let executed = report.executed.expect("request 1 ran");
    assert!(!executed.succeeded());
    assert!(executed.hold.is_some());
    assert_eq!(h.scheduler.expiry_records().len(), 1);

    drive(&mut h, 100).await;
    let statuses: Vec<_> = h
        .scheduler
        .completions()
        .iter()
        .map(|c| (c.transaction_id.get(), c.status.clone()))
        .collect();
    assert!(matches!(statuses[0], (1, CompletionStatus::Failed(_))));
    assert_eq!(statuses[1], (2, CompletionStatus::Executed));
}
