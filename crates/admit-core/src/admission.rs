//! Admission control.
//!
//! Decides, per request, whether it may run now or must wait for a table lock.
//! Requests at an exempt isolation level never touch the Lock Service. All
//! others issue `TryAcquire`; a granted lock admits the request, a held lock
//! blocks it. Transport and protocol failures are retried with backoff and,
//! once the attempts run out, returned as errors so the caller can fail the
//! request instead of guessing an outcome.
//!
//! Levels 0 and 1 are exempt by default. Read Committed conventionally takes
//! short read locks; exempting it entirely is kept as configured behavior and
//! can be changed through `exempt_isolation_levels`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::lock_service::{AcquireOutcome, LockService};
use crate::request::{IsolationLevel, Request};
use crate::retry::RetryPolicy;
use crate::Result;

/// Outcome of an admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may execute; if it needs a lock, it now holds it.
    ReadyImmediately,
    /// The table's lock is held elsewhere.
    Blocked,
}

/// Admission controller for one lock group.
pub struct AdmissionController {
    lock_service: Arc<dyn LockService>,
    lock_group: String,
    exempt: HashSet<IsolationLevel>,
    retry: RetryPolicy,
}

impl AdmissionController {
    #[must_use]
    pub fn new(
        lock_service: Arc<dyn LockService>,
        lock_group: impl Into<String>,
        exempt: HashSet<IsolationLevel>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            lock_service,
            lock_group: lock_group.into(),
            exempt,
            retry,
        }
    }

    /// Lock group every call is made under.
    #[must_use]
    pub fn lock_group(&self) -> &str {
        &self.lock_group
    }

    /// Whether the request needs a table lock before it may run.
    #[must_use]
    pub fn requires_lock(&self, request: &Request) -> bool {
        !self.exempt.contains(&request.isolation_level)
    }

    /// Decide whether `request` may run now.
    ///
    /// # Errors
    ///
    /// Returns the last `LockServiceUnavailable` / `LockServiceProtocolError`
    /// once all attempts have failed, or any non-retryable service error.
    pub async fn admit(&self, request: &Request) -> Result<Decision> {
        if !self.requires_lock(request) {
            tracing::debug!(
                tx = %request.transaction_id,
                level = %request.isolation_level,
                "lock-exempt, admitted"
            );
            return Ok(Decision::ReadyImmediately);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .lock_service
                .try_acquire(&request.table, &self.lock_group)
                .await
            {
                Ok(AcquireOutcome::Acquired) => {
                    tracing::debug!(tx = %request.transaction_id, table = %request.table, "lock acquired, admitted");
                    return Ok(Decision::ReadyImmediately);
                }
                Ok(AcquireOutcome::AlreadyHeld) => {
                    tracing::debug!(tx = %request.transaction_id, table = %request.table, "table busy, blocked");
                    return Ok(Decision::Blocked);
                }
                Err(e) if e.is_retryable() && self.retry.allows_retry(attempt) => {
                    tracing::warn!(
                        tx = %request.transaction_id,
                        table = %request.table,
                        attempt,
                        "try-acquire failed, retrying: {e}"
                    );
                    self.retry.backoff(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
