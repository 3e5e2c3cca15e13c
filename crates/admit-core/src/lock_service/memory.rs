//! In-process lock table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{AcquireOutcome, LockService};
use crate::Result;

/// A held lock
#[derive(Debug, Clone)]
pub struct HeldLock {
    /// Table being locked
    pub table: String,
    /// Lock group the table belongs to
    pub lock_group: String,
    /// When acquired
    pub acquired_at: DateTime<Utc>,
}

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockCallCounts {
    pub try_acquire: usize,
    pub release: usize,
    pub is_busy: usize,
}

impl LockCallCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.try_acquire + self.release + self.is_busy
    }
}

/// Lock service backed by an in-memory table keyed by `(lock_group, table)`.
///
/// Locks have no holder identity and no TTL: a lock stays held until
/// `release` is called, which is the contract the expiry tracker relies on.
#[derive(Debug, Default)]
pub struct InMemoryLockService {
    locks: Mutex<HashMap<(String, String), HeldLock>>,
    try_acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
    is_busy_calls: AtomicUsize,
}

impl InMemoryLockService {
    /// Create a new, empty lock service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all held locks
    pub async fn held_locks(&self) -> Vec<HeldLock> {
        let locks = self.locks.lock().await;
        let mut held: Vec<HeldLock> = locks.values().cloned().collect();
        held.sort_by(|a, b| (&a.lock_group, &a.table).cmp(&(&b.lock_group, &b.table)));
        held
    }

    /// Check whether a table is locked without counting it as a service call
    pub async fn is_held(&self, table: &str, lock_group: &str) -> bool {
        self.locks
            .lock()
            .await
            .contains_key(&(lock_group.to_string(), table.to_string()))
    }

    /// Calls received so far
    #[must_use]
    pub fn call_counts(&self) -> LockCallCounts {
        LockCallCounts {
            try_acquire: self.try_acquire_calls.load(Ordering::SeqCst),
            release: self.release_calls.load(Ordering::SeqCst),
            is_busy: self.is_busy_calls.load(Ordering::SeqCst),
        }
    }
}

#[async_trait::async_trait]
impl LockService for InMemoryLockService {
    async fn try_acquire(&self, table: &str, lock_group: &str) -> Result<AcquireOutcome> {
        self.try_acquire_calls.fetch_add(1, Ordering::SeqCst);
        let mut locks = self.locks.lock().await;
        let key = (lock_group.to_string(), table.to_string());

        if locks.contains_key(&key) {
            return Ok(AcquireOutcome::AlreadyHeld);
        }

        locks.insert(
            key,
            HeldLock {
                table: table.to_string(),
                lock_group: lock_group.to_string(),
                acquired_at: Utc::now(),
            },
        );
        Ok(AcquireOutcome::Acquired)
    }

    async fn release(&self, table: &str, lock_group: &str) -> Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.locks
            .lock()
            .await
            .remove(&(lock_group.to_string(), table.to_string()));
        Ok(())
    }

    async fn is_busy(&self, table: &str, lock_group: &str) -> Result<bool> {
        self.is_busy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.is_held(table, lock_group).await)
    }
}
