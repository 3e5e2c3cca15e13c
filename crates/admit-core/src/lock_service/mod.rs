//! Lock Service contract.
//!
//! The scheduler never implements mutual exclusion itself; it asks an external
//! Lock Service to acquire and release a named lock on a table within a lock
//! group. Calls are expected to be synchronous from the caller's point of view
//! and bounded in time; failures surface as `LockServiceUnavailable` or
//! `LockServiceProtocolError`, never as `AlreadyHeld`.

mod command;
mod memory;

pub use command::CommandLockService;
pub use memory::{InMemoryLockService, LockCallCounts};

use crate::Result;

/// Result of a `TryAcquire` call that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now holds the lock.
    Acquired,
    /// Someone else holds the lock.
    AlreadyHeld,
}

impl AcquireOutcome {
    #[must_use]
    pub const fn is_acquired(self) -> bool {
        matches!(self, Self::Acquired)
    }
}

/// Client side of the external lock primitive.
#[async_trait::async_trait]
pub trait LockService: Send + Sync {
    /// Try to take the lock on `table` in `lock_group` without waiting.
    async fn try_acquire(&self, table: &str, lock_group: &str) -> Result<AcquireOutcome>;

    /// Release the lock on `table` in `lock_group`.
    async fn release(&self, table: &str, lock_group: &str) -> Result<()>;

    /// Advisory probe: is `table` currently locked?
    async fn is_busy(&self, table: &str, lock_group: &str) -> Result<bool>;
}
