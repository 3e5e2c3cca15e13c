//! Expiry tracking for held table locks.
//!
//! After a locking request executes, its table stays locked for a random hold
//! duration. The tracker keeps one deadline per table and, on each sweep,
//! releases every lock whose deadline has passed. A failed release is retried;
//! if it still fails the lock is reported as orphaned and its deadline record
//! is dropped. Orphaned tables get one more release attempt on every later
//! sweep until the Lock Service acknowledges it, so requests waiting on the
//! table are not stranded once the service recovers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::clock::Clock;
use crate::config::HoldConfig;
use crate::lock_service::LockService;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Range a hold duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldPolicy {
    min_units: u64,
    max_units: u64,
    unit: Duration,
}

impl HoldPolicy {
    /// Uniform over `min_units..=max_units` time units.
    #[must_use]
    pub fn new(min_units: u64, max_units: u64, unit: Duration) -> Self {
        Self {
            min_units: min_units.min(max_units),
            max_units,
            unit,
        }
    }

    #[must_use]
    pub fn from_config(config: &HoldConfig) -> Self {
        Self::new(
            config.min_units,
            config.max_units,
            Duration::from_millis(config.unit_ms),
        )
    }

    /// Shortest possible hold.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.unit_multiple(self.min_units)
    }

    /// Longest possible hold.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.unit_multiple(self.max_units)
    }

    /// Draw a hold duration.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.unit_multiple(rng.gen_range(self.min_units..=self.max_units))
    }

    fn unit_multiple(&self, units: u64) -> Duration {
        self.unit
            .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }
}

/// A live deadline for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryRecord {
    pub table: String,
    pub release_at: Instant,
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tables whose release was acknowledged, including orphans that
    /// recovered.
    pub released: Vec<String>,
    /// Tables that became orphaned during this sweep.
    pub orphaned: Vec<String>,
}

impl SweepReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.released.is_empty() && self.orphaned.is_empty()
    }
}

/// Maps held table locks to their release deadline.
pub struct ExpiryTracker {
    records: HashMap<String, Instant>,
    /// Tables whose release kept failing; retried every sweep.
    orphans: BTreeSet<String>,
    lock_service: Arc<dyn LockService>,
    lock_group: String,
    clock: Arc<dyn Clock>,
    release_retry: RetryPolicy,
}

impl ExpiryTracker {
    #[must_use]
    pub fn new(
        lock_service: Arc<dyn LockService>,
        lock_group: impl Into<String>,
        clock: Arc<dyn Clock>,
        release_retry: RetryPolicy,
    ) -> Self {
        Self {
            records: HashMap::new(),
            orphans: BTreeSet::new(),
            lock_service,
            lock_group: lock_group.into(),
            clock,
            release_retry,
        }
    }

    /// Record that `table` must be released `hold` from now.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateExpiry` if the table already has a live record.
    pub fn schedule(&mut self, table: &str, hold: Duration) -> Result<ExpiryRecord> {
        if self.records.contains_key(table) {
            return Err(Error::DuplicateExpiry(table.to_string()));
        }
        // A fresh hold means the lock was granted again, so the earlier
        // release did take effect.
        if self.orphans.remove(table) {
            tracing::info!(table, "orphaned lock was re-acquired; no longer retrying release");
        }
        let release_at = self.clock.now() + hold;
        self.records.insert(table.to_string(), release_at);
        tracing::debug!(table, ?hold, "scheduled lock release");
        Ok(ExpiryRecord {
            table: table.to_string(),
            release_at,
        })
    }

    /// Retry orphaned releases, then release every lock whose deadline is at
    /// or before `now`.
    pub async fn sweep(&mut self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();
        self.retry_orphans(&mut report).await;

        let mut due: Vec<(String, Instant)> = self
            .records
            .iter()
            .filter(|(_, release_at)| **release_at <= now)
            .map(|(table, &release_at)| (table.clone(), release_at))
            .collect();
        due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (table, _) in due {
            match self.release(&table).await {
                Ok(()) => {
                    tracing::info!(table = %table, lock_group = %self.lock_group, "released lock");
                    report.released.push(table.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        table = %table,
                        lock_group = %self.lock_group,
                        "orphaned lock: release failed after {} attempts: {e}",
                        self.release_retry.max_attempts
                    );
                    report.orphaned.push(table.clone());
                    self.orphans.insert(table.clone());
                }
            }
            self.records.remove(&table);
        }
        report
    }

    async fn retry_orphans(&mut self, report: &mut SweepReport) {
        let pending: Vec<String> = self.orphans.iter().cloned().collect();
        for table in pending {
            match self.lock_service.release(&table, &self.lock_group).await {
                Ok(()) => {
                    tracing::info!(table = %table, lock_group = %self.lock_group, "released orphaned lock");
                    self.orphans.remove(&table);
                    report.released.push(table);
                }
                Err(e) => tracing::debug!(table = %table, "orphaned lock still not released: {e}"),
            }
        }
    }

    async fn release(&self, table: &str) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.lock_service.release(table, &self.lock_group).await {
                Ok(()) => return Ok(()),
                Err(e) if self.release_retry.allows_retry(attempt) => {
                    tracing::warn!(table, attempt, "release failed, retrying: {e}");
                    self.release_retry.backoff(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Whether `table` has a live record.
    #[must_use]
    pub fn is_tracked(&self, table: &str) -> bool {
        self.records.contains_key(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Live records, earliest deadline first.
    #[must_use]
    pub fn records(&self) -> Vec<ExpiryRecord> {
        let mut records: Vec<ExpiryRecord> = self
            .records
            .iter()
            .map(|(table, &release_at)| ExpiryRecord {
                table: table.clone(),
                release_at,
            })
            .collect();
        records.sort_by(|a, b| a.release_at.cmp(&b.release_at));
        records
    }

    /// Tables whose release has not been acknowledged yet, sorted.
    #[must_use]
    pub fn orphans(&self) -> Vec<String> {
        self.orphans.iter().cloned().collect()
    }

    #[must_use]
    pub fn has_orphans(&self) -> bool {
        !self.orphans.is_empty()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.records.values().min().copied()
    }
}
