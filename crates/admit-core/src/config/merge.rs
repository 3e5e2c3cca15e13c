//! Configuration merging logic
//!
//! Later configs override earlier ones (defaults → global → project → env → CLI).
//! A field in `other` only wins when it differs from the built-in default, so a
//! project file that sets one key does not reset keys set globally.
//!
//! The flip side: a later layer cannot put a field back to its default. If the
//! global file sets `lock_group = "x"`, a project file saying
//! `lock_group = "public.lock"` is ignored; use an `ADMIT_*` variable or remove
//! the key from the global file instead.

use super::types::{CommandConfig, HoldConfig, RetryConfig, SchedulerConfig};

fn pick<T: PartialEq>(base: T, other: T, default: &T) -> T {
    if &other == default {
        base
    } else {
        other
    }
}

impl SchedulerConfig {
    /// Merge another config into this one (other takes precedence)
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let default = Self::default();
        Self {
            lock_group: pick(self.lock_group, other.lock_group, &default.lock_group),
            exempt_isolation_levels: pick(
                self.exempt_isolation_levels,
                other.exempt_isolation_levels,
                &default.exempt_isolation_levels,
            ),
            hold: self.hold.merge(other.hold),
            retry: self.retry.merge(other.retry),
            tick_ms: pick(self.tick_ms, other.tick_ms, &default.tick_ms),
            max_iterations: other.max_iterations.or(self.max_iterations),
            seed: other.seed.or(self.seed),
            lock_service: pick(self.lock_service, other.lock_service, &default.lock_service),
            command: self.command.merge(other.command),
        }
    }
}

impl HoldConfig {
    fn merge(self, other: Self) -> Self {
        let default = Self::default();
        Self {
            min_units: pick(self.min_units, other.min_units, &default.min_units),
            max_units: pick(self.max_units, other.max_units, &default.max_units),
            unit_ms: pick(self.unit_ms, other.unit_ms, &default.unit_ms),
        }
    }
}

impl RetryConfig {
    fn merge(self, other: Self) -> Self {
        let default = Self::default();
        Self {
            acquire_attempts: pick(
                self.acquire_attempts,
                other.acquire_attempts,
                &default.acquire_attempts,
            ),
            backoff_ms: pick(self.backoff_ms, other.backoff_ms, &default.backoff_ms),
            max_backoff_ms: pick(
                self.max_backoff_ms,
                other.max_backoff_ms,
                &default.max_backoff_ms,
            ),
            release_attempts: pick(
                self.release_attempts,
                other.release_attempts,
                &default.release_attempts,
            ),
        }
    }
}

impl CommandConfig {
    fn merge(self, other: Self) -> Self {
        let default = Self::default();
        Self {
            program: pick(self.program, other.program, &default.program),
            pool: pick(self.pool, other.pool, &default.pool),
            timeout_ms: pick(self.timeout_ms, other.timeout_ms, &default.timeout_ms),
            oid_prefix: pick(self.oid_prefix, other.oid_prefix, &default.oid_prefix),
            select: pick(self.select, other.select, &default.select),
        }
    }
}
