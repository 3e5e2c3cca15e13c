//! Default configuration values

use super::types::{CommandConfig, HoldConfig, LockServiceKind, RetryConfig, SchedulerConfig};

pub(super) const DEFAULT_LOCK_GROUP: &str = "public.lock";
pub(super) const DEFAULT_TICK_MS: u64 = 100;

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lock_group: DEFAULT_LOCK_GROUP.to_string(),
            exempt_isolation_levels: vec![0, 1],
            hold: HoldConfig::default(),
            retry: RetryConfig::default(),
            tick_ms: DEFAULT_TICK_MS,
            max_iterations: None,
            seed: None,
            lock_service: LockServiceKind::default(),
            command: CommandConfig::default(),
        }
    }
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            min_units: 1,
            max_units: 5,
            unit_ms: 1000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            acquire_attempts: 3,
            backoff_ms: 50,
            max_backoff_ms: 1000,
            release_attempts: 2,
        }
    }
}

#[allow(clippy::derivable_impls)]
impl Default for LockServiceKind {
    fn default() -> Self {
        Self::Memory
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: "bin/run-query".to_string(),
            pool: "tpchdata".to_string(),
            timeout_ms: 5000,
            oid_prefix: "public".to_string(),
            select: "linenumber,geq,6;".to_string(),
        }
    }
}
