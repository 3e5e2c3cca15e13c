//! Configuration type definitions
//!
//! Pure data holders; defaults live in `defaults`, checks in `validate`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ═══════════════════════════════════════════════════════════════════════════
// MAIN CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Root configuration for one scheduling run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Lock domain passed to every Lock Service call
    pub lock_group: String,
    /// Isolation levels admitted without consulting the Lock Service
    pub exempt_isolation_levels: Vec<u8>,
    pub hold: HoldConfig,
    pub retry: RetryConfig,
    /// Pause between iterations when nothing is ready to execute
    pub tick_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    /// Seed for the hold-duration RNG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub lock_service: LockServiceKind,
    pub command: CommandConfig,
}

// ═══════════════════════════════════════════════════════════════════════════
// NESTED CONFIGURATION STRUCTURES
// ═══════════════════════════════════════════════════════════════════════════

/// Range the random hold duration is drawn from, in time units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HoldConfig {
    pub min_units: u64,
    pub max_units: u64,
    pub unit_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub acquire_attempts: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub release_attempts: u32,
}

/// Transport used to reach the Lock Service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LockServiceKind {
    Memory,
    Command,
}

/// Storage engine binary used by the command transport and executor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    pub program: String,
    pub pool: String,
    pub timeout_ms: u64,
    pub oid_prefix: String,
    pub select: String,
}
