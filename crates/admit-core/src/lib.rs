//! Admit-core - client-side two-phase locking admission scheduler
//!
//! This crate provides:
//! - The request model and workload sources
//! - Lock Service and Execution Service contracts, with in-memory and
//!   storage-engine clients
//! - Isolation-aware admission control
//! - FIFO ready/wait queues
//! - Timer-driven expiry of held table locks
//! - The scheduler loop that ties them together

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod expiry;
pub mod lock_service;
pub mod queue;
pub mod request;
pub mod retry;
pub mod scheduler;
pub mod workload;

pub use admission::{AdmissionController, Decision};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LockServiceKind, SchedulerConfig};
pub use error::{Error, Result};
pub use execution::{CommandExecutor, DryRunExecutor, ExecutionPayload, ExecutionService};
pub use expiry::{ExpiryRecord, ExpiryTracker, HoldPolicy, SweepReport};
pub use lock_service::{AcquireOutcome, CommandLockService, InMemoryLockService, LockService};
pub use queue::RequestQueue;
pub use request::{IsolationLevel, OpType, Request, TransactionId};
pub use retry::RetryPolicy;
pub use scheduler::{
    Completion, CompletionStatus, IterationReport, Placement, QueueSnapshot, RunSummary,
    Scheduler, SchedulerState,
};
pub use workload::Workload;
