//! Error types for admit-core

use thiserror::Error;

/// Core error type for scheduling operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Lock Service could not be reached or did not answer in time
    #[error("Lock service unavailable: {0}")]
    LockServiceUnavailable(String),

    /// Lock Service answered with something that could not be interpreted
    #[error("Lock service protocol error: {0}")]
    LockServiceProtocolError(String),

    /// Remote execution of a request failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Request or workload is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration value failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Input could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem errors
    #[error("IO error: {0}")]
    IoError(String),

    /// A table already has a live expiry record
    #[error("Expiry already tracked for table '{0}'")]
    DuplicateExpiry(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The run loop exceeded its iteration bound
    #[error("Scheduler did not reach idle within {0} iterations")]
    IterationLimit(u64),
}

impl Error {
    /// Transport and protocol failures of the Lock Service may succeed on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LockServiceUnavailable(_) | Self::LockServiceProtocolError(_)
        )
    }
}

/// Result type alias for admit-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lock_service_failures_are_retryable() {
        assert!(Error::LockServiceUnavailable("timeout".into()).is_retryable());
        assert!(Error::LockServiceProtocolError("garbage".into()).is_retryable());
        assert!(!Error::ExecutionError("boom".into()).is_retryable());
        assert!(!Error::DuplicateExpiry("S".into()).is_retryable());
    }
}
