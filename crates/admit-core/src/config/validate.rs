//! Configuration validation

use std::collections::HashSet;

use super::types::{LockServiceKind, SchedulerConfig};
use crate::request::IsolationLevel;
use crate::{Error, Result};

impl SchedulerConfig {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any values are out of range or invalid
    pub fn validate(&self) -> Result<()> {
        if self.lock_group.trim().is_empty() {
            return Err(Error::InvalidConfig("lock_group cannot be empty".to_string()));
        }

        self.exempt_levels()?;

        if self.hold.min_units == 0 {
            return Err(Error::InvalidConfig(
                "hold.min_units must be at least 1".to_string(),
            ));
        }

        if self.hold.min_units > self.hold.max_units {
            return Err(Error::InvalidConfig(format!(
                "hold.min_units ({}) cannot exceed hold.max_units ({})",
                self.hold.min_units, self.hold.max_units
            )));
        }

        if self.retry.acquire_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.acquire_attempts must be at least 1".to_string(),
            ));
        }

        // A failed release is always retried once before the lock is declared orphaned
        if self.retry.release_attempts < 2 {
            return Err(Error::InvalidConfig(
                "retry.release_attempts must be at least 2".to_string(),
            ));
        }

        if self.lock_service == LockServiceKind::Command && self.command.program.trim().is_empty()
        {
            return Err(Error::InvalidConfig(
                "command.program cannot be empty when lock_service = \"command\"".to_string(),
            ));
        }

        Ok(())
    }

    /// Exempt isolation levels as typed values
    ///
    /// # Errors
    ///
    /// Returns error if a configured level is outside 0-3
    pub fn exempt_levels(&self) -> Result<HashSet<IsolationLevel>> {
        self.exempt_isolation_levels
            .iter()
            .map(|&level| {
                IsolationLevel::try_from(level).map_err(|_| {
                    Error::InvalidConfig(format!(
                        "exempt_isolation_levels contains {level}, expected 0-3"
                    ))
                })
            })
            .collect()
    }
}
