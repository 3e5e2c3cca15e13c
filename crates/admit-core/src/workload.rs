//! Workload sources.
//!
//! A workload is an ordered list of requests with unique transaction IDs.

use std::collections::HashSet;
use std::path::Path;

use crate::request::{IsolationLevel, OpType, Request, TransactionId};
use crate::{Error, Result};

/// An ordered batch of requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    requests: Vec<Request>,
}

impl Workload {
    /// Build a workload, rejecting duplicate transaction IDs and blank tables
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` on a duplicate ID or an invalid request.
    pub fn new(requests: Vec<Request>) -> Result<Self> {
        let mut seen = HashSet::new();
        for request in &requests {
            request.validate()?;
            if !seen.insert(request.transaction_id) {
                return Err(Error::InvalidRequest(format!(
                    "duplicate transaction id {}",
                    request.transaction_id
                )));
            }
        }
        Ok(Self { requests })
    }

    /// The four-request workload: three transactions contend for table `S`
    /// under locking isolation levels while one reads `T` without locks.
    ///
    /// | name | tid | table | isolation | timestamp |
    /// |------|-----|-------|-----------|-----------|
    /// | m    | 1   | S     | 2         | 12        |
    /// | n    | 3   | S     | 3         | 24        |
    /// | o    | 2   | T     | 0         | 36        |
    /// | p    | 4   | S     | 3         | 48        |
    #[must_use]
    pub fn canonical() -> Self {
        let request = |table: &str, level, tid, timestamp| Request {
            op_type: OpType::Read,
            table: table.to_string(),
            isolation_level: level,
            transaction_id: TransactionId::new(tid),
            timestamp,
        };
        Self {
            requests: vec![
                request("S", IsolationLevel::RepeatableRead, 1, 12),
                request("S", IsolationLevel::Serializable, 3, 24),
                request("T", IsolationLevel::ReadUncommitted, 2, 36),
                request("S", IsolationLevel::Serializable, 4, 48),
            ],
        }
    }

    /// Parse a JSON array of requests
    ///
    /// # Errors
    ///
    /// Returns `ParseError` on malformed JSON and `InvalidRequest` on bad content.
    pub fn from_json(json: &str) -> Result<Self> {
        let requests: Vec<Request> = serde_json::from_str(json)
            .map_err(|e| Error::ParseError(format!("invalid workload: {e}")))?;
        Self::new(requests)
    }

    /// Read a JSON workload file
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read, otherwise as `from_json`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read workload {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    #[must_use]
    pub fn into_requests(self) -> Vec<Request> {
        self.requests
    }
}
