//! Request data model
//!
//! A `Request` is an immutable description of one pending operation against a
//! named table. The scheduler consumes requests and discards them once executed.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

/// Unique transaction identifier within a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create a new transaction ID
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Read/write marker of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Read,
    Write,
}

/// Transaction isolation level, ordered from weakest to strictest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(try_from = "u8", into = "u8")]
pub enum IsolationLevel {
    ReadUncommitted = 0,
    ReadCommitted = 1,
    RepeatableRead = 2,
    Serializable = 3,
}

impl IsolationLevel {
    /// All levels, weakest first
    pub const ALL: [Self; 4] = [
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::RepeatableRead,
        Self::Serializable,
    ];

    /// Numeric tag of the level (0-3)
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IsolationLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::ReadUncommitted),
            1 => Ok(Self::ReadCommitted),
            2 => Ok(Self::RepeatableRead),
            3 => Ok(Self::Serializable),
            other => Err(Error::InvalidRequest(format!(
                "isolation level must be between 0 and 3, got {other}"
            ))),
        }
    }
}

impl From<IsolationLevel> for u8 {
    fn from(level: IsolationLevel) -> Self {
        level.as_u8()
    }
}

/// A pending operation against a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Read/write marker
    pub op_type: OpType,
    /// Name of the table the request touches
    pub table: String,
    /// Isolation level the transaction runs under
    pub isolation_level: IsolationLevel,
    /// Unique per workload
    pub transaction_id: TransactionId,
    /// Logical submission time
    pub timestamp: u64,
}

impl Request {
    /// Create a new request, rejecting blank table names
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the table name is empty or whitespace-only.
    pub fn new(
        op_type: OpType,
        table: impl Into<String>,
        isolation_level: IsolationLevel,
        transaction_id: TransactionId,
        timestamp: u64,
    ) -> Result<Self> {
        let request = Self {
            op_type,
            table: table.into(),
            isolation_level,
            transaction_id,
            timestamp,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check invariants that deserialization cannot express
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the table name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::InvalidRequest(format!(
                "{} has an empty table name",
                self.transaction_id
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({} {} @{}, ts={})",
            self.transaction_id, self.op_type, self.table, self.isolation_level, self.timestamp
        )
    }
}
