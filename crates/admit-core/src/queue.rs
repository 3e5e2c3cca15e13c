//! FIFO holding areas for requests.
//!
//! The scheduler owns two of these: the Ready Queue (admitted, not yet
//! executed) and the Wait Queue (blocked on a held lock). Neither ever
//! reorders its contents; a request that fails re-admission goes back to the
//! tail of the Wait Queue.

use std::collections::VecDeque;

use crate::request::{Request, TransactionId};

/// A FIFO queue of requests
#[derive(Debug, Clone, Default)]
pub struct RequestQueue {
    entries: VecDeque<Request>,
}

impl RequestQueue {
    /// Create a new empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of requests in the queue
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a request at the tail
    pub fn push(&mut self, request: Request) {
        self.entries.push_back(request);
    }

    /// Remove the request at the head
    pub fn pop(&mut self) -> Option<Request> {
        self.entries.pop_front()
    }

    /// Look at the head without removing it
    #[must_use]
    pub fn peek(&self) -> Option<&Request> {
        self.entries.front()
    }

    /// Iterate head to tail without removing anything
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter()
    }

    /// Check whether a transaction is queued
    #[must_use]
    pub fn contains(&self, id: TransactionId) -> bool {
        self.entries.iter().any(|r| r.transaction_id == id)
    }

    /// Remove a request by transaction ID, keeping the order of the rest
    pub fn remove(&mut self, id: TransactionId) -> Option<Request> {
        self.entries
            .iter()
            .position(|r| r.transaction_id == id)
            .and_then(|i| self.entries.remove(i))
    }

    /// Take every request out, head first, leaving the queue empty
    pub fn drain(&mut self) -> impl Iterator<Item = Request> + '_ {
        self.entries.drain(..)
    }

    /// Transaction IDs head to tail
    #[must_use]
    pub fn ids(&self) -> Vec<TransactionId> {
        self.entries.iter().map(|r| r.transaction_id).collect()
    }
}
