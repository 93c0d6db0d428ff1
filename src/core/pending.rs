// src/core/pending.rs

//! Correlation of asynchronous collaborator replies.
//!
//! Every request that may be answered later gets a [`RequestId`]. The table
//! remembers what the terminal was doing when it asked, so the reply can be
//! applied (or discarded as stale) when it arrives.

use crate::core::autocomplete::Completion;
use crate::models::QueuedInvocation;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier correlating a request with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A collaborator reply that is either available now or will arrive later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    /// The answer is available immediately.
    Ready(T),
    /// The answer will be delivered later under the request's id.
    Pending,
}

/// What the terminal was doing when it issued a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    /// Waiting for an authorization decision before queueing `invocation`.
    Authorization {
        /// The invocation to queue once allowed.
        invocation: QueuedInvocation,
        /// Whether the command starts a multi-step session.
        multi_step: bool,
    },
    /// Waiting for remote completion candidates.
    Lookup {
        /// Input buffer when the lookup was issued.
        buffer: String,
        /// The token being completed.
        partial: String,
    },
    /// Waiting for a multi-step command's step handler.
    Step {
        /// Command whose step is running.
        command: String,
    },
}

/// Outstanding requests keyed by id.
#[derive(Debug, Default)]
pub struct PendingTable {
    requests: HashMap<RequestId, PendingRequest>,
}

impl PendingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request under `id`.
    pub fn insert(&mut self, id: RequestId, request: PendingRequest) {
        log::trace!("Pending request {} registered: {:?}", id, request);
        self.requests.insert(id, request);
    }

    /// Removes and returns the request registered under `id`.
    pub fn take(&mut self, id: RequestId) -> Option<PendingRequest> {
        let request = self.requests.remove(&id);
        if request.is_none() {
            log::warn!("Reply for unknown or stale request {} ignored", id);
        }
        request
    }

    /// Returns `true` if a top-level resolution or a step is in flight.
    pub fn has_blocking(&self) -> bool {
        self.requests
            .values()
            .any(|r| !matches!(r, PendingRequest::Lookup { .. }))
    }

    /// Drops every outstanding lookup. Only the most recent lookup may apply.
    pub fn drop_lookups(&mut self) {
        self.requests
            .retain(|_, r| !matches!(r, PendingRequest::Lookup { .. }));
    }

    /// Drops every outstanding step request. Their replies will be ignored.
    pub fn drop_steps(&mut self) {
        self.requests
            .retain(|_, r| !matches!(r, PendingRequest::Step { .. }));
    }

    /// Returns `true` if nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

/// Applies the single/multiple/none policy to remote candidates, keeping only
/// those that still extend `partial`.
pub fn complete_remote(partial: &str, names: &[String]) -> Completion {
    crate::core::autocomplete::complete(partial, names.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_removes_request_once() {
        let mut table = PendingTable::new();
        let id = RequestId::new();
        table.insert(
            id,
            PendingRequest::Step {
                command: "register".to_string(),
            },
        );
        assert!(table.has_blocking());
        assert!(table.take(id).is_some());
        assert!(table.take(id).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_lookups_do_not_block_input() {
        let mut table = PendingTable::new();
        table.insert(
            RequestId::new(),
            PendingRequest::Lookup {
                buffer: "whisper al".to_string(),
                partial: "al".to_string(),
            },
        );
        assert!(!table.has_blocking());
        table.drop_lookups();
        assert!(table.is_empty());
    }

    #[test]
    fn test_remote_candidates_are_filtered_by_prefix() {
        let names = vec!["alice".to_string(), "albert".to_string(), "bob".to_string()];
        assert_eq!(
            complete_remote("al", &names),
            Completion::Multiple {
                extension: String::new(),
                candidates: vec!["alice".to_string(), "albert".to_string()],
            }
        );
        assert_eq!(
            complete_remote("b", &names),
            Completion::Single("bob".to_string())
        );
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
