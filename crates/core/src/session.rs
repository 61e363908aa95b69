//! Client-side comment session and stale-response guarding.
//!
//! A [`CommentSession`] is built once per proposal view and handed to the
//! overlay and pin components explicitly. Write operations return canonical
//! entities, so the session applies them directly instead of refetching the
//! whole list. Failed operations leave the session untouched.
//!
//! [`RequestSequencer`] guards input-driven fetches (destination search,
//! comment list reloads): only the response to the most recently issued
//! request is applied, superseded ones are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::comment::CommentStatus;
use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Thread records
// ---------------------------------------------------------------------------

/// A comment thread as held by a session.
pub trait ThreadRecord {
    type Reply;

    fn id(&self) -> DbId;
    fn status(&self) -> CommentStatus;
    fn push_reply(&mut self, reply: Self::Reply);
    fn mark_resolved(&mut self);
}

/// Comment threads for one proposal view.
#[derive(Debug, Clone)]
pub struct CommentSession<T: ThreadRecord> {
    proposal_id: DbId,
    threads: Vec<T>,
}

impl<T: ThreadRecord> CommentSession<T> {
    pub fn new(proposal_id: DbId) -> Self {
        Self {
            proposal_id,
            threads: Vec::new(),
        }
    }

    pub fn proposal_id(&self) -> DbId {
        self.proposal_id
    }

    /// Replace all threads with a freshly loaded list.
    pub fn load(&mut self, threads: Vec<T>) {
        self.threads = threads;
    }

    pub fn threads(&self) -> &[T] {
        &self.threads
    }

    /// Threads that should be rendered as pins.
    pub fn open_threads(&self) -> impl Iterator<Item = &T> {
        self.threads
            .iter()
            .filter(|t| t.status() == CommentStatus::Open)
    }

    pub fn get(&self, comment_id: DbId) -> Option<&T> {
        self.threads.iter().find(|t| t.id() == comment_id)
    }

    /// Apply the outcome of a create call.
    ///
    /// On error nothing changes and the error is handed back for display.
    pub fn apply_created(&mut self, result: Result<T, CoreError>) -> Result<DbId, CoreError> {
        let thread = result?;
        let id = thread.id();
        match self.threads.iter_mut().find(|t| t.id() == id) {
            Some(existing) => *existing = thread,
            None => self.threads.push(thread),
        }
        Ok(id)
    }

    /// Apply the outcome of a reply call to its parent thread.
    pub fn apply_reply(
        &mut self,
        comment_id: DbId,
        result: Result<T::Reply, CoreError>,
    ) -> Result<(), CoreError> {
        let reply = result?;
        let thread = self
            .threads
            .iter_mut()
            .find(|t| t.id() == comment_id)
            .ok_or(CoreError::NotFound {
                entity: "Comment",
                id: comment_id,
            })?;
        thread.push_reply(reply);
        Ok(())
    }

    /// Apply the outcome of a resolve call.
    pub fn apply_resolved(
        &mut self,
        comment_id: DbId,
        result: Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        result?;
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id() == comment_id) {
            thread.mark_resolved();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request sequencing
// ---------------------------------------------------------------------------

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Hands out tickets; only the latest ticket is current.
///
/// Cheap to clone; clones share the sequence so a ticket can be checked from
/// whichever task receives the response.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: Arc<AtomicU64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding all earlier ones.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Supersede every outstanding request (e.g. on unmount).
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Return `value` only if `ticket` is still current.
    pub fn accept<V>(&self, ticket: RequestTicket, value: V) -> Option<V> {
        self.is_current(ticket).then_some(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
