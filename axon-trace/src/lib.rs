#![deny(missing_docs)]
//! In-memory, per-session trace logging for axon.
//!
//! [`TraceLogger`] appends one [`TraceEntry`] per hook firing into a bucket
//! keyed by session id, and serves ordered read-only snapshots. Unbounded by
//! default for the lifetime of the process; an optional per-session ring cap
//! evicts the oldest entries while preserving order among what remains.
//!
//! [`TraceCallback`] is the bridge from the callback pipeline into the
//! logger, and [`resolve_session_id`] is the single place session identity
//! is derived — every trace producer goes through it so the resolution
//! order cannot drift.

mod callback;

pub use callback::TraceCallback;

use axon_core::{Event, SessionId, State, TraceEntry, SESSION_ID_KEY};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Resolve the session a trace entry belongs to.
///
/// Sources, in order: state meta, event metadata, else an id synthesized
/// from the event id. Never empty.
pub fn resolve_session_id(event: &Event, state: Option<&State>) -> SessionId {
    if let Some(s) = state {
        if let Some(id) = s.get_meta(SESSION_ID_KEY).filter(|v| !v.is_empty()) {
            return SessionId::new(id);
        }
    }
    if let Some(id) = event.session_id() {
        return SessionId::new(id);
    }
    SessionId::new(format!("session-{}", event.id))
}

/// Append-only trace store with per-session buckets.
///
/// Buckets live behind a single `RwLock`; entries within a bucket are kept
/// in append order and snapshots are clones, so callers can never mutate
/// the stored trace.
pub struct TraceLogger {
    sessions: RwLock<HashMap<SessionId, VecDeque<TraceEntry>>>,
    session_capacity: Option<usize>,
}

impl TraceLogger {
    /// Create an unbounded logger.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_capacity: None,
        }
    }

    /// Create a logger that retains at most `capacity` entries per session,
    /// evicting the oldest first. Ordering among retained entries is
    /// unchanged.
    pub fn with_session_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_capacity: Some(capacity.max(1)),
        }
    }

    /// Append an entry to its session's bucket. Safe under concurrent
    /// callers; append order within a session follows lock acquisition
    /// order.
    pub async fn log(&self, entry: TraceEntry) {
        let mut sessions = self.sessions.write().await;
        let bucket = sessions.entry(entry.session_id.clone()).or_default();
        if let Some(cap) = self.session_capacity {
            while bucket.len() >= cap {
                bucket.pop_front();
            }
        }
        bucket.push_back(entry);
    }

    /// Ordered snapshot of a session's entries. Empty for unknown sessions.
    pub async fn trace(&self, session: &SessionId) -> Vec<TraceEntry> {
        self.sessions
            .read()
            .await
            .get(session)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sessions with at least one retained entry, in no particular order.
    pub async fn sessions(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().cloned().collect()
    }
}

impl Default for TraceLogger {
    fn default() -> Self {
        Self::new()
    }
}
