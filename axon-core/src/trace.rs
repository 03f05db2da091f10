//! The TraceEntry — one record per hook firing.

use crate::callback::Hook;
use crate::id::{AgentId, SessionId};
use crate::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record in a session's trace.
///
/// Entries are append-only and serde round-trippable: dumping a trace,
/// serializing it, and deserializing it yields the same ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// The session this entry belongs to.
    pub session_id: SessionId,
    /// Which hook fired.
    pub hook: Hook,
    /// When it fired.
    pub timestamp: DateTime<Utc>,
    /// The agent in scope, for agent-level hooks.
    pub agent_id: Option<AgentId>,
    /// Snapshot of the working state at firing time.
    pub state: State,
    /// Failure message, for error hooks.
    pub error: Option<String>,
}

impl TraceEntry {
    /// Create an entry stamped with the current time.
    pub fn new(session_id: impl Into<SessionId>, hook: Hook, state: State) -> Self {
        Self {
            session_id: session_id.into(),
            hook,
            timestamp: Utc::now(),
            agent_id: None,
            state,
            error: None,
        }
    }

    /// Scope the entry to an agent (builder pattern).
    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Attach a failure message (builder pattern).
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
