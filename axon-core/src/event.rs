//! The Event — an in-flight unit of work.

use crate::id::EventId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved metadata key naming the target agent for route-based dispatch.
pub const ROUTE_KEY: &str = "route";

/// Reserved metadata key correlating trace entries across events.
pub const SESSION_ID_KEY: &str = "session_id";

/// Reserved data key a loop agent sets to `true` to terminate iteration.
pub const LOOP_COMPLETED_KEY: &str = "loop_completed";

/// State-meta flag set when a loop exits by hitting its iteration cap
/// rather than by an explicit completion signal.
pub const MAX_ITERATIONS_REACHED_KEY: &str = "max_iterations_reached";

/// State-meta key carrying the 1-based iteration counter inside a loop
/// dispatch.
pub const ITERATION_KEY: &str = "iteration";

/// An emitted unit of work.
///
/// Carries an opaque payload (`data`), string routing/tracing headers
/// (`metadata`), and a process-unique id. Once emitted, an event is
/// read-only: handlers receive `&Event`, and anything that wants to change
/// course constructs a successor event instead of mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Process-unique identifier. Settable by the caller for determinism.
    pub id: EventId,
    /// The payload.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Routing and tracing headers. `route` and `session_id` are reserved.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Event {
    /// Create an event with a freshly generated id and empty maps.
    pub fn new() -> Self {
        Self {
            id: EventId::generate(),
            data: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Replace the generated id (builder pattern).
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a payload entry (builder pattern).
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach a metadata header (builder pattern).
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the reserved `route` header (builder pattern).
    pub fn with_route(self, route: impl Into<String>) -> Self {
        self.with_metadata(ROUTE_KEY, route)
    }

    /// Set the reserved `session_id` header (builder pattern).
    pub fn with_session(self, session: impl Into<String>) -> Self {
        self.with_metadata(SESSION_ID_KEY, session)
    }

    /// The target agent name, when present and non-empty.
    pub fn route(&self) -> Option<&str> {
        self.metadata
            .get(ROUTE_KEY)
            .map(String::as_str)
            .filter(|r| !r.is_empty())
    }

    /// The session id header, when present and non-empty.
    pub fn session_id(&self) -> Option<&str> {
        self.metadata
            .get(SESSION_ID_KEY)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}
