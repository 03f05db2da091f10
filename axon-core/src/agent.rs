//! The AgentHandler protocol — what one agent does per dispatch.

use crate::error::HandlerError;
use crate::event::Event;
use crate::state::State;
use async_trait::async_trait;

/// A handler's return value.
///
/// The output state is mandatory: a successful run always yields the state
/// the framework should carry forward, so "handler returned nothing" is
/// unrepresentable here. Failures travel as [`HandlerError`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    /// The canonical post-run state for this step.
    pub output_state: State,
}

impl AgentResult {
    /// Wrap an output state.
    pub fn new(output_state: State) -> Self {
        Self { output_state }
    }
}

/// What one agent does per dispatch.
///
/// Implementations must be safe to invoke concurrently across different
/// events. The `state` parameter is exclusively the handler's for the
/// duration of `run`; the framework neither reads nor writes it until the
/// result comes back. Cancellation is cooperative — when the driving future
/// is dropped the run is abandoned, so handlers doing external I/O should
/// keep their await points honest.
///
/// One method is the whole surface on purpose. Nothing outside a handler
/// can observe its intermediate steps, only the event and state going in
/// and the result coming back, which leaves each agent free to structure
/// its model calls, tool use, and memory access however it likes.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Process one event against the given working state.
    async fn run(&self, event: &Event, state: State) -> Result<AgentResult, HandlerError>;
}
