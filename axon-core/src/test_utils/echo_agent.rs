//! EchoAgent — returns the input state as the output.

use crate::agent::{AgentHandler, AgentResult};
use crate::error::HandlerError;
use crate::event::Event;
use crate::state::State;
use async_trait::async_trait;

/// A handler that returns its input state unchanged — the smallest
/// possible agent, handy wherever a test just needs something registered.
pub struct EchoAgent;

#[async_trait]
impl AgentHandler for EchoAgent {
    async fn run(&self, _event: &Event, state: State) -> Result<AgentResult, HandlerError> {
        Ok(AgentResult::new(state))
    }
}
