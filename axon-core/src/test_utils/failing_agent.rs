//! FailingAgent — always returns an error.

use crate::agent::{AgentHandler, AgentResult};
use crate::error::HandlerError;
use crate::event::Event;
use crate::state::State;
use async_trait::async_trait;

/// A handler that fails every run with a fixed message, for driving the
/// error hook, aggregation, and abort paths in tests.
pub struct FailingAgent {
    message: String,
}

impl FailingAgent {
    /// Create a failing agent with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl AgentHandler for FailingAgent {
    async fn run(&self, _event: &Event, _state: State) -> Result<AgentResult, HandlerError> {
        Err(HandlerError::Fatal(self.message.clone()))
    }
}
