//! Sequential strategy — an ordered pipeline of named handlers.

use crate::run::{run_pipeline, AgentMap};
use crate::Orchestrator;
use async_trait::async_trait;
use axon_core::{AgentHandler, AgentId, AgentResult, Event, OrchError, State};
use axon_hooks::CallbackRegistry;
use std::sync::Arc;

/// Runs a configured, ordered list of handlers; each stage receives the
/// previous stage's output state. No parallelism.
///
/// A configured name with no registered handler is skipped with a warning.
/// A handler error aborts the pipeline; the returned error carries the
/// last-known successful state.
pub struct SequentialOrchestrator {
    agents: AgentMap,
    registry: Arc<CallbackRegistry>,
    order: Vec<AgentId>,
}

impl SequentialOrchestrator {
    /// Create a pipeline over the given agent names, in order.
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AgentId>,
    {
        Self {
            agents: AgentMap::new(),
            registry: Arc::new(CallbackRegistry::new()),
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Orchestrator for SequentialOrchestrator {
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        self.agents.register(name, handler).await
    }

    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError> {
        if self.order.is_empty() {
            return Err(OrchError::EmptyPipeline);
        }
        let seed = State::from_event(&event);
        let state = run_pipeline(&self.registry, &self.agents, &self.order, &event, seed).await?;
        Ok(AgentResult::new(state))
    }

    fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.registry)
    }
}
