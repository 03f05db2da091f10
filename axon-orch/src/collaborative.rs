//! Collaborative strategy — parallel fan-out across every registered
//! handler.

use crate::run::{fan_out, AgentMap, FailurePolicy};
use crate::Orchestrator;
use async_trait::async_trait;
use axon_core::{AgentHandler, AgentId, AgentResult, Event, OrchError, State};
use axon_hooks::CallbackRegistry;
use std::sync::Arc;

/// Broadcasts each event to every registered handler in parallel.
///
/// Each handler receives its own clone of the event-seeded state. After all
/// handlers complete, outputs are unioned into one state; concurrent writes
/// to the same key resolve last-writer-wins in completion order, which is
/// non-deterministic — tests and callers must accept either value.
///
/// The failure policy decides what partial failure means; the default
/// treats a single success as overall success. Zero registered handlers is
/// a no-op success. Dropping the dispatch future aborts in-flight handlers
/// and discards their partial results.
pub struct CollaborativeOrchestrator {
    agents: AgentMap,
    registry: Arc<CallbackRegistry>,
    policy: FailurePolicy,
}

impl CollaborativeOrchestrator {
    /// Create a collaborative orchestrator with the best-effort policy.
    pub fn new() -> Self {
        Self {
            agents: AgentMap::new(),
            registry: Arc::new(CallbackRegistry::new()),
            policy: FailurePolicy::BestEffort,
        }
    }

    /// Select the failure policy (builder pattern).
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for CollaborativeOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Orchestrator for CollaborativeOrchestrator {
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        self.agents.register(name, handler).await
    }

    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError> {
        let seed = State::from_event(&event);
        let agents = self.agents.all().await;
        let merged = fan_out(&self.registry, agents, &event, &seed, self.policy).await?;
        Ok(AgentResult::new(merged))
    }

    fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.registry)
    }
}
