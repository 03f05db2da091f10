//! Mixed strategy — a parallel phase whose merged output seeds a
//! sequential phase.

use crate::run::{fan_out, run_pipeline, AgentMap, FailurePolicy};
use crate::Orchestrator;
use async_trait::async_trait;
use axon_core::{AgentHandler, AgentId, AgentResult, Event, OrchError, State};
use axon_hooks::CallbackRegistry;
use std::sync::Arc;

/// Two ordered phases over one shared handler pool.
///
/// Phase 1 fans the event out to the configured collaborative agents
/// (best-effort policy — a single success carries the phase) and merges
/// their outputs. Phase 2 pipelines the configured sequential agents,
/// seeded with the merged state; a pipeline error fails the whole dispatch.
/// Either phase may be empty, in which case the state passes through it
/// unchanged.
pub struct MixedOrchestrator {
    agents: AgentMap,
    registry: Arc<CallbackRegistry>,
    collaborative: Vec<AgentId>,
    sequential: Vec<AgentId>,
}

impl MixedOrchestrator {
    /// Create a mixed orchestrator from the two phase configurations.
    pub fn new<I, J, S, T>(collaborative: I, sequential: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<AgentId>,
        T: Into<AgentId>,
    {
        Self {
            agents: AgentMap::new(),
            registry: Arc::new(CallbackRegistry::new()),
            collaborative: collaborative.into_iter().map(Into::into).collect(),
            sequential: sequential.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Orchestrator for MixedOrchestrator {
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        self.agents.register(name, handler).await
    }

    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError> {
        let seed = State::from_event(&event);

        // Phase 1: parallel subset.
        let mut phase1 = Vec::with_capacity(self.collaborative.len());
        for name in &self.collaborative {
            match self.agents.get(name).await {
                Some(handler) => phase1.push((name.clone(), handler)),
                None => tracing::warn!(agent = %name, "axon.orch.agent_skipped"),
            }
        }
        let merged = fan_out(
            &self.registry,
            phase1,
            &event,
            &seed,
            FailurePolicy::BestEffort,
        )
        .await?;

        // Phase 2: pipeline seeded with the merged state.
        let state = run_pipeline(
            &self.registry,
            &self.agents,
            &self.sequential,
            &event,
            merged,
        )
        .await?;

        Ok(AgentResult::new(state))
    }

    fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.registry)
    }
}
