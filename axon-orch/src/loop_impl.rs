//! Loop strategy — one handler invoked repeatedly until it signals
//! completion or the iteration cap is hit.

use crate::run::{run_agent, AgentMap};
use crate::Orchestrator;
use async_trait::async_trait;
use axon_core::{
    AgentHandler, AgentId, AgentResult, Event, OrchError, State, ITERATION_KEY,
    LOOP_COMPLETED_KEY, MAX_ITERATIONS_REACHED_KEY,
};
use axon_hooks::CallbackRegistry;
use std::sync::Arc;

/// Default iteration cap when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Feeds each iteration's output state into the next invocation of a single
/// configured handler.
///
/// Exit conditions, checked after each iteration in order: the output
/// state's data contains `loop_completed = true`; the iteration count
/// reached the cap; the handler returned an error (propagated immediately).
/// Cancellation is the fourth exit — dropping the dispatch future abandons
/// the loop between awaits.
///
/// Hitting the cap without a completion signal is success, not an error:
/// the returned state carries `max_iterations_reached = "true"` in meta.
/// The handler always runs at least once. The current 1-based iteration is
/// visible to the handler in state meta under `iteration`.
pub struct LoopOrchestrator {
    agents: AgentMap,
    registry: Arc<CallbackRegistry>,
    agent: AgentId,
    max_iterations: u32,
}

impl LoopOrchestrator {
    /// Create a loop over the named agent with the default iteration cap.
    pub fn new(agent: impl Into<AgentId>) -> Self {
        Self {
            agents: AgentMap::new(),
            registry: Arc::new(CallbackRegistry::new()),
            agent: agent.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Override the iteration cap (builder pattern). The loop always runs
    /// at least once, so a cap of zero is raised to one.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

#[async_trait]
impl Orchestrator for LoopOrchestrator {
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        self.agents.register(name, handler).await
    }

    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError> {
        let handler = self
            .agents
            .get(&self.agent)
            .await
            .ok_or_else(|| OrchError::UnknownAgent(self.agent.clone()))?;

        let mut state = State::from_event(&event);
        let mut completed = false;

        for iteration in 1..=self.max_iterations {
            state.set_meta(ITERATION_KEY, iteration.to_string());
            state = run_agent(&self.registry, &self.agent, &handler, &event, state).await?;

            if state
                .get(LOOP_COMPLETED_KEY)
                .and_then(serde_json::Value::as_bool)
                == Some(true)
            {
                completed = true;
                break;
            }
        }

        if !completed {
            tracing::warn!(
                agent = %self.agent,
                max_iterations = self.max_iterations,
                "axon.orch.loop_cap_reached"
            );
            state.set_meta(MAX_ITERATIONS_REACHED_KEY, "true");
        }

        Ok(AgentResult::new(state))
    }

    fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.registry)
    }
}
