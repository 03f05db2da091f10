//! Route strategy — one handler, named by the event's `route` header.

use crate::run::{run_agent, AgentMap};
use crate::Orchestrator;
use async_trait::async_trait;
use axon_core::{
    AgentHandler, AgentId, AgentResult, Event, EventEmitter, EventId, OrchError, State, ROUTE_KEY,
};
use axon_hooks::CallbackRegistry;
use std::sync::{Arc, RwLock};

/// Dispatches each event to exactly one handler, looked up by the event's
/// `route` metadata.
///
/// Re-routing: when a handler's output state carries a non-empty `route`
/// header that differs from the incoming one, a successor event is built
/// from the output state and submitted through the bound emitter. The
/// original dispatch returns normally — the successor is an independent
/// event, which is what keeps agent chains iterative instead of recursive
/// and lets a global policy bound chain length.
pub struct RouteOrchestrator {
    agents: AgentMap,
    registry: Arc<CallbackRegistry>,
    emitter: RwLock<Option<Arc<dyn EventEmitter>>>,
}

impl RouteOrchestrator {
    /// Create a route orchestrator with an empty registry and no emitter.
    pub fn new() -> Self {
        Self {
            agents: AgentMap::new(),
            registry: Arc::new(CallbackRegistry::new()),
            emitter: RwLock::new(None),
        }
    }

    fn emit_successor(&self, event: &Event, output: &State, next_route: &str) {
        let mut successor = Event {
            id: EventId::new(format!("{}-route-{}", event.id, next_route)),
            data: output.data().clone(),
            metadata: event.metadata.clone(),
        };
        successor
            .metadata
            .insert(ROUTE_KEY.to_owned(), next_route.to_owned());

        let emitter = self
            .emitter
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match emitter {
            Some(emitter) => {
                if let Err(err) = emitter.emit(successor) {
                    tracing::error!(
                        parent = %event.id,
                        route = next_route,
                        error = %err,
                        "axon.orch.reroute_dropped"
                    );
                }
            }
            None => {
                tracing::warn!(
                    parent = %event.id,
                    route = next_route,
                    "axon.orch.reroute_without_emitter"
                );
            }
        }
    }
}

impl Default for RouteOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Orchestrator for RouteOrchestrator {
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        self.agents.register(name, handler).await
    }

    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError> {
        let route = event
            .route()
            .map(AgentId::new)
            .ok_or_else(|| OrchError::MissingRoute(event.id.clone()))?;
        let handler = self
            .agents
            .get(&route)
            .await
            .ok_or_else(|| OrchError::UnknownAgent(route.clone()))?;

        let seed = State::from_event(&event);
        let output = run_agent(&self.registry, &route, &handler, &event, seed).await?;

        if let Some(next) = output.route() {
            if next != route.as_str() {
                self.emit_successor(&event, &output, next);
            }
        }

        Ok(AgentResult::new(output))
    }

    fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.registry)
    }

    fn set_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self
            .emitter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(emitter);
    }

    fn stop(&self) {
        // Unbind the emitter so late re-routes cannot reach a dead runner.
        *self
            .emitter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
