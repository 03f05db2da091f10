//! Shared machinery: the handler map, the hooked agent-run path, parallel
//! fan-out, and pipeline execution.

use axon_core::{
    AgentFailure, AgentHandler, AgentId, AggregateError, CallbackArgs, Event, Hook, OrchError,
    State,
};
use axon_hooks::CallbackRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

/// When a parallel dispatch counts as successful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailurePolicy {
    /// At least one handler succeeded (a dispatch over zero handlers also
    /// succeeds). The default, and what the mixed strategy relies on.
    BestEffort,
    /// Every handler must succeed.
    Strict,
    /// The failed fraction must not exceed the given threshold in `[0, 1]`.
    /// `Threshold(0.0)` behaves like `Strict`, `Threshold(1.0)` always
    /// succeeds.
    Threshold(f64),
}

impl FailurePolicy {
    fn accepts(&self, successes: usize, failures: usize) -> bool {
        let total = successes + failures;
        match self {
            FailurePolicy::BestEffort => successes > 0 || total == 0,
            FailurePolicy::Strict => failures == 0,
            FailurePolicy::Threshold(limit) => {
                total == 0 || (failures as f64 / total as f64) <= *limit
            }
        }
    }
}

/// Registered handlers behind a read-write lock. Dispatch reads shared;
/// registration writes exclusive.
pub(crate) struct AgentMap {
    agents: RwLock<HashMap<AgentId, Arc<dyn AgentHandler>>>,
}

impl AgentMap {
    pub(crate) fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) async fn register(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError> {
        if name.is_empty() {
            return Err(OrchError::InvalidRegistration(
                "agent name must not be empty".into(),
            ));
        }
        self.agents.write().await.insert(name, handler);
        Ok(())
    }

    pub(crate) async fn get(&self, name: &AgentId) -> Option<Arc<dyn AgentHandler>> {
        self.agents.read().await.get(name).cloned()
    }

    pub(crate) async fn all(&self) -> Vec<(AgentId, Arc<dyn AgentHandler>)> {
        self.agents
            .read()
            .await
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect()
    }
}

/// Run one handler with its agent-level hooks.
///
/// `BeforeAgentRun` may replace the state the handler receives. On success
/// the state threaded through `AfterAgentRun` is the canonical post-run
/// state; on failure the `AgentError` hook fires with the pre-run state and
/// the error is wrapped with the agent's identity.
pub(crate) async fn run_agent(
    registry: &CallbackRegistry,
    agent: &AgentId,
    handler: &Arc<dyn AgentHandler>,
    event: &Event,
    state: State,
) -> Result<State, OrchError> {
    let before = CallbackArgs::new(Hook::BeforeAgentRun, event.clone(), state)
        .with_agent(agent.clone());
    let (input_state, _) = registry.invoke(before).await;

    let snapshot = input_state.clone();
    match handler.run(event, input_state).await {
        Ok(result) => {
            let after = CallbackArgs::new(
                Hook::AfterAgentRun,
                event.clone(),
                result.output_state.clone(),
            )
            .with_agent(agent.clone())
            .with_result(result);
            let (output_state, _) = registry.invoke(after).await;
            Ok(output_state)
        }
        Err(err) => {
            let error_args = CallbackArgs::new(Hook::AgentError, event.clone(), snapshot)
                .with_agent(agent.clone())
                .with_error(err.to_string());
            registry.invoke(error_args).await;
            Err(OrchError::HandlerFailed {
                agent: agent.clone(),
                source: err,
            })
        }
    }
}

/// Broadcast an event to a set of handlers in parallel and merge the
/// successful outputs into a copy of the seed state.
///
/// Every handler gets an independent clone of `seed`. Merge order follows
/// task completion, so concurrent writers to the same key resolve
/// last-writer-wins in a non-deterministic order — callers must not depend
/// on which one lands. Dropping the returned future aborts in-flight
/// handlers (the `JoinSet` aborts its tasks on drop).
pub(crate) async fn fan_out(
    registry: &Arc<CallbackRegistry>,
    agents: Vec<(AgentId, Arc<dyn AgentHandler>)>,
    event: &Event,
    seed: &State,
    policy: FailurePolicy,
) -> Result<State, OrchError> {
    if agents.is_empty() {
        return Ok(seed.clone());
    }

    let mut join_set = JoinSet::new();
    let mut task_agents: HashMap<tokio::task::Id, AgentId> = HashMap::new();
    for (agent, handler) in agents {
        let registry = Arc::clone(registry);
        let event = event.clone();
        let state = seed.clone();
        let task_agent = agent.clone();
        let handle = join_set.spawn(async move {
            let outcome = run_agent(&registry, &task_agent, &handler, &event, state).await;
            (task_agent, outcome)
        });
        task_agents.insert(handle.id(), agent);
    }

    let mut merged = seed.clone();
    let mut successes = 0usize;
    let mut failures: Vec<AgentFailure> = Vec::new();

    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((_, (_, Ok(state)))) => {
                successes += 1;
                merged.merge_from(&state);
            }
            Ok((_, (agent, Err(err)))) => {
                failures.push(AgentFailure {
                    agent,
                    message: err.to_string(),
                });
            }
            Err(join_err) => {
                let agent = task_agents
                    .get(&join_err.id())
                    .cloned()
                    .unwrap_or_else(|| AgentId::new("unknown"));
                let err = if join_err.is_panic() {
                    OrchError::HandlerPanic(agent.clone())
                } else {
                    OrchError::Cancelled
                };
                // The task died before run_agent could fire its error hook.
                let args = CallbackArgs::new(Hook::AgentError, event.clone(), seed.clone())
                    .with_agent(agent.clone())
                    .with_error(err.to_string());
                registry.invoke(args).await;
                failures.push(AgentFailure {
                    agent,
                    message: err.to_string(),
                });
            }
        }
    }

    if policy.accepts(successes, failures.len()) {
        if !failures.is_empty() {
            tracing::warn!(
                failed = failures.len(),
                succeeded = successes,
                "axon.orch.partial_failure"
            );
        }
        Ok(merged)
    } else {
        Err(OrchError::Aggregate(AggregateError { failures }))
    }
}

/// Run an ordered list of agent names as a pipeline over a seed state.
///
/// A name with no registered handler is skipped with a warning. A handler
/// error aborts the pipeline; the error carries the last-known successful
/// state.
pub(crate) async fn run_pipeline(
    registry: &CallbackRegistry,
    agents: &AgentMap,
    order: &[AgentId],
    event: &Event,
    seed: State,
) -> Result<State, OrchError> {
    let mut state = seed;
    for agent in order {
        let Some(handler) = agents.get(agent).await else {
            tracing::warn!(agent = %agent, "axon.orch.agent_skipped");
            continue;
        };
        let prev = state.clone();
        state = match run_agent(registry, agent, &handler, event, state).await {
            Ok(next) => next,
            Err(err) => {
                return Err(OrchError::PipelineAborted {
                    agent: agent.clone(),
                    source: Box::new(err),
                    last_state: prev,
                });
            }
        };
    }
    Ok(state)
}
