//! The Callback interface — observation and mutation around handler runs.

use crate::agent::AgentResult;
use crate::error::CallbackError;
use crate::event::Event;
use crate::id::AgentId;
use crate::state::State;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Where in the event lifecycle a callback fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    /// Before an event enters orchestration.
    BeforeEventHandling,
    /// After orchestration completed successfully.
    AfterEventHandling,
    /// Before each individual agent run.
    BeforeAgentRun,
    /// After each individual agent run that succeeded.
    AfterAgentRun,
    /// When an agent run (or the dispatch around it) failed.
    AgentError,
    /// Registration wildcard: registers the callback on every concrete
    /// hook. Never fired itself.
    All,
}

impl Hook {
    /// Every concrete hook, in lifecycle order. `All` expands to this set
    /// at registration time.
    pub const CONCRETE: [Hook; 5] = [
        Hook::BeforeEventHandling,
        Hook::BeforeAgentRun,
        Hook::AfterAgentRun,
        Hook::AgentError,
        Hook::AfterEventHandling,
    ];
}

/// The record passed to every callback invocation.
#[derive(Debug, Clone)]
pub struct CallbackArgs {
    /// Which hook is firing.
    pub hook: Hook,
    /// The event being processed. A value copy — callbacks cannot mutate
    /// the in-flight event.
    pub event: Event,
    /// The agent the hook is scoped to, for agent-level hooks.
    pub agent_id: Option<AgentId>,
    /// The current working state at this point in the lifecycle.
    pub state: State,
    /// The agent result, on post-run hooks.
    pub result: Option<AgentResult>,
    /// The failure message, on [`Hook::AgentError`].
    pub error: Option<String>,
}

impl CallbackArgs {
    /// Create args with only the required fields set.
    pub fn new(hook: Hook, event: Event, state: State) -> Self {
        Self {
            hook,
            event,
            agent_id: None,
            state,
            result: None,
            error: None,
        }
    }

    /// Scope the args to an agent (builder pattern).
    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Attach the agent result (builder pattern).
    pub fn with_result(mut self, result: AgentResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach a failure message (builder pattern).
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// An observer/mutator invoked at a well-defined point around handler
/// execution.
///
/// Callbacks are middleware, not veto gates: returning an error does NOT
/// abort the agent run — the registry records it, logs it, and keeps
/// invoking the rest of the chain. Returning `Ok(Some(state))` replaces the
/// threaded state for the next callback (and, on `BeforeAgentRun`, the
/// state the handler receives); `Ok(None)` leaves it untouched.
///
/// Keep callbacks fast: they sit inline on the dispatch path, so whatever
/// latency one adds is paid by every event that flows through.
#[async_trait]
pub trait Callback: Send + Sync {
    /// Called at each hook the callback is registered under.
    async fn invoke(&self, args: CallbackArgs) -> Result<Option<State>, CallbackError>;
}

struct FnCallback<F>(F);

#[async_trait]
impl<F, Fut> Callback for FnCallback<F>
where
    F: Fn(CallbackArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<State>, CallbackError>> + Send,
{
    async fn invoke(&self, args: CallbackArgs) -> Result<Option<State>, CallbackError> {
        (self.0)(args).await
    }
}

/// Adapt an async closure into a [`Callback`] trait object.
///
/// ```
/// use axon_core::{callback_fn, CallbackArgs};
///
/// let cb = callback_fn(|args: CallbackArgs| async move {
///     let mut state = args.state;
///     state.set("observed", true);
///     Ok(Some(state))
/// });
/// # let _ = cb;
/// ```
pub fn callback_fn<F, Fut>(f: F) -> Arc<dyn Callback>
where
    F: Fn(CallbackArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<State>, CallbackError>> + Send + 'static,
{
    Arc::new(FnCallback(f))
}
