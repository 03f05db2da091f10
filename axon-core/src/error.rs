//! Error types for each protocol.

use crate::id::AgentId;
use crate::state::State;
use std::fmt;
use thiserror::Error;

/// Event submission errors. Always caller-visible — the queue never drops
/// silently.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmitError {
    /// The event queue is at capacity.
    #[error("event queue is full")]
    QueueFull,

    /// The runner is stopping or stopped.
    #[error("runner is stopped")]
    RunnerStopped,

    /// The event failed validation before enqueueing.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

/// Agent handler execution errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A transient failure; running the handler again may work. Whether
    /// anything retries is up to the caller.
    #[error("retryable: {0}")]
    Retryable(String),

    /// A permanent failure a retry cannot fix.
    #[error("fatal: {0}")]
    Fatal(String),

    /// Any other failure, boxed with whatever context the handler had.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// One handler's failure inside a parallel dispatch.
#[derive(Debug, Clone)]
pub struct AgentFailure {
    /// The agent that failed.
    pub agent: AgentId,
    /// Its error message.
    pub message: String,
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.agent, self.message)
    }
}

/// Multiple handler failures from a parallel dispatch, individually
/// accessible.
#[derive(Debug, Clone)]
pub struct AggregateError {
    /// Every failure, in completion order.
    pub failures: Vec<AgentFailure>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} agent(s) failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Orchestration errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrchError {
    /// Route-based dispatch received an event without a `route` header.
    #[error("event {0} has no route metadata")]
    MissingRoute(crate::id::EventId),

    /// The dispatch targets an unregistered agent name.
    #[error("agent not found: {0}")]
    UnknownAgent(AgentId),

    /// An agent handler returned an error.
    #[error("agent {agent} failed")]
    HandlerFailed {
        /// The agent that failed.
        agent: AgentId,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },

    /// An agent handler panicked; recovered at the task boundary.
    #[error("agent {0} panicked")]
    HandlerPanic(AgentId),

    /// The dispatch was cancelled before completion.
    #[error("dispatch cancelled")]
    Cancelled,

    /// The configured orchestration deadline elapsed.
    #[error("dispatch timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A parallel dispatch failed its failure policy.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A sequential pipeline aborted partway. Carries the last state the
    /// pipeline produced before the failing stage.
    #[error("pipeline aborted at agent {agent}")]
    PipelineAborted {
        /// The stage that failed.
        agent: AgentId,
        /// Why it failed.
        #[source]
        source: Box<OrchError>,
        /// The last-known successful state.
        last_state: State,
    },

    /// A sequential dispatch was attempted with no configured agents.
    #[error("sequential pipeline has no agents")]
    EmptyPipeline,

    /// Agent registration was rejected (empty name, for instance).
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),
}

/// Callback errors. Logged by the registry but never fatal to the agent
/// run — callbacks observe and transform, they don't veto.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The callback failed.
    #[error("callback failed: {0}")]
    Failed(String),

    /// Any other failure, boxed.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
