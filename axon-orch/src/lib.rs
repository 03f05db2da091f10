#![deny(missing_docs)]
//! Orchestration strategies for axon.
//!
//! An orchestrator decides which handler(s) receive an event and how their
//! outputs compose. Five strategies are provided:
//!
//! - [`RouteOrchestrator`] — one handler, named by the event's `route`
//!   header; re-emits a successor event when the output asks for one.
//! - [`CollaborativeOrchestrator`] — broadcast to every registered handler
//!   in parallel, merge last-writer-wins.
//! - [`SequentialOrchestrator`] — an ordered pipeline; each stage receives
//!   the previous stage's output state.
//! - [`LoopOrchestrator`] — one handler invoked repeatedly until it signals
//!   completion or the iteration cap is hit.
//! - [`MixedOrchestrator`] — a parallel phase whose merged output seeds a
//!   sequential phase.
//!
//! All strategies run agent-level callbacks through the same code path, so
//! `BeforeAgentRun` / `AfterAgentRun` / `AgentError` fire identically no
//! matter which topology is in play. Handler maps sit behind a read-write
//! lock: dispatches take shared access, registration takes exclusive.

mod collaborative;
mod loop_impl;
mod mixed;
mod route;
mod run;
mod sequential;

pub use collaborative::CollaborativeOrchestrator;
pub use loop_impl::LoopOrchestrator;
pub use mixed::MixedOrchestrator;
pub use route::RouteOrchestrator;
pub use run::FailurePolicy;
pub use sequential::SequentialOrchestrator;

use async_trait::async_trait;
use axon_core::{AgentHandler, AgentId, AgentResult, Event, EventEmitter, OrchError};
use axon_hooks::CallbackRegistry;
use std::sync::Arc;

/// How an event maps to one or more handler invocations.
///
/// Callers hold this as a trait object and stay ignorant of the topology:
/// whether `dispatch` runs one handler or a dozen in parallel is the
/// strategy's business. Dropping the future returned by `dispatch` cancels
/// the work, including any tasks a parallel strategy spawned.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Register a handler under a name. Rejects empty names.
    async fn register_agent(
        &self,
        name: AgentId,
        handler: Arc<dyn AgentHandler>,
    ) -> Result<(), OrchError>;

    /// Process one event to completion under this strategy.
    async fn dispatch(&self, event: Event) -> Result<AgentResult, OrchError>;

    /// The callback registry this orchestrator fires hooks through.
    fn callbacks(&self) -> Arc<CallbackRegistry>;

    /// Bind the emitter used for successor events. Strategies that never
    /// re-emit ignore it.
    fn set_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        let _ = emitter;
    }

    /// Release resources held for dispatching (bound emitters, for
    /// instance). Dispatches already in flight are unaffected.
    fn stop(&self) {}
}
