//! # axon-core — protocol types and traits for the axon execution core
//!
//! This crate defines the data model and the protocol boundaries that the
//! rest of the workspace implements. It contains no scheduling, no locking
//! strategy, and no policy — those live in the implementation crates.
//!
//! ## The protocols
//!
//! | Protocol | Types | What it does |
//! |----------|-------|-------------|
//! | Event | [`Event`] | An emitted unit of work: payload + routing headers |
//! | State | [`State`] | The mutable working set handed to a handler |
//! | Agent | [`AgentHandler`], [`AgentResult`] | What one agent does per dispatch |
//! | Callback | [`Hook`], [`Callback`], [`CallbackArgs`] | Observation and mutation around a run |
//! | Emission | [`EventEmitter`] | How a successor event re-enters the system |
//! | Trace | [`TraceEntry`] | One record per hook firing, keyed by session |
//!
//! ## Boundary rules
//!
//! Traits in this crate promise outcomes and stay silent about machinery.
//! A handler owes the framework a result for an event; how many model
//! calls, tool invocations, or retries that took is invisible at this
//! boundary, so an implementation can overhaul its internals without a
//! single signature here moving.
//!
//! ## Payloads
//!
//! `Event::data` and `State::data` hold `serde_json::Value`. Agent
//! payloads are loosely structured documents assembled by models and
//! tools, and a dynamic value type lets every component store, merge, and
//! forward them without agreeing on schemas up front; handlers that want
//! typed views deserialize at the edge.
//!
//! Cancellation is cooperative: there is no context parameter. Dropping the
//! future that drives a dispatch is the cancellation signal, and the runner
//! applies configured deadlines with `tokio::time::timeout`.

#![deny(missing_docs)]

pub mod agent;
pub mod callback;
pub mod emitter;
pub mod error;
pub mod event;
pub mod id;
pub mod state;
pub mod trace;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use agent::{AgentHandler, AgentResult};
pub use callback::{callback_fn, Callback, CallbackArgs, Hook};
pub use emitter::EventEmitter;
pub use error::{
    AgentFailure, AggregateError, CallbackError, EmitError, HandlerError, OrchError,
};
pub use event::{
    Event, ITERATION_KEY, LOOP_COMPLETED_KEY, MAX_ITERATIONS_REACHED_KEY, ROUTE_KEY,
    SESSION_ID_KEY,
};
pub use id::{AgentId, EventId, SessionId};
pub use state::State;
pub use trace::TraceEntry;
