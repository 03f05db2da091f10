//! The callback that feeds the trace logger.

use crate::{resolve_session_id, TraceLogger};
use async_trait::async_trait;
use axon_core::{Callback, CallbackArgs, CallbackError, State, TraceEntry};
use std::sync::Arc;

/// A [`Callback`] that records every hook firing into a shared
/// [`TraceLogger`].
///
/// Observes only — always returns `Ok(None)` so it never alters the
/// threaded state. Register it under `Hook::All` to capture the full
/// lifecycle of every event.
pub struct TraceCallback {
    logger: Arc<TraceLogger>,
}

impl TraceCallback {
    /// Create a callback writing into the given logger.
    pub fn new(logger: Arc<TraceLogger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Callback for TraceCallback {
    async fn invoke(&self, args: CallbackArgs) -> Result<Option<State>, CallbackError> {
        let session = resolve_session_id(&args.event, Some(&args.state));
        let mut entry = TraceEntry::new(session, args.hook, args.state.clone());
        if let Some(agent) = &args.agent_id {
            entry = entry.with_agent(agent.clone());
        }
        if let Some(error) = &args.error {
            entry = entry.with_error(error.clone());
        }
        self.logger.log(entry).await;
        Ok(None)
    }
}
