//! RecordingCallback — captures every hook firing for assertions.

use crate::callback::{Callback, CallbackArgs, Hook};
use crate::error::CallbackError;
use crate::id::AgentId;
use crate::state::State;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A callback that records each firing's hook and agent scope.
///
/// Cheap to clone; clones share the underlying log, so a test can register
/// one copy and assert on the other.
#[derive(Clone, Default)]
pub struct RecordingCallback {
    log: Arc<Mutex<Vec<(Hook, Option<AgentId>)>>>,
}

impl RecordingCallback {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded firings, in invocation order.
    pub fn firings(&self) -> Vec<(Hook, Option<AgentId>)> {
        self.log.lock().expect("recording lock poisoned").clone()
    }

    /// Just the hooks, in invocation order.
    pub fn hooks(&self) -> Vec<Hook> {
        self.firings().into_iter().map(|(h, _)| h).collect()
    }
}

#[async_trait]
impl Callback for RecordingCallback {
    async fn invoke(&self, args: CallbackArgs) -> Result<Option<State>, CallbackError> {
        self.log
            .lock()
            .expect("recording lock poisoned")
            .push((args.hook, args.agent_id.clone()));
        Ok(None)
    }
}
