#![deny(missing_docs)]
//! Callback registry and composition for axon.
//!
//! The [`CallbackRegistry`] holds an ordered, named list of [`Callback`]s
//! per hook. At each firing, callbacks run strictly in registration order
//! and the state threads through them as function composition: whatever a
//! callback returns becomes the next callback's input. Callback errors are
//! recorded and the chain continues — callbacks are middleware, not veto
//! gates.

use axon_core::{Callback, CallbackArgs, CallbackError, Hook, State};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct NamedCallback {
    name: String,
    callback: Arc<dyn Callback>,
}

/// An ordered, named callback pipeline per hook.
///
/// Registration writes take the lock exclusively; invocation snapshots the
/// pipeline under a shared lock and releases it before awaiting any
/// callback, so a slow callback never blocks registration.
pub struct CallbackRegistry {
    hooks: RwLock<HashMap<Hook, Vec<NamedCallback>>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Register a callback under a hook.
    ///
    /// `Hook::All` registers the callback on every concrete hook. The name
    /// identifies the callback per hook: a duplicate name overwrites the
    /// existing entry in place (its position in the order is preserved) and
    /// logs a warning.
    pub async fn register(
        &self,
        hook: Hook,
        name: impl Into<String>,
        callback: Arc<dyn Callback>,
    ) -> Result<(), CallbackError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CallbackError::Failed(
                "callback name must not be empty".into(),
            ));
        }

        let mut hooks = self.hooks.write().await;
        for concrete in Self::expand(hook) {
            let pipeline = hooks.entry(concrete).or_default();
            if let Some(existing) = pipeline.iter_mut().find(|nc| nc.name == name) {
                tracing::warn!(
                    hook = ?concrete,
                    name = %name,
                    "axon.callbacks.overwritten"
                );
                existing.callback = Arc::clone(&callback);
            } else {
                pipeline.push(NamedCallback {
                    name: name.clone(),
                    callback: Arc::clone(&callback),
                });
            }
        }
        Ok(())
    }

    /// Remove a named callback. No-op when absent. `Hook::All` removes the
    /// name from every concrete hook.
    pub async fn unregister(&self, hook: Hook, name: &str) {
        let mut hooks = self.hooks.write().await;
        for concrete in Self::expand(hook) {
            if let Some(pipeline) = hooks.get_mut(&concrete) {
                pipeline.retain(|nc| nc.name != name);
            }
        }
    }

    /// Invoke every callback registered under `args.hook`, in registration
    /// order.
    ///
    /// Each callback's returned state becomes the next one's input. The
    /// first callback error is returned for logging alongside the final
    /// state; it does not stop the chain and must not fail the agent run.
    pub async fn invoke(&self, args: CallbackArgs) -> (State, Option<CallbackError>) {
        let pipeline: Vec<(String, Arc<dyn Callback>)> = {
            let hooks = self.hooks.read().await;
            hooks
                .get(&args.hook)
                .map(|cbs| {
                    cbs.iter()
                        .map(|nc| (nc.name.clone(), Arc::clone(&nc.callback)))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut state = args.state.clone();
        let mut first_error: Option<CallbackError> = None;

        for (name, callback) in pipeline {
            let mut step_args = args.clone();
            step_args.state = state.clone();
            match callback.invoke(step_args).await {
                Ok(Some(next)) => state = next,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        hook = ?args.hook,
                        name = %name,
                        error = %e,
                        "axon.callbacks.failed"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        (state, first_error)
    }

    /// Number of callbacks registered under a hook.
    pub async fn count(&self, hook: Hook) -> usize {
        self.hooks
            .read()
            .await
            .get(&hook)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Registered names under a hook, in invocation order.
    pub async fn names(&self, hook: Hook) -> Vec<String> {
        self.hooks
            .read()
            .await
            .get(&hook)
            .map(|cbs| cbs.iter().map(|nc| nc.name.clone()).collect())
            .unwrap_or_default()
    }

    fn expand(hook: Hook) -> Vec<Hook> {
        match hook {
            Hook::All => Hook::CONCRETE.to_vec(),
            concrete => vec![concrete],
        }
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
