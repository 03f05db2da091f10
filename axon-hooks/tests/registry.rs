use axon_core::test_utils::RecordingCallback;
use axon_core::{callback_fn, Callback, CallbackArgs, CallbackError, Event, Hook, State};
use std::sync::{Arc, Mutex};

use axon_hooks::CallbackRegistry;

fn args(hook: Hook) -> CallbackArgs {
    CallbackArgs::new(hook, Event::new().with_session("s1"), State::new())
}

// --- Empty registry ---

#[tokio::test]
async fn empty_registry_returns_input_state() {
    let registry = CallbackRegistry::new();
    let mut state = State::new();
    state.set("k", 1);

    let input = CallbackArgs::new(Hook::BeforeAgentRun, Event::new(), state.clone());
    let (out, err) = registry.invoke(input).await;
    assert_eq!(out, state);
    assert!(err.is_none());
}

// --- Ordering ---

/// A callback that appends its name to a shared log.
struct NamedCallback {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait::async_trait]
impl Callback for NamedCallback {
    async fn invoke(&self, _args: CallbackArgs) -> Result<Option<State>, CallbackError> {
        self.log.lock().unwrap().push(self.name);
        Ok(None)
    }
}

#[tokio::test]
async fn callbacks_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = CallbackRegistry::new();

    for name in ["first", "second", "third"] {
        registry
            .register(
                Hook::BeforeAgentRun,
                name,
                Arc::new(NamedCallback {
                    name,
                    log: Arc::clone(&log),
                }),
            )
            .await
            .unwrap();
    }

    registry.invoke(args(Hook::BeforeAgentRun)).await;
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

// --- State threading ---

#[tokio::test]
async fn state_threads_through_the_chain() {
    let registry = CallbackRegistry::new();

    registry
        .register(
            Hook::BeforeAgentRun,
            "append-a",
            callback_fn(|args: CallbackArgs| async move {
                let mut state = args.state;
                let acc = state.get("acc").and_then(|v| v.as_str()).unwrap_or("").to_owned();
                state.set("acc", format!("{acc}a"));
                Ok(Some(state))
            }),
        )
        .await
        .unwrap();
    registry
        .register(
            Hook::BeforeAgentRun,
            "append-b",
            callback_fn(|args: CallbackArgs| async move {
                let mut state = args.state;
                let acc = state.get("acc").and_then(|v| v.as_str()).unwrap_or("").to_owned();
                state.set("acc", format!("{acc}b"));
                Ok(Some(state))
            }),
        )
        .await
        .unwrap();

    let (out, err) = registry.invoke(args(Hook::BeforeAgentRun)).await;
    assert_eq!(out.get("acc"), Some(&serde_json::json!("ab")));
    assert!(err.is_none());
}

// --- Errors don't stop the chain ---

#[tokio::test]
async fn error_is_recorded_and_chain_continues() {
    let registry = CallbackRegistry::new();
    let recorder = RecordingCallback::new();

    registry
        .register(
            Hook::AfterAgentRun,
            "broken",
            callback_fn(|_args: CallbackArgs| async move {
                Err(CallbackError::Failed("deliberate".into()))
            }),
        )
        .await
        .unwrap();
    registry
        .register(Hook::AfterAgentRun, "after-broken", Arc::new(recorder.clone()))
        .await
        .unwrap();

    let (_, err) = registry.invoke(args(Hook::AfterAgentRun)).await;
    assert!(err.is_some());
    assert_eq!(recorder.hooks(), vec![Hook::AfterAgentRun]);
}

// --- Overwrite semantics ---

#[tokio::test]
async fn duplicate_name_overwrites_in_place() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = CallbackRegistry::new();

    registry
        .register(
            Hook::BeforeAgentRun,
            "slot",
            Arc::new(NamedCallback {
                name: "old",
                log: Arc::clone(&log),
            }),
        )
        .await
        .unwrap();
    registry
        .register(
            Hook::BeforeAgentRun,
            "tail",
            Arc::new(NamedCallback {
                name: "tail",
                log: Arc::clone(&log),
            }),
        )
        .await
        .unwrap();
    registry
        .register(
            Hook::BeforeAgentRun,
            "slot",
            Arc::new(NamedCallback {
                name: "new",
                log: Arc::clone(&log),
            }),
        )
        .await
        .unwrap();

    assert_eq!(registry.count(Hook::BeforeAgentRun).await, 2);
    registry.invoke(args(Hook::BeforeAgentRun)).await;
    // Overwrite keeps the original position: "slot" still runs before "tail".
    assert_eq!(*log.lock().unwrap(), vec!["new", "tail"]);
}

// --- Unregister round-trip ---

#[tokio::test]
async fn unregister_restores_prior_behavior() {
    let registry = CallbackRegistry::new();
    let recorder = RecordingCallback::new();

    registry
        .register(Hook::AgentError, "recorder", Arc::new(recorder.clone()))
        .await
        .unwrap();
    registry.invoke(args(Hook::AgentError)).await;
    assert_eq!(recorder.hooks().len(), 1);

    registry.unregister(Hook::AgentError, "recorder").await;
    registry.invoke(args(Hook::AgentError)).await;
    assert_eq!(recorder.hooks().len(), 1, "no firing after unregister");
    assert_eq!(registry.count(Hook::AgentError).await, 0);
}

#[tokio::test]
async fn unregister_unknown_name_is_noop() {
    let registry = CallbackRegistry::new();
    registry.unregister(Hook::AgentError, "ghost").await;
    assert_eq!(registry.count(Hook::AgentError).await, 0);
}

// --- Wildcard registration ---

#[tokio::test]
async fn all_registers_on_every_concrete_hook() {
    let registry = CallbackRegistry::new();
    let recorder = RecordingCallback::new();

    registry
        .register(Hook::All, "recorder", Arc::new(recorder.clone()))
        .await
        .unwrap();

    for hook in Hook::CONCRETE {
        assert_eq!(registry.count(hook).await, 1, "{hook:?} should have one");
        registry.invoke(args(hook)).await;
    }
    assert_eq!(recorder.hooks(), Hook::CONCRETE.to_vec());

    registry.unregister(Hook::All, "recorder").await;
    for hook in Hook::CONCRETE {
        assert_eq!(registry.count(hook).await, 0);
    }
}

// --- Validation ---

#[tokio::test]
async fn empty_name_is_rejected() {
    let registry = CallbackRegistry::new();
    let result = registry
        .register(Hook::BeforeAgentRun, "", Arc::new(RecordingCallback::new()))
        .await;
    assert!(result.is_err());
}
