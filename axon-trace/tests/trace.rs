use axon_core::{Callback, CallbackArgs, Event, Hook, SessionId, State, TraceEntry};
use axon_trace::{resolve_session_id, TraceCallback, TraceLogger};
use std::sync::Arc;

fn entry(session: &str, hook: Hook) -> TraceEntry {
    TraceEntry::new(session, hook, State::new())
}

// --- Append order and snapshots ---

#[tokio::test]
async fn entries_come_back_in_append_order() {
    let logger = TraceLogger::new();
    logger.log(entry("s1", Hook::BeforeEventHandling)).await;
    logger.log(entry("s1", Hook::BeforeAgentRun)).await;
    logger.log(entry("s1", Hook::AfterAgentRun)).await;
    logger.log(entry("s2", Hook::BeforeEventHandling)).await;

    let trace = logger.trace(&SessionId::new("s1")).await;
    let hooks: Vec<Hook> = trace.iter().map(|e| e.hook).collect();
    assert_eq!(
        hooks,
        vec![
            Hook::BeforeEventHandling,
            Hook::BeforeAgentRun,
            Hook::AfterAgentRun
        ]
    );
}

#[tokio::test]
async fn unknown_session_yields_empty_trace() {
    let logger = TraceLogger::new();
    assert!(logger.trace(&SessionId::new("ghost")).await.is_empty());
}

#[tokio::test]
async fn snapshot_is_independent_of_the_store() {
    let logger = TraceLogger::new();
    logger.log(entry("s1", Hook::BeforeEventHandling)).await;

    let mut snapshot = logger.trace(&SessionId::new("s1")).await;
    snapshot.clear();

    assert_eq!(logger.trace(&SessionId::new("s1")).await.len(), 1);
}

#[tokio::test]
async fn concurrent_loggers_lose_nothing() {
    let logger = Arc::new(TraceLogger::new());
    let mut handles = Vec::new();
    for i in 0..8 {
        let logger = Arc::clone(&logger);
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                logger.log(entry(&format!("s{}", i % 2), Hook::AfterAgentRun)).await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let total = logger.trace(&SessionId::new("s0")).await.len()
        + logger.trace(&SessionId::new("s1")).await.len();
    assert_eq!(total, 400);
}

// --- Ring cap ---

#[tokio::test]
async fn session_capacity_evicts_oldest_first() {
    let logger = TraceLogger::with_session_capacity(3);
    for i in 0..5 {
        let mut state = State::new();
        state.set("n", i);
        logger.log(TraceEntry::new("s1", Hook::AfterAgentRun, state)).await;
    }

    let trace = logger.trace(&SessionId::new("s1")).await;
    assert_eq!(trace.len(), 3);
    let ns: Vec<i64> = trace
        .iter()
        .map(|e| e.state.get("n").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert_eq!(ns, vec![2, 3, 4], "oldest evicted, order preserved");
}

// --- Session resolution ---

#[tokio::test]
async fn session_resolution_prefers_state_meta() {
    let event = Event::new().with_session("from-event");
    let mut state = State::new();
    state.set_meta("session_id", "from-state");

    assert_eq!(
        resolve_session_id(&event, Some(&state)),
        SessionId::new("from-state")
    );
}

#[tokio::test]
async fn session_resolution_falls_back_to_event_metadata() {
    let event = Event::new().with_session("from-event");
    assert_eq!(
        resolve_session_id(&event, Some(&State::new())),
        SessionId::new("from-event")
    );
    assert_eq!(resolve_session_id(&event, None), SessionId::new("from-event"));
}

#[tokio::test]
async fn session_resolution_synthesizes_from_event_id() {
    let event = Event::new().with_id("e9");
    assert_eq!(
        resolve_session_id(&event, None),
        SessionId::new("session-e9")
    );
}

// --- TraceCallback ---

#[tokio::test]
async fn trace_callback_records_agent_and_error() {
    let logger = Arc::new(TraceLogger::new());
    let callback = TraceCallback::new(Arc::clone(&logger));

    let event = Event::new().with_session("s1");
    let args = CallbackArgs::new(Hook::AgentError, event, State::new())
        .with_agent("echo")
        .with_error("boom");
    let result = callback.invoke(args).await.unwrap();
    assert!(result.is_none(), "trace callback never rewrites state");

    let trace = logger.trace(&SessionId::new("s1")).await;
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].hook, Hook::AgentError);
    assert_eq!(trace[0].agent_id.as_ref().unwrap().as_str(), "echo");
    assert_eq!(trace[0].error.as_deref(), Some("boom"));
}
