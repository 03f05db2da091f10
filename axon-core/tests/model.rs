use axon_core::{Event, Hook, State, TraceEntry};
use serde_json::json;

// --- State clone independence ---

#[test]
fn clone_is_deep() {
    let mut original = State::new();
    original.set("nested", json!({"list": [1, 2, 3], "flag": true}));
    original.set_meta("route", "summarizer");

    let mut copy = original.clone();
    copy.set("nested", json!({"list": []}));
    copy.set("extra", 42);
    copy.set_meta("route", "planner");
    copy.remove_meta("route");

    assert_eq!(
        original.get("nested"),
        Some(&json!({"list": [1, 2, 3], "flag": true}))
    );
    assert!(original.get("extra").is_none());
    assert_eq!(original.get_meta("route"), Some("summarizer"));
}

#[test]
fn merge_from_last_writer_wins() {
    let mut base = State::new();
    base.set("k", "old");
    base.set("only_base", 1);

    let mut other = State::new();
    other.set("k", "new");
    other.set_meta("m", "v");

    base.merge_from(&other);
    assert_eq!(base.get("k"), Some(&json!("new")));
    assert_eq!(base.get("only_base"), Some(&json!(1)));
    assert_eq!(base.get_meta("m"), Some("v"));
}

// --- Event construction ---

#[test]
fn event_gets_generated_id() {
    let a = Event::new();
    let b = Event::new();
    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
}

#[test]
fn event_builder_sets_reserved_headers() {
    let event = Event::new()
        .with_id("e1")
        .with_data("msg", "hi")
        .with_route("echo")
        .with_session("s1");

    assert_eq!(event.id.as_str(), "e1");
    assert_eq!(event.route(), Some("echo"));
    assert_eq!(event.session_id(), Some("s1"));
    assert_eq!(event.data["msg"], json!("hi"));
}

#[test]
fn empty_route_reads_as_absent() {
    let event = Event::new().with_route("");
    assert_eq!(event.route(), None);
}

#[test]
fn state_from_event_seeds_data_only() {
    let event = Event::new().with_data("msg", "hi").with_route("echo");
    let state = State::from_event(&event);
    assert_eq!(state.get("msg"), Some(&json!("hi")));
    assert!(state.meta().is_empty());
}

// --- Trace round-trip ---

#[test]
fn trace_entries_roundtrip_through_json() {
    let mut state = State::new();
    state.set("n", 3);
    state.set_meta("session_id", "s1");

    let entries = vec![
        TraceEntry::new("s1", Hook::BeforeEventHandling, state.clone()),
        TraceEntry::new("s1", Hook::BeforeAgentRun, state.clone()).with_agent("echo"),
        TraceEntry::new("s1", Hook::AgentError, state).with_agent("echo").with_error("boom"),
    ];

    let bytes = serde_json::to_vec(&entries).unwrap();
    let decoded: Vec<TraceEntry> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(entries, decoded);
}

#[test]
fn concrete_hooks_exclude_the_wildcard() {
    assert_eq!(Hook::CONCRETE.len(), 5);
    assert!(!Hook::CONCRETE.contains(&Hook::All));
}
