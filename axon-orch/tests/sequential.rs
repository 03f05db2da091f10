use async_trait::async_trait;
use axon_core::test_utils::FailingAgent;
use axon_core::{AgentHandler, AgentId, AgentResult, Event, HandlerError, OrchError, State};
use axon_orch::{Orchestrator, SequentialOrchestrator};
use serde_json::json;
use std::sync::Arc;

/// Appends a letter to the `acc` accumulator.
struct Appender(&'static str);

#[async_trait]
impl AgentHandler for Appender {
    async fn run(&self, _event: &Event, mut state: State) -> Result<AgentResult, HandlerError> {
        let acc = state.get("acc").and_then(|v| v.as_str()).unwrap_or("").to_owned();
        state.set("acc", format!("{acc}{}", self.0));
        Ok(AgentResult::new(state))
    }
}

async fn abc_pipeline() -> SequentialOrchestrator {
    let orch = SequentialOrchestrator::new(["A", "B", "C"]);
    for (name, letter) in [("A", "a"), ("B", "b"), ("C", "c")] {
        orch.register_agent(AgentId::new(name), Arc::new(Appender(letter)))
            .await
            .unwrap();
    }
    orch
}

// --- Ordering ---

#[tokio::test]
async fn stages_run_in_configured_order() {
    let orch = abc_pipeline().await;
    let result = orch.dispatch(Event::new()).await.unwrap();
    assert_eq!(result.output_state.get("acc"), Some(&json!("abc")));
}

#[tokio::test]
async fn each_stage_sees_the_previous_output() {
    /// Fails unless the previous stage already ran.
    struct Dependent;

    #[async_trait]
    impl AgentHandler for Dependent {
        async fn run(&self, _event: &Event, mut state: State) -> Result<AgentResult, HandlerError> {
            let acc = state.get("acc").and_then(|v| v.as_str()).unwrap_or("");
            if acc != "a" {
                return Err(HandlerError::Fatal(format!("expected 'a', saw '{acc}'")));
            }
            state.set("checked", true);
            Ok(AgentResult::new(state))
        }
    }

    let orch = SequentialOrchestrator::new(["A", "check"]);
    orch.register_agent(AgentId::new("A"), Arc::new(Appender("a")))
        .await
        .unwrap();
    orch.register_agent(AgentId::new("check"), Arc::new(Dependent))
        .await
        .unwrap();

    let result = orch.dispatch(Event::new()).await.unwrap();
    assert_eq!(result.output_state.get("checked"), Some(&json!(true)));
}

// --- Skips and boundaries ---

#[tokio::test]
async fn missing_stage_is_skipped() {
    let orch = SequentialOrchestrator::new(["A", "ghost", "C"]);
    orch.register_agent(AgentId::new("A"), Arc::new(Appender("a")))
        .await
        .unwrap();
    orch.register_agent(AgentId::new("C"), Arc::new(Appender("c")))
        .await
        .unwrap();

    let result = orch.dispatch(Event::new()).await.unwrap();
    assert_eq!(result.output_state.get("acc"), Some(&json!("ac")));
}

#[tokio::test]
async fn empty_pipeline_is_rejected() {
    let orch = SequentialOrchestrator::new(Vec::<String>::new());
    let result = orch.dispatch(Event::new()).await;
    assert!(matches!(result, Err(OrchError::EmptyPipeline)));
}

// --- Failure ---

#[tokio::test]
async fn stage_error_aborts_with_last_known_state() {
    let orch = SequentialOrchestrator::new(["A", "B", "C"]);
    orch.register_agent(AgentId::new("A"), Arc::new(Appender("a")))
        .await
        .unwrap();
    orch.register_agent(AgentId::new("B"), Arc::new(FailingAgent::new("stage down")))
        .await
        .unwrap();
    orch.register_agent(AgentId::new("C"), Arc::new(Appender("c")))
        .await
        .unwrap();

    match orch.dispatch(Event::new()).await {
        Err(OrchError::PipelineAborted { agent, last_state, .. }) => {
            assert_eq!(agent.as_str(), "B");
            assert_eq!(last_state.get("acc"), Some(&json!("a")), "C never ran");
        }
        other => panic!("expected PipelineAborted, got {other:?}"),
    }
}
