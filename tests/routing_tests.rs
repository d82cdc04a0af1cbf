//! The two conditional-edge functions exercised directly against states built
//! from the `create_mock_*` test doubles (§8 invariants, boundary tests).

use nl2sql_workflow::agents::{create_mock_router, create_mock_sql_generator};
use nl2sql_workflow::graph::{check_validation, route_by_intent, Node};
use nl2sql_workflow::state::{Intent, WorkflowState};
use nl2sql_workflow::validator::create_mock_validator;

fn base_state(max_retries: u32) -> WorkflowState {
    WorkflowState::new("t1", "how many orders shipped last week?", max_retries)
}

#[tokio::test]
async fn query_intent_routes_to_schema_discovery() {
    let state = base_state(3);
    let patch = create_mock_router(Intent::Query, 0.9)(&state);
    let state = state.apply(patch);
    assert_eq!(route_by_intent(&state), Node::SchemaDiscovery);
}

#[tokio::test]
async fn missing_intent_defaults_to_schema_discovery() {
    let state = base_state(3);
    assert_eq!(route_by_intent(&state), Node::SchemaDiscovery);
}

#[tokio::test]
async fn summarize_intent_routes_to_executor() {
    let state = base_state(3);
    let patch = create_mock_router(Intent::Summarize, 0.9)(&state);
    let state = state.apply(patch);
    assert_eq!(route_by_intent(&state), Node::Executor);
}

#[tokio::test]
async fn chat_intent_routes_to_summarizer() {
    let state = base_state(3);
    let patch = create_mock_router(Intent::Chat, 0.9)(&state);
    let state = state.apply(patch);
    assert_eq!(route_by_intent(&state), Node::Summarizer);
}

#[tokio::test]
async fn clarify_intent_ends_the_run() {
    let state = base_state(3);
    let patch = create_mock_router(Intent::Clarify, 0.4)(&state);
    let state = state.apply(patch);
    assert_eq!(route_by_intent(&state), Node::End);
}

#[tokio::test]
async fn valid_sql_routes_to_executor() {
    let state = base_state(3);
    let patch = create_mock_validator(true, Vec::new())(&state);
    let state = state.apply(patch);
    assert_eq!(check_validation(&state), Node::Executor);
}

#[tokio::test]
async fn invalid_sql_within_budget_routes_back_to_generator() {
    let mut state = base_state(3);
    state.retry_count = 1;
    let patch = create_mock_validator(false, vec!["bad sql".to_string()])(&state);
    let state = state.apply(patch);
    assert_eq!(check_validation(&state), Node::SqlGenerator);
}

#[tokio::test]
async fn retry_count_exactly_at_max_retries_gives_one_last_attempt_then_fails_gracefully() {
    // Boundary test: when the generator has already completed `max_retries`
    // attempts, the next invalid result must stop the loop, not allow a
    // further retry.
    let mut state = base_state(3);
    state.retry_count = 3;
    let patch = create_mock_validator(false, vec!["still bad".to_string()])(&state);
    let state = state.apply(patch);
    assert_eq!(check_validation(&state), Node::Summarizer);
}

#[tokio::test]
async fn generator_output_feeds_validator_routing_consistently() {
    let state = base_state(3);
    let patch = create_mock_sql_generator("SELECT 1".to_string())(&state);
    let state = state.apply(patch);
    assert_eq!(state.generated_sql.as_deref(), Some("SELECT 1"));
    // Generation alone does not decide validity; `check_validation` only
    // looks at `sql_is_valid`, which a mock validator sets separately.
    assert_eq!(check_validation(&state), Node::SqlGenerator);
}
