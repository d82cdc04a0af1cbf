//! Summarizer's deterministic fallback narration, exercised through a dummy
//! LLM provider that always fails structured decode (§8 scenario 6, and the
//! execution-error / chat branches).

use nl2sql_workflow::agents::Summarizer;
use nl2sql_workflow::llm::OpenAiClient;
use nl2sql_workflow::state::{StatePatch, WorkflowState};

fn dummy_llm() -> OpenAiClient {
    OpenAiClient::new("dummy-api-key", "https://unused", "gpt-4o", 5)
}

#[tokio::test]
async fn execution_error_branch_is_surfaced_without_raw_engine_text() {
    let llm = dummy_llm();
    let mut patch = StatePatch::new();
    patch.execution_error = Some(Some("table_not_found: no such table orders".to_string()));
    let state = WorkflowState::new("t1", "how many orders?", 3).apply(patch);

    let summarizer = Summarizer;
    let patch = summarizer.summarize(&llm, &state).await;
    let answer = patch.final_answer.flatten().expect("fallback answer set");
    assert!(answer.contains("couldn't run that query"));
    assert!(!answer.contains("no such table orders"));
    assert!(!answer.contains("table_not_found"));
}

#[tokio::test]
async fn empty_result_set_gets_a_no_rows_answer() {
    let llm = dummy_llm();
    let mut patch = StatePatch::new();
    patch.query_results = Some(Some(Vec::new()));
    let state = WorkflowState::new("t1", "orders placed on the moon", 3).apply(patch);

    let summarizer = Summarizer;
    let patch = summarizer.summarize(&llm, &state).await;
    let answer = patch.final_answer.flatten().expect("fallback answer set");
    assert_eq!(answer, "That query didn't return any rows.");
}

#[tokio::test]
async fn populated_result_set_gets_a_row_count_answer() {
    let llm = dummy_llm();
    let mut row = serde_json::Map::new();
    row.insert("amount".to_string(), serde_json::json!(10.5));
    let mut patch = StatePatch::new();
    patch.query_results = Some(Some(vec![row.clone(), row]));
    let state = WorkflowState::new("t1", "total sales", 3).apply(patch);

    let summarizer = Summarizer;
    let patch = summarizer.summarize(&llm, &state).await;
    let answer = patch.final_answer.flatten().expect("fallback answer set");
    assert_eq!(answer, "Found 2 row(s).");
}

#[tokio::test]
async fn chat_turn_with_no_query_results_gets_a_generic_answer() {
    let llm = dummy_llm();
    let state = WorkflowState::new("t1", "hello there", 3);

    let summarizer = Summarizer;
    let patch = summarizer.summarize(&llm, &state).await;
    let answer = patch.final_answer.flatten().expect("fallback answer set");
    assert_eq!(answer, "I'm not sure how to help with that.");
}
