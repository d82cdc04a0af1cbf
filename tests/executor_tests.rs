//! Executor contract: error classification taxonomy and the "no retry loop
//! re-enablement on failure" invariant (§4.4, §9 Open Question #1).

use nl2sql_workflow::executor::classify::{classify_error, format_error_for_llm, ErrorKind};
use nl2sql_workflow::executor::create_mock_executor;
use nl2sql_workflow::state::{StatePatch, ValidationStatus, WorkflowState};

fn valid_state() -> WorkflowState {
    let mut state = WorkflowState::new("t1", "how many orders?", 3);
    let mut patch = StatePatch::new();
    patch.generated_sql = Some(Some("SELECT 1 LIMIT 1".to_string()));
    patch.sql_is_valid = Some(true);
    patch.validation_status = Some(ValidationStatus::Valid);
    state.apply(patch)
}

#[test]
fn classifies_table_not_found() {
    assert_eq!(
        classify_error("duckdb::BinderException: Table with name sales does not exist"),
        ErrorKind::TableNotFound
    );
}

#[test]
fn classifies_column_not_found_before_table_not_found() {
    // A message naming a column could also contain words that superficially
    // look table-ish; column checks must win when both patterns could match.
    assert_eq!(
        classify_error("Referenced column \"amount\" not found in table"),
        ErrorKind::ColumnNotFound
    );
}

#[test]
fn classifies_division_by_zero() {
    assert_eq!(classify_error("division by zero"), ErrorKind::DivisionByZero);
}

#[test]
fn unrecognized_message_is_unknown() {
    assert_eq!(classify_error("something extremely unusual happened"), ErrorKind::Unknown);
}

#[tokio::test]
async fn execution_error_never_reopens_the_retry_loop() {
    let executor = create_mock_executor(None, Some("table_not_found: no such table orders".to_string()));
    let state = valid_state();
    let patch = executor(&state);

    let error = patch.execution_error.flatten().expect("error set");
    assert!(!error.contains("no such table orders"));
    // The executor's contract explicitly must not touch these fields, since
    // only the validator<->generator edge may retry.
    assert!(patch.sql_is_valid.is_none());
    assert!(patch.validation_errors.is_none());
}

#[test]
fn format_error_for_llm_never_echoes_raw_engine_text() {
    let formatted = format_error_for_llm(ErrorKind::TableNotFound);
    assert!(!formatted.contains("orders"));
    assert!(formatted.contains("available schema"));
}

#[tokio::test]
async fn executor_refuses_to_run_invalid_sql() {
    let executor = create_mock_executor(Some(vec![Default::default()]), None);
    let mut state = WorkflowState::new("t1", "x", 3);
    state.sql_is_valid = false;
    let patch = executor(&state);
    assert!(patch.execution_error.flatten().is_some());
    assert_eq!(patch.row_count, Some(0));
}
