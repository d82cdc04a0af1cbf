//! Validator pipeline: §8 boundary tests plus the security/SELECT-only
//! gates.

use std::sync::Arc;

use nl2sql_workflow::executor::engine::{default_engine, AnalyticEngine};
use nl2sql_workflow::schema::{ColumnSchema, RegistryState, SchemaRegistry, SourceType, TableSchema};
use nl2sql_workflow::state::{StatePatch, ValidationStatus, WorkflowState};
use nl2sql_workflow::validator::Validator;

fn table(name: &str, columns: &[&str]) -> TableSchema {
    TableSchema {
        name: name.to_string(),
        source_type: SourceType::LocalFile,
        source_path: format!("{name}.parquet"),
        columns: columns
            .iter()
            .map(|c| ColumnSchema {
                name: c.to_string(),
                data_type: "Utf8".to_string(),
                nullable: true,
                sample_values: Vec::new(),
            })
            .collect(),
        row_count: Some(100),
        last_modified: None,
        file_format: Some("parquet".to_string()),
        date_column: None,
        date_range_start: None,
        date_range_end: None,
    }
}

fn registry_with(tables: Vec<TableSchema>) -> Arc<SchemaRegistry> {
    let engine: Arc<dyn AnalyticEngine> = Arc::new(default_engine("."));
    let mut state = RegistryState::default();
    for t in tables {
        state.tables.insert(t.name.clone(), t);
    }
    Arc::new(SchemaRegistry::from_state(engine, state, 300))
}

fn state_with_sql(sql: &str, tables: Vec<String>, max_retries: u32) -> WorkflowState {
    let mut state = WorkflowState::new("t1", "does not matter", max_retries);
    state.available_tables = tables;
    let mut patch = StatePatch::new();
    patch.generated_sql = Some(Some(sql.to_string()));
    state.apply(patch)
}

#[tokio::test]
async fn blocks_drop_statement() {
    let registry = registry_with(vec![table("sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("DROP TABLE sales", vec!["sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(false));
    let errors = patch.validation_errors.unwrap();
    assert!(errors.iter().any(|e| e.contains("DROP") || e.contains("Blocked")));
}

#[tokio::test]
async fn parse_error_is_reported() {
    let registry = registry_with(vec![table("amazon_sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("SELEC * FORM amazon_sales", vec!["amazon_sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(false));
    assert_eq!(patch.validation_status, Some(ValidationStatus::Invalid));
}

#[tokio::test]
async fn retry_budget_exhausted_short_circuits() {
    let registry = registry_with(vec![]);
    let validator = Validator::new(registry, 100, 1000);
    let mut state = state_with_sql("SELECT 1", vec![], 3);
    state.retry_count = 4;
    let patch = validator.validate(&state).await;
    assert_eq!(patch.validation_status, Some(ValidationStatus::Failed));
    assert_eq!(patch.sql_is_valid, Some(false));
}

#[tokio::test]
async fn empty_sql_is_invalid() {
    let registry = registry_with(vec![]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("", vec![], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.validation_status, Some(ValidationStatus::Invalid));
    assert_eq!(patch.validation_errors.unwrap(), vec!["no SQL generated".to_string()]);
}

#[tokio::test]
async fn limit_over_max_is_clamped_to_exactly_max() {
    let registry = registry_with(vec![table("sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("SELECT amount FROM sales LIMIT 10000", vec!["sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(true));
    assert_eq!(patch.validation_status, Some(ValidationStatus::Corrected));
    let sql = patch.generated_sql.unwrap().unwrap();
    assert!(sql.contains("LIMIT 1000"));
    assert!(!sql.contains("LIMIT 10000"));
}

#[tokio::test]
async fn limit_under_max_is_preserved_exactly() {
    let registry = registry_with(vec![table("sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("SELECT amount FROM sales LIMIT 50", vec!["sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(true));
    assert_eq!(patch.validation_status, Some(ValidationStatus::Valid));
    assert_eq!(patch.generated_sql, None);
}

#[tokio::test]
async fn missing_limit_gets_default_appended() {
    let registry = registry_with(vec![table("sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("SELECT amount FROM sales", vec!["sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.validation_status, Some(ValidationStatus::Corrected));
    assert!(patch.generated_sql.unwrap().unwrap().contains("LIMIT 100"));
}

#[tokio::test]
async fn case_insensitive_table_and_column_lookup() {
    let registry = registry_with(vec![table("amazon_sales", &["Amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql(
        "SELECT AMOUNT FROM AMAZON_SALES",
        vec!["amazon_sales".to_string()],
        3,
    );
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(true));
}

#[tokio::test]
async fn unknown_table_gets_suggestion() {
    let registry = registry_with(vec![table("amazon_sales", &["amount"])]);
    let validator = Validator::new(registry, 100, 1000);
    let state = state_with_sql("SELECT amount FROM amazonsales", vec!["amazon_sales".to_string()], 3);
    let patch = validator.validate(&state).await;
    assert_eq!(patch.sql_is_valid, Some(false));
    let errors = patch.validation_errors.unwrap();
    assert!(errors.iter().any(|e| e.contains("amazonsales")));
}
