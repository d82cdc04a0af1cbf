//! Runs validated SQL against the analytic engine with a timeout, a row cap,
//! and a bounded worker pool, then sanitizes results for transport (§4.4).
//!
//! Deliberately does **not** set `sql_is_valid = false` or push onto
//! `validation_errors` on failure — the graph only retries between the
//! validator and the generator; once a query reaches the executor, failures
//! are terminal for this run and flow straight to the summarizer. See the
//! open question recorded in `DESIGN.md`.

pub mod classify;
pub mod engine;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use self::classify::{classify_error, format_error_for_llm};
use self::engine::AnalyticEngine;
use crate::state::{StatePatch, ValidationStatus, WorkflowState};

pub struct Executor {
    engine: Arc<dyn AnalyticEngine>,
    pool: Arc<Semaphore>,
    timeout: Duration,
    max_rows: usize,
}

impl Executor {
    pub fn new(engine: Arc<dyn AnalyticEngine>, pool_size: usize, timeout_seconds: u64, max_rows: usize) -> Self {
        Self {
            engine,
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
            timeout: Duration::from_secs(timeout_seconds),
            max_rows,
        }
    }

    pub async fn execute(&self, state: &WorkflowState) -> StatePatch {
        let mut patch = StatePatch::new();

        let Some(sql) = state.generated_sql.clone().filter(|s| !s.trim().is_empty()) else {
            patch.execution_error = Some(Some("No SQL query to execute".to_string()));
            patch.row_count = Some(0);
            patch.query_results = Some(None);
            return patch;
        };

        if !state.sql_is_valid {
            let reason = if state.validation_errors.is_empty() {
                "SQL failed validation and cannot be executed".to_string()
            } else {
                state.validation_errors.join("; ")
            };
            patch.execution_error = Some(Some(reason));
            patch.row_count = Some(0);
            patch.query_results = Some(None);
            return patch;
        }

        let permit = match self.pool.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                patch.execution_error = Some(Some("executor pool closed".to_string()));
                return patch;
            }
        };

        let engine = self.engine.clone();
        let max_rows = self.max_rows;
        let started = Instant::now();
        let run = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.execute(&sql)
        });

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(Ok(mut result))) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                if result.rows.len() > max_rows {
                    result.rows.truncate(max_rows);
                    result.row_count = result.rows.len() as u64;
                }
                patch.query_results = Some(Some(result.rows));
                patch.row_count = Some(result.row_count);
                patch.execution_time_ms = Some(elapsed_ms);
                patch.execution_error = Some(None);
            }
            Ok(Ok(Err(err))) => {
                let kind = classify_error(&err.to_string());
                patch.execution_error = Some(Some(format_error_for_llm(kind)));
                patch.row_count = Some(0);
                patch.query_results = Some(None);
                patch.execution_time_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(Err(_join_err)) => {
                patch.execution_error = Some(Some(format_error_for_llm(classify::ErrorKind::Unknown)));
                patch.row_count = Some(0);
                patch.query_results = Some(None);
            }
            Err(_elapsed) => {
                patch.execution_error = Some(Some(format_error_for_llm(classify::ErrorKind::Timeout)));
                patch.row_count = Some(0);
                patch.query_results = Some(None);
            }
        }

        patch
    }
}

/// Deterministic test double: returns a fixed success or error without
/// touching a real engine. Mirrors the teacher's `create_mock_*` test-double
/// convention.
pub fn create_mock_executor(
    mock_rows: Option<Vec<crate::state::ResultRow>>,
    mock_error: Option<String>,
) -> impl Fn(&WorkflowState) -> StatePatch + Send + Sync + 'static {
    move |state: &WorkflowState| {
        let mut patch = StatePatch::new();
        if !state.sql_is_valid {
            patch.execution_error = Some(Some("SQL failed validation and cannot be executed".to_string()));
            patch.row_count = Some(0);
            patch.query_results = Some(None);
            return patch;
        }
        if let Some(err) = &mock_error {
            let kind = classify_error(err);
            patch.execution_error = Some(Some(format_error_for_llm(kind)));
            patch.row_count = Some(0);
            patch.query_results = Some(None);
        } else {
            let rows = mock_rows.clone().unwrap_or_default();
            patch.row_count = Some(rows.len() as u64);
            patch.query_results = Some(Some(rows));
            patch.execution_time_ms = Some(1.0);
            patch.execution_error = Some(None);
        }
        patch
    }
}

pub fn validation_status_allows_execution(status: ValidationStatus) -> bool {
    matches!(status, ValidationStatus::Valid | ValidationStatus::Corrected)
}
