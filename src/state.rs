//! The workflow's single carried record and the patch type nodes return.
//!
//! Every node receives an immutable `&WorkflowState` and returns a
//! `StatePatch` — an all-optional mirror of the state's fields. The runtime
//! merges the patch over the previous state with [`WorkflowState::apply`]
//! before writing a checkpoint. Nodes never mutate their input in place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Query,
    Summarize,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Query,
    Summarize,
    Chat,
    Clarify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Valid,
    Invalid,
    Corrected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// A single row of query results, as a JSON-safe map of column -> value.
pub type ResultRow = serde_json::Map<String, serde_json::Value>;

/// The record carried through every node invocation. Fields beyond the
/// input group are write-once per run except `retry_count`, which is the
/// only monotonic counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    // Input
    pub user_query: String,
    pub query_mode: QueryMode,
    pub thread_id: String,
    pub user_id: Option<String>,

    // Routing
    pub intent: Option<Intent>,
    pub intent_confidence: Option<f32>,
    pub clarification_question: Option<String>,

    // Schema
    pub available_tables: Vec<String>,
    pub schema_context: String,
    pub refined_schema_context: Option<String>,
    pub discovered_tables: Option<Vec<String>>,

    // Generation
    pub generated_sql: Option<String>,
    pub sql_explanation: Option<String>,
    pub tables_used: Vec<String>,
    pub columns_used: Vec<String>,
    pub assumptions: Vec<String>,
    pub retry_count: u32,
    pub max_retries: u32,

    // Validation
    pub sql_is_valid: bool,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,

    // Execution
    pub query_results: Option<Vec<ResultRow>>,
    pub row_count: u64,
    pub execution_time_ms: f64,
    pub execution_error: Option<String>,

    // Output
    pub final_answer: Option<String>,
    pub messages: Vec<Message>,
}

impl WorkflowState {
    pub fn new(thread_id: impl Into<String>, user_query: impl Into<String>, max_retries: u32) -> Self {
        Self {
            user_query: user_query.into(),
            query_mode: QueryMode::Query,
            thread_id: thread_id.into(),
            user_id: None,
            intent: None,
            intent_confidence: None,
            clarification_question: None,
            available_tables: Vec::new(),
            schema_context: String::new(),
            refined_schema_context: None,
            discovered_tables: None,
            generated_sql: None,
            sql_explanation: None,
            tables_used: Vec::new(),
            columns_used: Vec::new(),
            assumptions: Vec::new(),
            retry_count: 0,
            max_retries,
            sql_is_valid: false,
            validation_status: ValidationStatus::Pending,
            validation_errors: Vec::new(),
            query_results: None,
            row_count: 0,
            execution_time_ms: 0.0,
            execution_error: None,
            final_answer: None,
            messages: Vec::new(),
        }
    }

    /// Merge a patch over this state, producing the next state. Fields left
    /// `None` in the patch are unchanged; `messages` are appended rather than
    /// replaced, matching the append-only contract.
    pub fn apply(&self, patch: StatePatch) -> WorkflowState {
        let mut next = self.clone();
        macro_rules! take {
            ($field:ident) => {
                if let Some(v) = patch.$field {
                    next.$field = v;
                }
            };
        }
        take!(query_mode);
        take!(intent);
        take!(intent_confidence);
        take!(clarification_question);
        take!(available_tables);
        take!(schema_context);
        take!(refined_schema_context);
        take!(discovered_tables);
        take!(generated_sql);
        take!(sql_explanation);
        take!(tables_used);
        take!(columns_used);
        take!(assumptions);
        take!(retry_count);
        take!(sql_is_valid);
        take!(validation_status);
        take!(validation_errors);
        take!(query_results);
        take!(row_count);
        take!(execution_time_ms);
        take!(execution_error);
        take!(final_answer);
        if let Some(extra) = patch.messages {
            next.messages.extend(extra);
        }
        next
    }
}

/// The partial update a node returns. Every field is optional; `None` means
/// "leave unchanged". `messages`, when present, is appended rather than
/// replacing the prior history.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub query_mode: Option<QueryMode>,
    pub intent: Option<Option<Intent>>,
    pub intent_confidence: Option<Option<f32>>,
    pub clarification_question: Option<Option<String>>,
    pub available_tables: Option<Vec<String>>,
    pub schema_context: Option<String>,
    pub refined_schema_context: Option<Option<String>>,
    pub discovered_tables: Option<Option<Vec<String>>>,
    pub generated_sql: Option<Option<String>>,
    pub sql_explanation: Option<Option<String>>,
    pub tables_used: Option<Vec<String>>,
    pub columns_used: Option<Vec<String>>,
    pub assumptions: Option<Vec<String>>,
    pub retry_count: Option<u32>,
    pub sql_is_valid: Option<bool>,
    pub validation_status: Option<ValidationStatus>,
    pub validation_errors: Option<Vec<String>>,
    pub query_results: Option<Option<Vec<ResultRow>>>,
    pub row_count: Option<u64>,
    pub execution_time_ms: Option<f64>,
    pub execution_error: Option<Option<String>>,
    pub final_answer: Option<Option<String>>,
    pub messages: Option<Vec<Message>>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }
}
