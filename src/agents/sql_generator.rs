//! SQL generator shim: turns the (possibly refined) schema context and the
//! user's question into a single SQL statement. On retry, the prompt is
//! augmented with the previous attempt and the validator's diagnostics
//! (`sql_generator_user_prompt` already does this); this module only owns
//! the LLM call and the failure path.

use serde::Deserialize;

use super::prompts::{sql_generator_user_prompt, SQL_GENERATOR_SYSTEM};
use crate::llm::{invoke_structured, LlmProvider};
use crate::state::{StatePatch, WorkflowState};

#[derive(Debug, Deserialize)]
struct SqlGeneration {
    sql_query: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    tables_used: Vec<String>,
    #[serde(default)]
    columns_used: Vec<String>,
    #[serde(default)]
    assumptions: Vec<String>,
}

pub struct SqlGenerator;

impl SqlGenerator {
    /// Temperature 0: SQL generation should be reproducible given the same
    /// schema and question, especially across retries.
    pub async fn generate(&self, llm: &dyn LlmProvider, state: &WorkflowState) -> StatePatch {
        let mut patch = StatePatch::new();
        let user_prompt = sql_generator_user_prompt(state);

        match invoke_structured::<SqlGeneration>(llm, SQL_GENERATOR_SYSTEM, &user_prompt, 0.0).await {
            Ok(generation) => {
                patch.generated_sql = Some(Some(generation.sql_query));
                patch.sql_explanation = Some(Some(generation.explanation));
                patch.tables_used = Some(generation.tables_used);
                patch.columns_used = Some(generation.columns_used);
                patch.assumptions = Some(generation.assumptions);
            }
            Err(e) => {
                // No SQL to hand to the validator: mark invalid directly so
                // `check_validation` routes to the retry branch (or to the
                // terminal failure branch once `max_retries` is spent)
                // without ever running the validator on a missing query.
                patch.sql_is_valid = Some(false);
                patch.validation_errors = Some(vec![format!("SQL generation failed: {e}")]);
            }
        }
        patch
    }
}

/// Deterministic test double.
pub fn create_mock_sql_generator(sql: String) -> impl Fn(&WorkflowState) -> StatePatch + Send + Sync + 'static {
    move |_state: &WorkflowState| {
        let mut patch = StatePatch::new();
        patch.generated_sql = Some(Some(sql.clone()));
        patch.sql_explanation = Some(Some(String::new()));
        patch.tables_used = Some(Vec::new());
        patch.columns_used = Some(Vec::new());
        patch.assumptions = Some(Vec::new());
        patch
    }
}
