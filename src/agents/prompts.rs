//! Prompt construction shared by the agent shims. Kept separate from the
//! shims themselves so the wording can be tuned without touching control
//! flow.

use crate::state::WorkflowState;

pub const ROUTER_SYSTEM: &str = "You classify a user's analytics question into one of four intents: \
query (they want data from a SELECT), summarize (they want a pre-built summary), \
chat (small talk, no data needed), or clarify (the question is too ambiguous to act on). \
Respond with JSON: {\"intent\": \"...\", \"confidence\": 0.0-1.0, \"clarification_question\": string or null}.";

pub fn router_user_prompt(state: &WorkflowState) -> String {
    format!("User question: {}", state.user_query)
}

pub const SCHEMA_DISCOVERY_SYSTEM: &str = "You are a schema analyst for an analytics warehouse. \
Discover which tables are relevant to the user's question by calling the available tools: \
start with list_tables, call get_table_schema with comma-separated table names for anything that \
looks relevant, and use search_columns when you need to find a column by keyword across tables. \
Once you have enough context, stop calling tools and reply with a short summary instead.";

pub fn schema_discovery_user_prompt(state: &WorkflowState) -> String {
    format!(
        "User question: {}\n\nDiscover which tables and columns are relevant to answer this question. \
         Start by listing available tables, then get schema details for the relevant ones.",
        state.user_query
    )
}

pub const SQL_GENERATOR_SYSTEM: &str = "You write a single read-only SQL SELECT statement that answers \
the user's question using only the tables and columns given. Respond with JSON: \
{\"sql_query\": \"...\", \"explanation\": \"...\", \"tables_used\": [\"...\"], \"columns_used\": [\"...\"], \"assumptions\": [\"...\"]}.";

pub fn sql_generator_user_prompt(state: &WorkflowState) -> String {
    let schema = state
        .refined_schema_context
        .clone()
        .unwrap_or_else(|| state.schema_context.clone());
    let mut prompt = format!("User question: {}\n\nSchema:\n{}", state.user_query, schema);

    if state.retry_count > 0 {
        prompt.push_str(&format!(
            "\n\nYour previous attempt was rejected.\nPrevious SQL:\n{}\n\nValidator diagnostics:\n{}\n\n\
             Repair the query to address every diagnostic above. Do not re-emit the same SQL.",
            state.generated_sql.clone().unwrap_or_default(),
            state.validation_errors.join("\n")
        ));
    }
    prompt
}

pub const SUMMARIZER_SYSTEM: &str = "You narrate the outcome of a data query for a non-technical reader. \
Never show raw SQL or raw engine error text. Respond with JSON: {\"answer\": \"...\"}.";

pub fn summarizer_user_prompt(state: &WorkflowState) -> String {
    if let Some(err) = &state.execution_error {
        return format!("The query failed. Error: {err}\nOriginal question: {}", state.user_query);
    }
    if let Some(rows) = &state.query_results {
        if rows.is_empty() {
            return format!("The query returned no rows.\nOriginal question: {}", state.user_query);
        }
        return format!(
            "Original question: {}\nRow count: {}\nSample rows (JSON): {}",
            state.user_query,
            state.row_count,
            serde_json::to_string(&rows.iter().take(5).collect::<Vec<_>>()).unwrap_or_default()
        );
    }
    format!("Casual conversation. User said: {}", state.user_query)
}
