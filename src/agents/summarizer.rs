//! Summarizer shim: the terminal node. Branches on what the rest of the run
//! produced — an execution error, an empty result set, populated rows, or a
//! plain chat turn — and narrates it for a non-technical reader. Never
//! surfaces raw SQL or raw engine error text to the user.

use serde::Deserialize;

use super::prompts::{summarizer_user_prompt, SUMMARIZER_SYSTEM};
use crate::llm::{invoke_structured, LlmProvider};
use crate::state::{Message, MessageRole, StatePatch, WorkflowState};

#[derive(Debug, Deserialize)]
struct SummarizerOutput {
    answer: String,
}

pub struct Summarizer;

impl Summarizer {
    /// Temperature ~0.3: some room for phrasing variety, but this is
    /// narration of already-computed facts, not open-ended generation.
    pub async fn summarize(&self, llm: &dyn LlmProvider, state: &WorkflowState) -> StatePatch {
        let mut patch = StatePatch::new();
        let user_prompt = summarizer_user_prompt(state);

        let answer = match invoke_structured::<SummarizerOutput>(llm, SUMMARIZER_SYSTEM, &user_prompt, 0.3).await {
            Ok(out) => out.answer,
            Err(_) => fallback_answer(state),
        };

        patch.messages = Some(vec![Message {
            role: MessageRole::Assistant,
            content: answer.clone(),
        }]);
        patch.final_answer = Some(Some(answer));
        patch
    }
}

/// A deterministic composer used when the LLM call itself fails, so a run
/// never terminates without some answer in `final_answer`. Never includes
/// `state.execution_error`'s text verbatim — that string passed through the
/// executor's classifier but may still echo engine internals, and this is
/// the one narration point the raw text must not get past.
fn fallback_answer(state: &WorkflowState) -> String {
    if state.execution_error.is_some() {
        return "Sorry, I couldn't run that query.".to_string();
    }
    match &state.query_results {
        Some(rows) if rows.is_empty() => "That query didn't return any rows.".to_string(),
        Some(rows) => format!("Found {} row(s).", rows.len()),
        None => "I'm not sure how to help with that.".to_string(),
    }
}

/// Deterministic test double.
pub fn create_mock_summarizer(answer: String) -> impl Fn(&WorkflowState) -> StatePatch + Send + Sync + 'static {
    move |_state: &WorkflowState| {
        let mut patch = StatePatch::new();
        patch.final_answer = Some(Some(answer.clone()));
        patch
    }
}
