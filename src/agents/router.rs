//! Router shim: decides intent + confidence + optional clarification
//! question. Falls back to `query`/0.5 confidence on any LLM failure.

use serde::Deserialize;

use super::prompts::{router_user_prompt, ROUTER_SYSTEM};
use crate::llm::{invoke_structured, LlmProvider};
use crate::state::{Intent, Message, MessageRole, StatePatch, WorkflowState};

#[derive(Debug, Deserialize)]
struct RouterDecision {
    intent: String,
    confidence: f32,
    #[serde(default)]
    clarification_question: Option<String>,
}

pub struct Router;

impl Router {
    pub async fn route(&self, llm: &dyn LlmProvider, state: &WorkflowState) -> StatePatch {
        let mut patch = StatePatch::new();
        let user_prompt = router_user_prompt(state);

        let decision: RouterDecision = match invoke_structured(llm, ROUTER_SYSTEM, &user_prompt, 0.0).await {
            Ok(d) => d,
            Err(_) => RouterDecision {
                intent: "query".to_string(),
                confidence: 0.5,
                clarification_question: None,
            },
        };

        let intent = match decision.intent.as_str() {
            "query" => Intent::Query,
            "summarize" => Intent::Summarize,
            "chat" => Intent::Chat,
            "clarify" => Intent::Clarify,
            _ => Intent::Query,
        };

        patch.intent = Some(Some(intent));
        patch.intent_confidence = Some(Some(decision.confidence));
        patch.clarification_question = Some(decision.clarification_question.clone());
        patch.messages = Some(vec![Message {
            role: MessageRole::User,
            content: state.user_query.clone(),
        }]);
        if matches!(intent, Intent::Clarify) {
            // Clarify ends the run at the router itself (no summarizer
            // visited), so the clarification question doubles as the
            // final answer.
            patch.final_answer = Some(decision.clarification_question);
        }
        patch
    }
}

/// Deterministic test double.
pub fn create_mock_router(intent: Intent, confidence: f32) -> impl Fn(&WorkflowState) -> StatePatch + Send + Sync + 'static {
    move |_state: &WorkflowState| {
        let mut patch = StatePatch::new();
        patch.intent = Some(Some(intent));
        patch.intent_confidence = Some(Some(confidence));
        patch.clarification_question = Some(None);
        patch
    }
}
