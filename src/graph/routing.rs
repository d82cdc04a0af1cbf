//! The two conditional-edge functions (§4.1). Pure functions of `WorkflowState`
//! so they're trivial to unit test without a runtime.

use crate::state::{Intent, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Router,
    SchemaDiscovery,
    SqlGenerator,
    Validator,
    Executor,
    Summarizer,
    End,
}

/// `state.intent` missing (router failed to classify) is treated as `query`.
pub fn route_by_intent(state: &WorkflowState) -> Node {
    match state.intent {
        Some(Intent::Query) | None => Node::SchemaDiscovery,
        Some(Intent::Summarize) => Node::Executor,
        Some(Intent::Chat) => Node::Summarizer,
        Some(Intent::Clarify) => Node::End,
    }
}

/// The only back-edge in the graph: validator -> sql_generator, bounded by
/// `max_retries`.
pub fn check_validation(state: &WorkflowState) -> Node {
    if state.sql_is_valid {
        return Node::Executor;
    }
    if state.retry_count >= state.max_retries {
        return Node::Summarizer;
    }
    Node::SqlGenerator
}
