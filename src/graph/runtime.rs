//! The graph runtime: a plain loop over the static node set, not recursion
//! (§ design notes — a cyclic graph with conditional edges over an explicit
//! state value, not call-stack recursion). One run per `thread_id` is
//! expected to be driven at a time by the caller; the runtime itself holds
//! no per-thread state beyond what it reads from the checkpointer.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use super::routing::{check_validation, route_by_intent, Node};
use crate::agents::{Router, SchemaDiscovery, SqlGenerator, Summarizer};
use crate::checkpoint::CheckpointStore;
use crate::error::{Result, WorkflowError};
use crate::executor::Executor;
use crate::llm::LlmProvider;
use crate::state::WorkflowState;
use crate::validator::Validator;

/// Safety margin beyond `max_retries` before the defense-in-depth recursion
/// guard fires. This is not the primary bound — `check_validation` already
/// stops the loop at `retry_count >= max_retries` — it only catches a
/// runtime bug that would otherwise spin forever.
const RECURSION_SAFETY_MARGIN: u32 = 2;

pub struct GraphRuntime {
    llm: Arc<dyn LlmProvider>,
    router: Router,
    schema_discovery: SchemaDiscovery,
    sql_generator: SqlGenerator,
    validator: Validator,
    executor: Executor,
    summarizer: Summarizer,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl GraphRuntime {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        router: Router,
        schema_discovery: SchemaDiscovery,
        sql_generator: SqlGenerator,
        validator: Validator,
        executor: Executor,
        summarizer: Summarizer,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            llm,
            router,
            schema_discovery,
            sql_generator,
            validator,
            executor,
            summarizer,
            checkpoints,
        }
    }

    /// Run one full turn starting from `state` (the caller is responsible
    /// for seeding `available_tables`/`schema_context` before the first
    /// call, typically from `SchemaRegistry::get_schema`). Returns the final
    /// state once `END` is reached.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut seq: u64 = 0;
        self.checkpoints.put(&state.thread_id, seq, &state).await?;

        let mut node = Node::Router;

        loop {
            // Defense-in-depth only: `check_validation` already stops the
            // retry loop at `retry_count >= max_retries`. This catches a
            // runtime bug that would otherwise keep looping the back-edge.
            if state.retry_count > state.max_retries + RECURSION_SAFETY_MARGIN {
                return Err(WorkflowError::Recursion(format!(
                    "retry_count {} exceeded max_retries ({}) + safety margin",
                    state.retry_count, state.max_retries
                )));
            }

            node = match node {
                Node::Router => {
                    let patch = self
                        .router
                        .route(self.llm.as_ref(), &state)
                        .instrument(info_span!("router", thread_id = %state.thread_id))
                        .await;
                    state = state.apply(patch);
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    route_by_intent(&state)
                }
                Node::SchemaDiscovery => {
                    let patch = self
                        .schema_discovery
                        .discover(self.llm.as_ref(), &state)
                        .instrument(info_span!("schema_discovery", thread_id = %state.thread_id))
                        .await;
                    state = state.apply(patch);
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    Node::SqlGenerator
                }
                Node::SqlGenerator => {
                    let patch = self
                        .sql_generator
                        .generate(self.llm.as_ref(), &state)
                        .instrument(info_span!("sql_generator", thread_id = %state.thread_id, retry_count = state.retry_count))
                        .await;
                    state = state.apply(patch);
                    state.retry_count += 1;
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    Node::Validator
                }
                Node::Validator => {
                    let patch = self
                        .validator
                        .validate(&state)
                        .instrument(info_span!("validator", thread_id = %state.thread_id, retry_count = state.retry_count))
                        .await;
                    state = state.apply(patch);
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    check_validation(&state)
                }
                Node::Executor => {
                    let patch = self
                        .executor
                        .execute(&state)
                        .instrument(info_span!("executor", thread_id = %state.thread_id))
                        .await;
                    state = state.apply(patch);
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    Node::Summarizer
                }
                Node::Summarizer => {
                    let patch = self
                        .summarizer
                        .summarize(self.llm.as_ref(), &state)
                        .instrument(info_span!("summarizer", thread_id = %state.thread_id))
                        .await;
                    state = state.apply(patch);
                    seq += 1;
                    self.checkpoints.put(&state.thread_id, seq, &state).await?;
                    Node::End
                }
                Node::End => {
                    info!(thread_id = %state.thread_id, retry_count = state.retry_count, "run complete");
                    return Ok(state);
                }
            };
        }
    }
}
